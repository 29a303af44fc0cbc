pub mod image;
pub mod params;
pub mod prompt;
pub mod status;
pub mod text;

pub use self::image::*;
pub use params::*;
pub use prompt::*;
pub use status::*;
pub use text::*;
