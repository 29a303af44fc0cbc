//! Prompt-to-image studio backed by a TorchServe host.
//!
//! A seed prompt is expanded into related prompts by a text model, every prompt is
//! sent to an image model concurrently, and the decoded images are kept per browser
//! session and shown in a two-column grid.

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod session;
pub mod torchserve;
#[cfg(feature = "server")]
pub mod ui;

pub use config::Config;
pub use error::{GenError, Result};
pub use models::{
    Banner, BannerKind, GeneratedImage, GenerationParameters, HealthReport,
    ImageGenerationRequest, ModelStatus, PromptBatch, TextGenerationRequest,
};
pub use pipeline::Pipeline;
pub use session::{SessionHandle, SessionState, SessionStore, SESSION_IDLE_TIMEOUT};
pub use torchserve::{
    HealthCheck, HealthProber, ImageBackend, ImageClient, InferenceClient, TextBackend,
    TextClient,
};
