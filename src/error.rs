use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Inference host is unreachable: {0}")]
    Connectivity(String),

    #[error("Model {model} returned HTTP {status}: {body}")]
    Inference {
        model: String,
        status: u16,
        body: String,
    },

    #[error("Text model generated too few prompts: requested {requested}, got {produced}")]
    InsufficientPrompts { requested: usize, produced: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GenError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, GenError::Connectivity(_))
    }
}

impl From<reqwest::Error> for GenError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            GenError::Connectivity(e.to_string())
        } else {
            GenError::Request(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, GenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GenError::InsufficientPrompts {
            requested: 3,
            produced: 2,
        };
        assert_eq!(
            err.to_string(),
            "Text model generated too few prompts: requested 3, got 2"
        );

        let err = GenError::Inference {
            model: "sdxl".into(),
            status: 503,
            body: "busy".into(),
        };
        assert_eq!(err.to_string(), "Model sdxl returned HTTP 503: busy");
    }

    #[test]
    fn test_is_connectivity() {
        assert!(GenError::Connectivity("refused".into()).is_connectivity());
        assert!(!GenError::Request("timeout".into()).is_connectivity());
    }
}
