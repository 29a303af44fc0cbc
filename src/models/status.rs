use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelStatus {
    Ready,
    NotReady,
    Unreachable,
}

impl ModelStatus {
    pub fn is_ready(&self) -> bool {
        *self == ModelStatus::Ready
    }
}

impl std::fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelStatus::Ready => write!(f, "READY"),
            ModelStatus::NotReady => write!(f, "NOT READY"),
            ModelStatus::Unreachable => write!(f, "UNREACHABLE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerKind {
    Success,
    Warning,
    Error,
}

/// A status message shown above the controls or the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
        }
    }
}

/// Result of one probe of the inference host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub text_model: String,
    pub text_status: ModelStatus,
    pub image_model: String,
    pub image_status: ModelStatus,
}

impl HealthReport {
    pub fn unreachable(text_model: &str, image_model: &str) -> Self {
        Self {
            text_model: text_model.to_string(),
            text_status: ModelStatus::Unreachable,
            image_model: image_model.to_string(),
            image_status: ModelStatus::Unreachable,
        }
    }

    pub fn host_reachable(&self) -> bool {
        self.text_status != ModelStatus::Unreachable
            && self.image_status != ModelStatus::Unreachable
    }

    pub fn all_ready(&self) -> bool {
        self.text_status.is_ready() && self.image_status.is_ready()
    }

    /// One banner per model, plus a go-ahead banner when both are ready.
    /// An unreachable host collapses into a single warning.
    pub fn banners(&self) -> Vec<Banner> {
        if !self.host_reachable() {
            return vec![Banner::warning("TorchServe is not up. Try again")];
        }

        let mut banners = Vec::with_capacity(3);
        for (model, status) in [
            (&self.image_model, self.image_status),
            (&self.text_model, self.text_status),
        ] {
            if status.is_ready() {
                banners.push(Banner::success(format!("Model loaded: {}", model)));
            } else {
                banners.push(Banner::warning(format!(
                    "Model {} not loaded in TorchServe",
                    model
                )));
            }
        }

        if self.all_ready() {
            banners.push(Banner::success("Proceed to entering your prompt input!"));
        }

        banners
    }
}
