use crate::error::{GenError, Result};
use crate::logger::{LogLevel, LoggerConfig};
use std::env;

pub const DEFAULT_INFERENCE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_MANAGEMENT_URL: &str = "http://localhost:8081";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8501;

/// TorchServe cannot route model names containing `/`, so they are registered with
/// this separator instead.
pub const MODEL_NAME_SEPARATOR: &str = "---";

pub fn sanitize_model_name(name: &str) -> String {
    name.trim().replace('/', MODEL_NAME_SEPARATOR)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub llm_model: String,
    pub sd_model: String,
    pub inference_url: String,
    pub management_url: String,
    pub host: String,
    pub port: u16,
    pub logger: LoggerConfig,
}

impl Config {
    pub fn new(llm_model: impl AsRef<str>, sd_model: impl AsRef<str>) -> Self {
        Config {
            llm_model: sanitize_model_name(llm_model.as_ref()),
            sd_model: sanitize_model_name(sd_model.as_ref()),
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            management_url: DEFAULT_MANAGEMENT_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            logger: LoggerConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let llm_model = required_var("MODEL_NAME_LLM")?;
        let sd_model = required_var("MODEL_NAME_SD")?;

        let mut config = Config::new(llm_model, sd_model);

        if let Ok(url) = env::var("INFERENCE_URL") {
            config = config.with_inference_url(url);
        }
        if let Ok(url) = env::var("MANAGEMENT_URL") {
            config = config.with_management_url(url);
        }
        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            let port = port
                .parse()
                .map_err(|_| GenError::Config(format!("PORT is not a valid port: {}", port)))?;
            config.port = port;
        }

        config.logger = logger_from_env()?;
        Ok(config)
    }

    pub fn with_inference_url(mut self, url: impl Into<String>) -> Self {
        self.inference_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_management_url(mut self, url: impl Into<String>) -> Self {
        self.management_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_logger(mut self, logger: LoggerConfig) -> Self {
        self.logger = logger;
        self
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn required_var(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(GenError::Config(format!(
            "environment variable {} is required",
            name
        ))),
    }
}

fn logger_from_env() -> Result<LoggerConfig> {
    let mut logger = match env::var("LOG_FORMAT").ok().as_deref() {
        Some("json") => LoggerConfig::production(),
        _ => LoggerConfig::development().with_level(LogLevel::Info),
    };

    if let Ok(level) = env::var("LOG_LEVEL") {
        let level = level.parse::<LogLevel>().map_err(GenError::Config)?;
        logger = logger.with_level(level);
    }
    if let Ok(path) = env::var("LOG_FILE") {
        logger = logger.with_file_output(&path);
    }

    Ok(logger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_model_name() {
        assert_eq!(
            sanitize_model_name("meta-llama/Llama-2-7b-chat-hf"),
            "meta-llama---Llama-2-7b-chat-hf"
        );
        assert_eq!(sanitize_model_name("sdxl"), "sdxl");
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new("a/b", "stabilityai/sdxl")
            .with_inference_url("http://10.0.0.2:8080/")
            .with_management_url("http://10.0.0.2:8081")
            .with_port(9000);

        assert_eq!(config.llm_model, "a---b");
        assert_eq!(config.sd_model, "stabilityai---sdxl");
        assert_eq!(config.inference_url, "http://10.0.0.2:8080");
        assert_eq!(config.management_url, "http://10.0.0.2:8081");
        assert_eq!(config.bind_address(), ("127.0.0.1".to_string(), 9000));
    }

    #[test]
    fn test_defaults() {
        let config = Config::new("llm", "sd");
        assert_eq!(config.inference_url, DEFAULT_INFERENCE_URL);
        assert_eq!(config.management_url, DEFAULT_MANAGEMENT_URL);
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
