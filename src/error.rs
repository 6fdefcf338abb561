use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("{0}")]
    Model(String),

    #[error("Model call timed out after {limit:?}")]
    ModelTimeout { limit: Duration },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("OpenAI error: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),

    #[error("Invalid state transition: {current} -> {requested}")]
    InvalidTransition { current: String, requested: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Clone for Error {
    fn clone(&self) -> Self {
        match self {
            Self::Config(s) => Self::Config(s.clone()),
            Self::InvalidImage(s) => Self::InvalidImage(s.clone()),
            Self::Model(s) => Self::Model(s.clone()),
            Self::ModelTimeout { limit } => Self::ModelTimeout { limit: *limit },
            Self::InvalidTransition { current, requested } => Self::InvalidTransition {
                current: current.clone(),
                requested: requested.clone(),
            },
            Self::Internal(s) => Self::Internal(s.clone()),
            // For errors that can't be cloned, convert to string representation
            Self::Serialization(e) => Self::Internal(format!("Serialization error: {}", e)),
            Self::Yaml(e) => Self::Internal(format!("YAML error: {}", e)),
            Self::Io(e) => Self::Internal(format!("IO error: {}", e)),
            Self::Network(e) => Self::Model(format!("Network error: {}", e)),
            Self::AddrParse(e) => Self::Internal(format!("Address parse error: {}", e)),
            Self::OpenAi(e) => Self::Model(format!("OpenAI error: {}", e)),
        }
    }
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for failures of the model call itself (provider, transport or timeout).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Model(_) | Self::ModelTimeout { .. } | Self::Network(_) | Self::OpenAi(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_displays_upstream_text_verbatim() {
        let err = Error::model("quota exceeded for model");
        assert_eq!(err.to_string(), "quota exceeded for model");
        assert!(err.is_upstream());
    }

    #[test]
    fn test_invalid_image_is_not_upstream() {
        let err = Error::invalid_image("bad base64");
        assert!(!err.is_upstream());
        assert_eq!(err.to_string(), "Invalid image: bad base64");
    }

    #[test]
    fn test_clone_keeps_variant_where_possible() {
        let err = Error::ModelTimeout {
            limit: Duration::from_secs(30),
        };
        assert!(matches!(err.clone(), Error::ModelTimeout { limit } if limit.as_secs() == 30));
        assert_eq!(
            Error::ModelTimeout {
                limit: Duration::from_millis(250)
            }
            .to_string(),
            "Model call timed out after 250ms"
        );

        let io = Error::Io(std::io::Error::other("disk"));
        assert!(matches!(io.clone(), Error::Internal(msg) if msg.contains("disk")));
    }
}
