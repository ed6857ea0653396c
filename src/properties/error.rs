use thiserror::Error;

/// Errors raised while loading sources or resolving property values.
#[derive(Error, Debug)]
pub enum PropertyError {
    #[error("Required property '{key}' not found")]
    Missing { key: String },

    #[error("Cannot convert '{value}' to {target}: {reason}")]
    Convert {
        value: String,
        target: String,
        reason: String,
    },

    #[error("No converter registered for target type {target}")]
    UnsupportedType { target: String },

    #[error("Malformed property line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unrecognized property file format: {path}")]
    UnknownFormat { path: String },

    #[error("Property source IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Property source JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Property source YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PropertyError {
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing { key: key.into() }
    }

    pub fn convert(
        value: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Convert {
            value: value.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(target: impl Into<String>) -> Self {
        Self::UnsupportedType {
            target: target.into(),
        }
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }

    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Convert { .. } | Self::UnsupportedType { .. })
    }
}
