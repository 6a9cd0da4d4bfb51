//! Common error types for podlet.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`PodletError`].
pub type PodletResult<T> = Result<T, PodletError>;

/// Common errors across podlet.
#[derive(Error, Diagnostic, Debug)]
pub enum PodletError {
    /// A call into the container runtime service failed.
    #[error("Runtime {operation} failed: {message}")]
    #[diagnostic(code(podlet::runtime))]
    Runtime {
        /// The runtime operation (create, start, stop, ...).
        operation: String,
        /// The error reported by the runtime.
        message: String,
    },

    /// The image could not be made available.
    #[error("Image {image} unavailable: {message}")]
    #[diagnostic(code(podlet::image))]
    ImagePull {
        /// The image reference.
        image: String,
        /// The failure reported by the puller.
        message: String,
    },

    /// A lifecycle hook failed.
    #[error("{message}")]
    #[diagnostic(code(podlet::hook))]
    Hook {
        /// The hook failure description.
        message: String,
    },

    /// Container not found.
    #[error("Container not found: {name}")]
    #[diagnostic(code(podlet::container::not_found))]
    ContainerNotFound {
        /// The container name that was not found.
        name: String,
    },

    /// Invalid composite container ID.
    #[error("Invalid container ID: {id}")]
    #[diagnostic(
        code(podlet::container::invalid_id),
        help("Container IDs have the form <runtime-type>://<id>")
    )]
    InvalidContainerId {
        /// The invalid container ID.
        id: String,
    },

    /// Invalid resource quantity format.
    #[error("Invalid resource quantity: {value}")]
    #[diagnostic(
        code(podlet::resource::invalid_quantity),
        help("Use formats like '500m', '2', '0.5' for CPU or '128Mi', '1Gi', '512M' for memory")
    )]
    InvalidResourceQuantity {
        /// The invalid value.
        value: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(podlet::io))]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(podlet::serialization))]
    Serialization(String),

    /// Operation not supported by the configured runtime.
    #[error("Not supported: {feature}")]
    #[diagnostic(
        code(podlet::unsupported),
        help("The configured runtime backend does not provide this capability")
    )]
    Unsupported {
        /// The unsupported feature.
        feature: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(podlet::config))]
    Config {
        /// The error message.
        message: String,
    },
}

impl PodletError {
    /// Build a [`PodletError::Runtime`] from an operation name and any displayable cause.
    pub fn runtime(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Runtime {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for PodletError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for PodletError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_display() {
        let err = PodletError::runtime("stop", "deadline exceeded");
        assert_eq!(err.to_string(), "Runtime stop failed: deadline exceeded");
    }

    #[test]
    fn hook_error_displays_message_only() {
        let err = PodletError::Hook {
            message: "PostStart handler: exit status 1".to_string(),
        };
        assert_eq!(err.to_string(), "PostStart handler: exit status 1");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PodletError = io_err.into();
        assert!(matches!(err, PodletError::Io(_)));
    }

    #[test]
    fn error_from_toml() {
        let err: PodletError = toml::from_str::<toml::Table>("= broken")
            .unwrap_err()
            .into();
        assert!(matches!(err, PodletError::Config { .. }));
    }
}
