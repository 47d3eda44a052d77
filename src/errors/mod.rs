//! # Error Handling
//!
//! Error types for the gateway compiler. Every build step returns a
//! [`Result`]; a failed compilation never yields a partial listener or route
//! configuration.

/// Custom result type for gateway compilation
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the gateway compiler
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A listener was assembled without any filter chain
    #[error("must have more than 0 chains in listener \"{listener}\"")]
    EmptyListener { listener: String },

    /// Gateway, TLS or routing configuration that cannot be compiled as declared
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid compiler or observability settings
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Create the structural error raised for a listener without filter chains
    pub fn empty_listener<S: Into<String>>(listener: S) -> Self {
        Self::EmptyListener { listener: listener.into() }
    }

    /// Name of the listener this error is attached to, if any
    pub fn listener(&self) -> Option<&str> {
        match self {
            Error::EmptyListener { listener } => Some(listener),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect();
        fields.sort();

        Self::validation(format!("Validation failed: {}", fields.join("; ")))
    }
}
