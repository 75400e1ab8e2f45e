//! Error types for the archmetrics library.
//!
//! Configuration problems are fatal and surface to the caller of the run.
//! Cache problems never leave the cache layer: they are logged and treated
//! as a miss. Malformed graph edges are skipped by the analyzers that meet them.

use std::io;

use thiserror::Error;

/// Main result type for archmetrics operations.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Error type for all archmetrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// I/O related errors (cache files, configuration files)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// An aggregate analyzer requires an analyzer nobody registered
    #[error("Analyzer '{required_by}' requires '{analyzer}', which is not registered")]
    MissingAnalyzer {
        /// Identifier of the missing analyzer
        analyzer: String,
        /// Identifier of the analyzer declaring the requirement
        required_by: String,
    },

    /// Cache and storage errors
    #[error("Cache error: {message}")]
    Cache {
        /// Error description
        message: String,
        /// Cache key that caused the issue
        key: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Artifact graph errors
    #[error("Graph error: {message}")]
    Graph {
        /// Error description
        message: String,
        /// Artifact that caused the error
        element: Option<String>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },
}

impl MetricsError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an error for an aggregate analyzer whose requirement is unregistered
    pub fn missing_analyzer(analyzer: impl Into<String>, required_by: impl Into<String>) -> Self {
        Self::MissingAnalyzer {
            analyzer: analyzer.into(),
            required_by: required_by.into(),
        }
    }

    /// Create a new cache error
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
            key: None,
        }
    }

    /// Create a new cache error for a specific key
    pub fn cache_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new validation error with field context
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new graph error
    pub fn graph(message: impl Into<String>) -> Self {
        Self::Graph {
            message: message.into(),
            element: None,
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Whether this error belongs to the fatal configuration class
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::MissingAnalyzer { .. })
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Internal { context: ctx, .. } => {
                *ctx = Some(context.into());
            }
            Self::Graph { element, .. } => {
                *element = Some(context.into());
            }
            _ => {}
        }
        self
    }
}

impl From<io::Error> for MetricsError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for MetricsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for MetricsError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<MetricsError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}
