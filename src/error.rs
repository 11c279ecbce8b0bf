//! Error handling for the data framework
//!
//! Most framework operations report rejection through `bool`/`Option`
//! returns; this type covers the fallible edges: configuration files,
//! query service endpoints, and back-end dispatch.

use thiserror::Error;

/// Main error type for framework operations
#[derive(Error, Debug)]
pub enum DataFrameworkError {
    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// A query service endpoint could not be parsed
    #[error("Invalid service URI '{uri}': {message}")]
    InvalidServiceUri { uri: String, message: String },

    /// No query back-end is registered for the endpoint's scheme
    #[error("No query service registered for scheme '{0}'")]
    UnknownService(String),

    /// A query back-end refused or failed to dispatch a request
    #[error("Query back-end error: {0}")]
    Backend(String),

    /// Errors related to logging setup
    #[error("Logging error: {0}")]
    Logging(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DataFrameworkError>,
    },
}

impl DataFrameworkError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DataFrameworkError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<toml::de::Error> for DataFrameworkError {
    fn from(err: toml::de::Error) -> Self {
        DataFrameworkError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for DataFrameworkError {
    fn from(err: toml::ser::Error) -> Self {
        DataFrameworkError::Serialization(err.to_string())
    }
}

/// Result type alias for framework operations
pub type Result<T> = std::result::Result<T, DataFrameworkError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DataFrameworkError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| DataFrameworkError::Io(e).with_context(f()))
    }
}
