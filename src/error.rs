// src/error.rs

//! Unified error handling for the harvester application.

use std::fmt;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// XML reading or writing failed
    #[error("XML error: {0}")]
    Xml(String),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The harvest type is not one the pipeline can drive
    #[error("harvest type \"{0}\" is not supported; use WAF, ERDDAP-WAF or CSW")]
    UnsupportedHarvestType(String),

    /// Bounding box repair failed on a structurally broken document
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// Store operation failed
    #[error("Store error: {0}")]
    Store(String),

    /// Harvesting error with source context
    #[error("Harvest error for {context}: {message}")]
    Harvest { context: String, message: String },

    /// Operator-initiated cancellation; never swallowed by the
    /// per-document or per-job error boundaries.
    #[error("harvest interrupted")]
    Interrupted,
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an XML error from any quick-xml failure.
    pub fn xml(message: impl fmt::Display) -> Self {
        Self::Xml(message.to_string())
    }

    /// Create a geometry error.
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry(message.into())
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create a harvest error with context.
    pub fn harvest(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Harvest {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// True for operator-initiated cancellation, which must propagate
    /// through every suppression layer.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_classification() {
        assert!(AppError::Interrupted.is_interrupt());
        assert!(!AppError::config("boom").is_interrupt());
        assert!(!AppError::harvest("waf", "timed out").is_interrupt());
    }

    #[test]
    fn test_unsupported_harvest_type_message() {
        let err = AppError::UnsupportedHarvestType("FTP".into());
        assert!(err.to_string().contains("FTP"));
        assert!(err.to_string().contains("not supported"));
    }
}
