//! Unified error handling for the CDR exporter
//!
//! Only two failures ever come out of a delivery: the datastore could not be
//! reached, or it refused the configured credentials. Insert failures are not
//! represented here; the insert step is fire-and-forget.

use thiserror::Error;

/// Main error type for the CDR exporter
#[derive(Error, Debug)]
pub enum CdrError {
    // ==================== Delivery Errors ====================
    #[error("MongoDB failed to connect to {host}:{port}: {message}")]
    Connection {
        host: String,
        port: u16,
        message: String,
    },

    #[error("MongoDB failed to authenticate to {dbname} with username {username}: {message}")]
    Authentication {
        dbname: String,
        username: String,
        message: String,
    },

    // ==================== Host Errors ====================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("MongoDB CDR backend is not registered")]
    NotRegistered,
}

impl CdrError {
    /// Returns a stable identifier for logs and operator output
    pub fn error_code(&self) -> &'static str {
        match self {
            CdrError::Connection { .. } => "connection_error",
            CdrError::Authentication { .. } => "auth_error",
            CdrError::Config(_) => "config_error",
            CdrError::Serialization(_) => "serialization_error",
            CdrError::NotRegistered => "not_registered",
        }
    }

    /// True for the failures that reset the connection counters
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            CdrError::Connection { .. } | CdrError::Authentication { .. }
        )
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for CdrError {
    fn from(err: serde_json::Error) -> Self {
        CdrError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for CdrError {
    fn from(err: config::ConfigError) -> Self {
        CdrError::Config(err.to_string())
    }
}
