//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout Grantor.
//! All errors are structured and map to stable error codes so an
//! orchestrator can branch on them programmatically.
//!
//! # Error Categories
//! - `Config`: missing or invalid connection settings
//! - `EmptyCreationStatements`: a creation batch with zero usable statements
//! - `Generation`: credential generation constraints unsatisfiable
//! - `Statement`: prepare/execute failure inside a batch
//! - `Transaction`: begin/commit/rollback failure at the connection level
//! - `Connection`: failure to obtain or close the live database handle
//!
//! No variant is retried internally. Retrying DDL/DCL blindly can itself
//! fail or have unwanted side effects, so retries belong to the caller.

use thiserror::Error;

/// Main error type for Grantor operations
#[derive(Error, Debug)]
pub enum GrantorError {
    /// Missing or invalid connection settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Creation statement batch contains zero usable statements
    #[error("Empty creation statements")]
    EmptyCreationStatements,

    /// Credential generation constraints cannot be satisfied
    #[error("Credential generation failed: {0}")]
    Generation(String),

    /// A statement in a batch failed to prepare or execute
    #[error("Statement execution failed: {0}")]
    Statement(String),

    /// Transaction begin, commit, or rollback failed
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The live database handle could not be obtained or closed
    #[error("Connection error: {0}")]
    Connection(String),
}

impl GrantorError {
    /// Convert error to a stable error code string
    ///
    /// Error codes are stable and suitable for programmatic handling by the
    /// calling orchestrator.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::EmptyCreationStatements => "EMPTY_CREATION_STATEMENTS",
            Self::Generation(_) => "GENERATION_FAILED",
            Self::Statement(_) => "STATEMENT_FAILED",
            Self::Transaction(_) => "TRANSACTION_FAILED",
            Self::Connection(_) => "CONNECTION_FAILED",
        }
    }

    /// Get human-readable error message
    ///
    /// Safe to surface to the orchestrator: statement errors carry the
    /// engine's message but never a generated password.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a credential generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a statement execution error
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement(message.into())
    }

    /// Create a transaction error
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction(message.into())
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }
}

/// Result type alias for Grantor operations
pub type Result<T> = std::result::Result<T, GrantorError>;
