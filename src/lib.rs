//! Grantor - Dynamic SQL Credential Lifecycle Manager
//!
//! Grantor creates short-lived MySQL/MariaDB accounts from
//! administrator-supplied statement templates, revokes them, and rotates the
//! privileged ("root") account's password. Every operation runs inside one
//! database transaction and all operations against one target are
//! serialized, so partial failures never leave an account half-created or a
//! rotated password unrecorded.
//!
//! # Core Principles
//! - All-or-nothing: a statement batch commits fully or not at all
//! - One operation at a time per target (concurrent DDL/DCL on a shared
//!   connection is unsafe on common engines)
//! - Templates are trusted administrator input (plain substitution, no
//!   SQL escaping)
//! - No internal retries (blindly re-running DDL/DCL has side effects;
//!   retry policy belongs to the calling orchestrator)
//!
//! # Architecture
//! This is a library boundary: the transport/RPC layer that exposes these
//! operations, connection TLS/pooling, and lease scheduling all live in the
//! calling orchestrator.
//!
//! # Module Organization
//! - [`error`] - Error types and stable error codes
//! - [`template`] - Statement splitting and placeholder substitution
//! - [`creds`] - Username/password/expiration generation
//! - [`config`] - Typed connection settings and settings-map decoding
//! - [`engine`] - Execution modes, dialect seam, transactional executor
//! - [`lifecycle`] - Create/revoke/rotate operations and the per-target
//!   exclusivity guard
//!
//! # Public API
//! - Operations: [`LifecycleManager`]
//! - Inputs: [`ConnectionSettings`], [`UsernamePolicy`], [`UsernameRequest`]
//! - Outputs: [`Credential`]
//! - Errors: [`GrantorError`]

pub mod error;     // Error handling infrastructure
pub mod template;  // Statement templating
pub mod creds;     // Credential generation
pub mod config;    // Connection settings
pub mod engine;    // Execution modes and the engine dialect seam
pub mod lifecycle; // Lifecycle operations and exclusivity guard

// Re-export commonly used types for convenience
pub use config::ConnectionSettings;
pub use creds::{Credential, CredentialProducer, UsernamePolicy, UsernameRequest};
pub use engine::mysql::MySqlDialect;
pub use engine::{Dialect, ExecMode};
pub use error::{GrantorError, Result};
pub use lifecycle::LifecycleManager;
