//! Execution Modes and the Engine Dialect Seam
//!
//! This module defines the transactional batch executor and the trait seam
//! that keeps it engine-agnostic.
//!
//! # Engine Isolation
//! The executor knows nothing about any particular engine's error codes or
//! default statements. Everything engine-specific lives behind the
//! [`Dialect`] trait; only the MySQL implementation knows that server error
//! 1295 means "not supported in the prepared statement protocol".
//!
//! # Atomicity
//! `execute_batch` runs on a caller-owned transaction and stops at the first
//! failing statement. The caller commits on success and rolls back on any
//! error, so a batch either fully applies or leaves no trace.

use mysql_async::prelude::Queryable;
use mysql_async::Transaction;

use crate::error::{GrantorError, Result};

// MySQL/MariaDB dialect
pub mod mysql;

/// How statements in a batch are executed on the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Prepare each statement; fall back to direct execution when the
    /// engine reports the statement is unsupported in the prepared
    /// protocol. Used for account creation.
    PreparedWithFallback,

    /// Execute every statement directly without preparing. Used for
    /// revocation and rotation, whose statements commonly cannot be
    /// prepared.
    DirectOnly,
}

/// Engine-specific knowledge the executor and lifecycle operations need
pub trait Dialect: Send + Sync {
    /// Report whether a prepare failure means the engine does not support
    /// this statement in the prepared-statement protocol (as opposed to the
    /// statement being invalid)
    fn is_unsupported_prepared(&self, err: &mysql_async::Error) -> bool;

    /// Built-in revocation batch used when the caller supplies none
    fn default_revocation_statements(&self) -> &'static str;

    /// Built-in rotation batch used when the caller supplies none
    fn default_rotation_statements(&self) -> &'static str;
}

/// Execute a rendered statement batch on an open transaction
///
/// Statements run in order; the first error aborts the batch and is
/// returned to the caller, which must roll the transaction back. Nothing is
/// committed here.
pub async fn execute_batch(
    tx: &mut Transaction<'_>,
    statements: &[String],
    mode: ExecMode,
    dialect: &dyn Dialect,
) -> Result<()> {
    for statement in statements {
        match mode {
            ExecMode::DirectOnly => {
                tx.query_drop(statement.as_str())
                    .await
                    .map_err(|e| GrantorError::statement(e.to_string()))?;
            }
            ExecMode::PreparedWithFallback => match tx.prep(statement.as_str()).await {
                Ok(prepared) => {
                    tx.exec_drop(&prepared, ())
                        .await
                        .map_err(|e| GrantorError::statement(e.to_string()))?;
                }
                Err(err) if dialect.is_unsupported_prepared(&err) => {
                    // The engine cannot prepare this statement at all;
                    // run it over the text protocol instead.
                    tx.query_drop(statement.as_str())
                        .await
                        .map_err(|e| GrantorError::statement(e.to_string()))?;
                }
                Err(err) => return Err(GrantorError::statement(err.to_string())),
            },
        }
    }

    Ok(())
}
