//! Credential Lifecycle Operations
//!
//! This module composes the template engine, credential generator, and
//! transactional executor into the three state-changing operations:
//! create user, revoke user, and rotate root credentials.
//!
//! # Exclusivity
//! One [`LifecycleManager`] represents one logical database target. A
//! single `tokio::sync::Mutex` owns both the connection settings and the
//! cached live connection, and every lifecycle operation holds it from
//! connection acquisition through commit/rollback. Concurrent
//! account-management DDL/DCL on one connection can interleave unsafely on
//! common engines, so operations queue and run strictly one at a time.
//! Renewal is exempt: it performs no I/O.
//!
//! # Atomicity
//! Each operation runs its whole statement batch inside one transaction.
//! Any statement failure rolls the transaction back; an operation either
//! fully succeeds or leaves the database untouched.
//!
//! # Cancellation
//! Operations are plain futures: dropping one aborts the in-flight
//! statement. An optional per-operation deadline (`operation_timeout_ms` in
//! the settings) additionally bounds the database section; on expiry the
//! cached connection is discarded so the server rolls the open transaction
//! back on disconnect.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mysql_async::{Conn, TxOpts};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ConnectionSettings;
use crate::creds::{Credential, CredentialProducer, UsernamePolicy, UsernameRequest};
use crate::engine::mysql::{self, MySqlDialect, ENGINE_TYPE};
use crate::engine::{execute_batch, Dialect, ExecMode};
use crate::error::{GrantorError, Result};
use crate::template;

/// Guarded per-target state: the settings and the cached live connection
struct TargetState {
    settings: ConnectionSettings,
    conn: Option<Conn>,
}

impl TargetState {
    /// Get the live connection, opening one from the current settings if
    /// none is cached
    async fn connection(&mut self) -> Result<&mut Conn> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => mysql::connect(&self.settings).await?,
        };
        Ok(self.conn.insert(conn))
    }

    /// Close and drop the cached connection, if any
    async fn disconnect(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => conn.disconnect().await.map_err(|e| {
                GrantorError::connection(format!("failed to close connection: {e}"))
            }),
            None => Ok(()),
        }
    }
}

/// Manages short-lived database accounts for one logical database target
///
/// Construct one manager per target and share it; the internal guard
/// serializes all lifecycle operations against that target.
pub struct LifecycleManager {
    state: Mutex<TargetState>,
    producer: CredentialProducer,
    dialect: MySqlDialect,
}

impl LifecycleManager {
    /// Create a manager from typed settings and a username policy
    #[must_use]
    pub fn new(settings: ConnectionSettings, policy: UsernamePolicy) -> Self {
        Self {
            state: Mutex::new(TargetState { settings, conn: None }),
            producer: CredentialProducer::new(policy),
            dialect: MySqlDialect,
        }
    }

    /// Create a manager from a generic settings map and a username policy
    pub fn from_settings(settings: &Map<String, Value>, policy: UsernamePolicy) -> Result<Self> {
        Ok(Self::new(ConnectionSettings::from_settings(settings)?, policy))
    }

    /// Engine name for the orchestrator's bookkeeping
    #[must_use]
    pub const fn engine_type(&self) -> &'static str {
        ENGINE_TYPE
    }

    /// Snapshot of the current connection settings
    pub async fn settings(&self) -> ConnectionSettings {
        self.state.lock().await.settings.clone()
    }

    /// Create a new account from the caller's creation statements
    ///
    /// Generates a username, password, and expiration string, renders each
    /// raw statement with the `{{name}}`/`{{password}}`/`{{expiration}}`
    /// context, and executes the whole batch in one transaction in
    /// [`ExecMode::PreparedWithFallback`]. A batch with zero usable
    /// statements fails with `EmptyCreationStatements` before any I/O.
    pub async fn create_user(
        &self,
        creation_statements: &[String],
        request: &UsernameRequest,
        expiration: DateTime<Utc>,
    ) -> Result<Credential> {
        let usable = creation_statements
            .iter()
            .any(|raw| !template::split_statements(raw).is_empty());
        if !usable {
            return Err(GrantorError::EmptyCreationStatements);
        }

        let mut state = self.state.lock().await;
        let timeout = state.settings.operation_timeout();

        let username = self.producer.generate_username(request)?;
        let password = self.producer.generate_password();
        let expiration_str = self.producer.generate_expiration(expiration);

        debug!(username = %username, expiration = %expiration_str, "creating database user");

        let context: HashMap<&str, &str> = HashMap::from([
            ("name", username.as_str()),
            ("password", password.as_str()),
            ("expiration", expiration_str.as_str()),
        ]);

        run_transaction(
            &mut state,
            timeout,
            creation_statements,
            &context,
            ExecMode::PreparedWithFallback,
            &self.dialect,
        )
        .await?;

        info!(username = %username, "database user created");
        Ok(Credential { username, password })
    }

    /// Remove an account using the caller's revocation statements
    ///
    /// An empty batch substitutes the dialect's built-in revoke+drop pair.
    /// Statements render with the `{{name}}` context and execute in one
    /// transaction in [`ExecMode::DirectOnly`].
    pub async fn revoke_user(
        &self,
        revocation_statements: &[String],
        username: &str,
    ) -> Result<()> {
        let default_batch;
        let batch = if revocation_statements.is_empty() {
            default_batch = [self.dialect.default_revocation_statements().to_string()];
            &default_batch[..]
        } else {
            revocation_statements
        };

        let mut state = self.state.lock().await;
        let timeout = state.settings.operation_timeout();

        debug!(username = %username, "revoking database user");

        let context: HashMap<&str, &str> = HashMap::from([("name", username)]);
        run_transaction(&mut state, timeout, batch, &context, ExecMode::DirectOnly, &self.dialect)
            .await?;

        info!(username = %username, "database user revoked");
        Ok(())
    }

    /// Rotate the privileged account's password
    ///
    /// Requires the current settings to carry a non-empty username and
    /// password. An empty batch substitutes the dialect's built-in `ALTER
    /// USER` statement. Statements render with the
    /// `{{username}}`/`{{password}}` context and execute in one transaction
    /// in [`ExecMode::DirectOnly`]. After commit the live connection is
    /// closed so the next operation reconnects with the new password,
    /// proving it took effect. Once the transaction commits, the new
    /// password is authoritative even if the close fails.
    pub async fn rotate_root_credentials(
        &self,
        rotation_statements: &[String],
    ) -> Result<ConnectionSettings> {
        let mut state = self.state.lock().await;

        if state.settings.username.is_empty() || state.settings.password.is_empty() {
            return Err(GrantorError::config(
                "username and password are required to rotate",
            ));
        }

        let default_batch;
        let batch = if rotation_statements.is_empty() {
            default_batch = [self.dialect.default_rotation_statements().to_string()];
            &default_batch[..]
        } else {
            rotation_statements
        };

        let timeout = state.settings.operation_timeout();
        let username = state.settings.username.clone();
        let new_password = self.producer.generate_password();

        debug!(username = %username, "rotating root credentials");

        let context: HashMap<&str, &str> = HashMap::from([
            ("username", username.as_str()),
            ("password", new_password.as_str()),
        ]);

        run_transaction(&mut state, timeout, batch, &context, ExecMode::DirectOnly, &self.dialect)
            .await?;

        // Committed: record the new password before attempting the close so
        // a close failure cannot lose it.
        state.settings.password = new_password;
        state.disconnect().await?;

        info!(username = %username, "root credentials rotated");
        Ok(state.settings.clone())
    }

    /// Renew an account's lease
    ///
    /// A no-op: expiration is owned by the calling orchestrator, so there
    /// is no server-side renewal behavior. Takes no lock and performs no
    /// I/O.
    pub fn renew_user(
        &self,
        _renewal_statements: &[String],
        _username: &str,
        _expiration: DateTime<Utc>,
    ) -> Result<()> {
        Ok(())
    }
}

/// Render and execute a statement batch inside one transaction
///
/// Honors the optional per-operation deadline; on expiry the cached
/// connection is discarded so the server rolls the open transaction back.
async fn run_transaction(
    state: &mut TargetState,
    timeout: Option<Duration>,
    batch: &[String],
    context: &HashMap<&str, &str>,
    mode: ExecMode,
    dialect: &dyn Dialect,
) -> Result<()> {
    let fut = run_transaction_inner(&mut *state, batch, context, mode, dialect);
    match timeout {
        Some(limit) => {
            let result = tokio::time::timeout(limit, fut).await;
            match result {
                Ok(inner) => inner,
                Err(_) => {
                    state.conn = None;
                    Err(GrantorError::transaction(format!(
                        "operation exceeded timeout of {}ms",
                        limit.as_millis()
                    )))
                }
            }
        }
        None => fut.await,
    }
}

async fn run_transaction_inner(
    state: &mut TargetState,
    batch: &[String],
    context: &HashMap<&str, &str>,
    mode: ExecMode,
    dialect: &dyn Dialect,
) -> Result<()> {
    let conn = state.connection().await?;
    let mut tx = conn.start_transaction(TxOpts::default()).await.map_err(|e| {
        GrantorError::transaction(format!("failed to begin transaction: {e}"))
    })?;

    let mut batch_result = Ok(());
    for raw in batch {
        let statements = template::render(raw, context);
        if let Err(err) = execute_batch(&mut tx, &statements, mode, dialect).await {
            batch_result = Err(err);
            break;
        }
    }

    match batch_result {
        Ok(()) => tx.commit().await.map_err(|e| {
            GrantorError::transaction(format!("failed to commit transaction: {e}"))
        }),
        Err(err) => {
            // Best-effort: nothing was committed either way.
            let _ = tx.rollback().await;
            Err(err)
        }
    }
}
