//! MySQL Dialect
//!
//! Engine-specific pieces for MySQL/MariaDB targets:
//! - Connection options built from [`ConnectionSettings`]
//! - The unsupported-prepared-statement predicate (server error 1295)
//! - Built-in default revocation and rotation statement batches
//!
//! # Implementation Notes
//! - Uses `mysql_async` (async driver, requires tokio runtime)
//! - Error 1295 ("This command is not supported in the prepared statement
//!   protocol yet") is the engine's signal to fall back to text-protocol
//!   execution; any other prepare failure is a real statement error
//! - Default statements address accounts at the `'%'` wildcard host;
//!   deployments with host-scoped accounts must supply their own batches

use mysql_async::{Conn, OptsBuilder};

use crate::config::ConnectionSettings;
use crate::engine::Dialect;
use crate::error::{GrantorError, Result};

/// Server error code for statements the prepared protocol cannot handle
///
/// Reference: <https://mariadb.com/kb/en/prepare-statement/>
pub const ER_UNSUPPORTED_PS: u16 = 1295;

/// Default revocation batch: strip privileges and grant option, then drop
pub const DEFAULT_REVOCATION_SQL: &str =
    "REVOKE ALL PRIVILEGES, GRANT OPTION FROM '{{name}}'@'%'; DROP USER '{{name}}'@'%'";

/// Default rotation batch: set the account's password in place
pub const DEFAULT_ROTATION_SQL: &str =
    "ALTER USER '{{username}}'@'%' IDENTIFIED BY '{{password}}';";

/// Engine name reported to the orchestrator
pub const ENGINE_TYPE: &str = "mysql";

/// MySQL/MariaDB dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn is_unsupported_prepared(&self, err: &mysql_async::Error) -> bool {
        matches!(err, mysql_async::Error::Server(server) if server.code == ER_UNSUPPORTED_PS)
    }

    fn default_revocation_statements(&self) -> &'static str {
        DEFAULT_REVOCATION_SQL
    }

    fn default_rotation_statements(&self) -> &'static str {
        DEFAULT_ROTATION_SQL
    }
}

/// Build MySQL connection options from connection settings
#[must_use]
pub fn build_opts(settings: &ConnectionSettings) -> OptsBuilder {
    OptsBuilder::default()
        .ip_or_hostname(settings.host.as_str())
        .tcp_port(settings.port)
        .user(Some(settings.username.as_str()))
        .pass(Some(settings.password.as_str()))
        .db_name(settings.database.as_deref())
}

/// Open a live connection to the configured target
pub async fn connect(settings: &ConnectionSettings) -> Result<Conn> {
    Conn::new(build_opts(settings)).await.map_err(|e| {
        GrantorError::connection(format!("failed to connect to MySQL: {e}"))
    })
}
