//! Lifecycle Integration Tests
//!
//! This module tests the externally visible behavior of the lifecycle
//! operations. It validates:
//! - Fail-fast paths that must reject work before any database I/O
//! - Built-in default statement substitution
//! - End-to-end create/revoke/rotate against a live server
//! - Serialization of concurrent operations on one target
//!
//! Live-database tests are marked `#[ignore]` and expect a MySQL instance
//! at localhost:3306 with root/password credentials:
//! cargo test -- --ignored

use std::collections::HashMap;

use chrono::{Duration, Utc};
use grantor::engine::mysql::{DEFAULT_REVOCATION_SQL, DEFAULT_ROTATION_SQL};
use grantor::{
    template, ConnectionSettings, GrantorError, LifecycleManager, UsernamePolicy, UsernameRequest,
};
use pretty_assertions::assert_eq;

// ============================================================================
// Test Helpers
// ============================================================================

/// Settings for the live test instance
fn live_settings() -> ConnectionSettings {
    ConnectionSettings::new("localhost", 3306, "root", "password")
}

/// Route crate tracing to the test output, honoring RUST_LOG
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Manager under the current username profile
fn live_manager() -> LifecycleManager {
    LifecycleManager::new(live_settings(), UsernamePolicy::CURRENT)
}

fn creation_batch() -> Vec<String> {
    vec![
        "CREATE USER '{{name}}'@'%' IDENTIFIED BY '{{password}}'; \
         GRANT SELECT ON *.* TO '{{name}}'@'%'"
            .to_string(),
    ]
}

fn request(display: &str, role: &str) -> UsernameRequest {
    UsernameRequest {
        display_name: display.to_string(),
        role_name: role.to_string(),
    }
}

/// Try to open a connection as the given account
async fn can_login(username: &str, password: &str) -> bool {
    let settings = ConnectionSettings::new("localhost", 3306, username, password);
    grantor::engine::mysql::connect(&settings).await.is_ok()
}

// ============================================================================
// Fail-Fast Paths (no database required)
// ============================================================================

#[tokio::test]
async fn test_create_user_empty_batch_fails_before_io() {
    let err = live_manager()
        .create_user(&[], &request("app", "ro"), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, GrantorError::EmptyCreationStatements));
}

#[tokio::test]
async fn test_create_user_whitespace_batch_fails_before_io() {
    let batch = vec![" ;\n ; ".to_string()];
    let err = live_manager()
        .create_user(&batch, &request("app", "ro"), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, GrantorError::EmptyCreationStatements));
}

#[tokio::test]
async fn test_rotate_without_username_fails_before_io() {
    let settings = ConnectionSettings::new("localhost", 3306, "", "password");
    let manager = LifecycleManager::new(settings, UsernamePolicy::CURRENT);

    let err = manager.rotate_root_credentials(&[]).await.unwrap_err();
    assert_eq!(err.error_code(), "CONFIG_ERROR");
}

#[tokio::test]
async fn test_renew_user_always_succeeds() {
    assert!(live_manager().renew_user(&[], "anybody", Utc::now()).is_ok());
}

// ============================================================================
// Default Statement Substitution
// ============================================================================

#[test]
fn test_default_revocation_renders_to_revoke_drop_pair() {
    let context: HashMap<&str, &str> = HashMap::from([("name", "v-app-ro-abc123")]);
    let rendered = template::render(DEFAULT_REVOCATION_SQL, &context);

    assert_eq!(
        rendered,
        vec![
            "REVOKE ALL PRIVILEGES, GRANT OPTION FROM 'v-app-ro-abc123'@'%'".to_string(),
            "DROP USER 'v-app-ro-abc123'@'%'".to_string(),
        ]
    );
}

#[test]
fn test_default_rotation_renders_to_single_alter_user() {
    let context: HashMap<&str, &str> =
        HashMap::from([("username", "root"), ("password", "A1a-next")]);
    let rendered = template::render(DEFAULT_ROTATION_SQL, &context);

    assert_eq!(
        rendered,
        vec!["ALTER USER 'root'@'%' IDENTIFIED BY 'A1a-next'".to_string()]
    );
}

// ============================================================================
// Live End-to-End Scenarios
// ============================================================================

#[tokio::test]
#[ignore] // Requires running MySQL instance
async fn test_create_then_revoke_user() {
    init_tracing();
    let manager = live_manager();
    let expiration = Utc::now() + Duration::hours(1);

    let credential = manager
        .create_user(&creation_batch(), &request("token", "readonly"), expiration)
        .await
        .expect("user creation failed");

    assert!(credential.username.chars().count() <= UsernamePolicy::CURRENT.max_username_len);
    assert!(!credential.password.is_empty());

    // Both statements committed as a unit: the account can log in and read
    assert!(can_login(&credential.username, &credential.password).await);

    // Revoke with no statements supplied uses the built-in revoke+drop pair
    manager
        .revoke_user(&[], &credential.username)
        .await
        .expect("user revocation failed");

    assert!(!can_login(&credential.username, &credential.password).await);
}

#[tokio::test]
#[ignore] // Requires running MySQL instance
async fn test_failed_batch_leaves_no_partial_account() {
    init_tracing();
    let manager = live_manager();
    let batch = vec![
        "CREATE USER '{{name}}'@'%' IDENTIFIED BY '{{password}}'; \
         THIS IS NOT VALID SQL"
            .to_string(),
    ];

    let err = manager
        .create_user(&batch, &request("token", "broken"), Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "STATEMENT_FAILED");

    // The CREATE USER before the failing statement must have rolled back;
    // no generated account under this role prefix can log in, and none
    // should exist server-side. A fresh connection verifies via the catalog.
    let conn_settings = live_settings();
    let mut conn = grantor::engine::mysql::connect(&conn_settings)
        .await
        .expect("verification connection failed");
    use mysql_async::prelude::Queryable;
    let leftovers: Vec<String> = conn
        .query("SELECT user FROM mysql.user WHERE user LIKE 'token-brok%'")
        .await
        .expect("catalog query failed");
    assert!(leftovers.is_empty(), "partial account persisted: {leftovers:?}");
}

#[tokio::test]
#[ignore] // Requires running MySQL instance
async fn test_rotate_root_credentials_end_to_end() {
    init_tracing();
    let root = live_manager();

    // Rotate a dedicated admin account rather than the shared root login
    let admin_batch = vec![
        "CREATE USER '{{name}}'@'%' IDENTIFIED BY '{{password}}'; \
         GRANT ALL PRIVILEGES ON *.* TO '{{name}}'@'%' WITH GRANT OPTION"
            .to_string(),
    ];
    let admin = root
        .create_user(&admin_batch, &request("rotation", "admin"), Utc::now() + Duration::hours(1))
        .await
        .expect("admin creation failed");

    let settings = ConnectionSettings::new("localhost", 3306, &admin.username, &admin.password);
    let manager = LifecycleManager::new(settings, UsernamePolicy::CURRENT);

    let rotated = manager
        .rotate_root_credentials(&[])
        .await
        .expect("rotation failed");

    assert_eq!(rotated.username, admin.username);
    assert_ne!(rotated.password, admin.password);

    // Old password no longer works; the recorded one does
    assert!(!can_login(&admin.username, &admin.password).await);
    assert!(can_login(&rotated.username, &rotated.password).await);

    root.revoke_user(&[], &admin.username).await.expect("cleanup failed");
}

#[tokio::test]
#[ignore] // Requires running MySQL instance
async fn test_concurrent_operations_are_serialized() {
    init_tracing();
    use std::sync::Arc;

    let manager = Arc::new(live_manager());
    let mut handles = Vec::new();

    // All operations share one guarded connection; the guard queues them,
    // so every creation must succeed with a distinct account.
    for i in 0..4 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager
                .create_user(
                    &creation_batch(),
                    &request("concurrent", &format!("role{i}")),
                    Utc::now() + Duration::hours(1),
                )
                .await
        }));
    }

    let mut usernames = Vec::new();
    for handle in handles {
        let credential = handle.await.expect("task panicked").expect("creation failed");
        usernames.push(credential.username);
    }

    usernames.sort();
    usernames.dedup();
    assert_eq!(usernames.len(), 4, "expected four distinct accounts");

    let manager = Arc::try_unwrap(manager).ok().expect("manager still shared");
    for username in &usernames {
        manager.revoke_user(&[], username).await.expect("cleanup failed");
    }
}
