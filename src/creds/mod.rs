//! Credential Generation
//!
//! This module produces the three generated values a creation statement can
//! reference: a username, a random password, and a formatted expiration
//! timestamp.
//!
//! # Username Policy
//! Username shape is governed by an explicit [`UsernamePolicy`] value chosen
//! at construction time. Two immutable profiles exist:
//! - [`UsernamePolicy::CURRENT`]: 10-char display/role budgets, 32-char max
//! - [`UsernamePolicy::LEGACY`]: 4-char display/role budgets, 16-char max
//!
//! The generated name is `<display>-<role>-<random>` truncated to the
//! maximum length, so two accounts created for the same role never collide
//! and an operator can still tell at a glance which role produced a name.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::{GrantorError, Result};

/// Length of the random suffix appended to every generated username
const USERNAME_SUFFIX_LEN: usize = 20;

/// Length of the random portion of a generated password
const PASSWORD_LEN: usize = 20;

/// Prefix guaranteeing upper/lower/digit character classes in passwords,
/// for engines configured with password complexity requirements
const PASSWORD_COMPLEXITY_PREFIX: &str = "A1a-";

/// Timestamp format accepted by the engine as a SQL datetime literal
const EXPIRATION_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

/// Length budgets and separator governing generated usernames
///
/// An immutable value object: pick one of the named profiles (or build a
/// custom one) and hand it to the lifecycle manager at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsernamePolicy {
    /// Max chars of the display-name segment (0 drops the segment)
    pub display_name_len: usize,

    /// Max chars of the role-name segment (0 drops the segment)
    pub role_name_len: usize,

    /// Max total username length; the engine rejects anything longer
    pub max_username_len: usize,

    /// Separator between name segments
    pub separator: char,
}

impl UsernamePolicy {
    /// Current profile: 32-char usernames with 10-char name segments
    pub const CURRENT: Self = Self {
        display_name_len: 10,
        role_name_len: 10,
        max_username_len: 32,
        separator: '-',
    };

    /// Legacy profile for engines predating long usernames: 16-char
    /// usernames with 4-char name segments
    pub const LEGACY: Self = Self {
        display_name_len: 4,
        role_name_len: 4,
        max_username_len: 16,
        separator: '-',
    };
}

/// Caller-supplied naming inputs for a new account
///
/// Both fields are free-form; they are truncated to the policy's segment
/// budgets before use.
#[derive(Debug, Clone, Default)]
pub struct UsernameRequest {
    /// Name of the entity the credential is issued to
    pub display_name: String,

    /// Name of the role whose statements create the account
    pub role_name: String,
}

/// A freshly created account's login pair
///
/// The password is returned exactly once; Grantor keeps no copy.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Generated account name, within the policy's length budget
    pub username: String,

    /// Generated random password
    pub password: String,
}

// Passwords stay out of Debug output, the same as connection settings.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Produces usernames, passwords, and expiration strings under one policy
#[derive(Debug, Clone, Copy)]
pub struct CredentialProducer {
    policy: UsernamePolicy,
}

impl CredentialProducer {
    /// Create a producer governed by the given policy
    #[must_use]
    pub const fn new(policy: UsernamePolicy) -> Self {
        Self { policy }
    }

    /// The policy this producer was built with
    #[must_use]
    pub const fn policy(&self) -> &UsernamePolicy {
        &self.policy
    }

    /// Generate a unique username for the request
    ///
    /// Segments over their budget are truncated char-wise (never mid
    /// codepoint); the whole name is then truncated to the policy maximum.
    /// Fails with a `Generation` error if the maximum length is zero.
    pub fn generate_username(&self, request: &UsernameRequest) -> Result<String> {
        if self.policy.max_username_len == 0 {
            return Err(GrantorError::generation(
                "username length budget must be at least 1",
            ));
        }

        let mut username = String::new();

        let display = truncate_chars(request.display_name.trim(), self.policy.display_name_len);
        if !display.is_empty() {
            username.push_str(display);
            username.push(self.policy.separator);
        }

        let role = truncate_chars(request.role_name.trim(), self.policy.role_name_len);
        if !role.is_empty() {
            username.push_str(role);
            username.push(self.policy.separator);
        }

        username.extend(
            rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(USERNAME_SUFFIX_LEN)
                .map(char::from),
        );

        Ok(truncate_chars(&username, self.policy.max_username_len).to_string())
    }

    /// Generate a random password
    ///
    /// The fixed prefix guarantees upper-case, lower-case, and digit
    /// classes; the rest is random alphanumeric from the thread-local
    /// CSPRNG.
    #[must_use]
    pub fn generate_password(&self) -> String {
        let mut password = String::with_capacity(PASSWORD_COMPLEXITY_PREFIX.len() + PASSWORD_LEN);
        password.push_str(PASSWORD_COMPLEXITY_PREFIX);
        password.extend(
            rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(PASSWORD_LEN)
                .map(char::from),
        );
        password
    }

    /// Render an expiration instant as a SQL datetime literal
    #[must_use]
    pub fn generate_expiration(&self, at: DateTime<Utc>) -> String {
        at.format(EXPIRATION_FORMAT).to_string()
    }
}

/// Truncate to at most `max` chars, on a char boundary
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
