//! Statement Templating
//!
//! This module turns a raw, possibly multi-statement SQL string into the
//! ordered list of individual statements to execute, with named placeholders
//! substituted.
//!
//! # Templating Strategy
//! - Raw statements are split on `;`, trimmed, and empty pieces discarded
//! - Every occurrence of `{{key}}` for each context key is replaced with its
//!   value (plain text substitution, not SQL-escaped; statement templates
//!   are trusted administrator input, not untrusted user input)
//! - Placeholders with no matching context key are left as literal text
//!
//! Rendering is pure: the same raw statement and context always produce the
//! same output, and no state is mutated.

use std::collections::HashMap;

/// Split a raw statement string into individual statements
///
/// Splits on `;`, trims surrounding whitespace from each piece, and discards
/// empty pieces. Order is preserved.
#[must_use]
pub fn split_statements(raw: &str) -> Vec<&str> {
    raw.split(';')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Substitute `{{key}}` placeholders in a single statement
///
/// Each context entry replaces every occurrence of its `{{key}}` token.
/// Unknown placeholders are untouched.
#[must_use]
pub fn apply_placeholders(statement: &str, context: &HashMap<&str, &str>) -> String {
    let mut rendered = statement.to_string();
    for (key, value) in context {
        let token = format!("{{{{{key}}}}}");
        rendered = rendered.replace(&token, value);
    }
    rendered
}

/// Render a raw statement string into executable statements
///
/// Splits `raw` into individual statements and substitutes the context into
/// each. Returns the ordered list of non-empty rendered statements.
#[must_use]
pub fn render(raw: &str, context: &HashMap<&str, &str>) -> Vec<String> {
    split_statements(raw)
        .into_iter()
        .map(|statement| apply_placeholders(statement, context))
        .collect()
}
