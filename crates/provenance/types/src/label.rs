//! Link-label grammar.
//!
//! Labels are identifiers (`[A-Za-z_][A-Za-z0-9_]*`). Nested process ports
//! are flattened into labels by joining namespaces with
//! [`NAMESPACE_SEPARATOR`], so a label must split back into non-empty
//! segments without ambiguity.

use crate::error::LabelError;

/// Separator used to flatten nested port namespaces into a link label.
pub const NAMESPACE_SEPARATOR: &str = "__";

/// Check a link label against the grammar.
pub fn validate_link_label(label: &str) -> Result<(), LabelError> {
    let first = label.chars().next().ok_or(LabelError::Empty)?;
    if first.is_ascii_digit() {
        return Err(LabelError::LeadingDigit(label.to_string()));
    }
    if let Some(ch) = label
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(LabelError::InvalidCharacter {
            label: label.to_string(),
            ch,
        });
    }
    if label.contains("___") {
        return Err(LabelError::AmbiguousSeparator(label.to_string()));
    }
    if label.split(NAMESPACE_SEPARATOR).any(str::is_empty) {
        return Err(LabelError::EmptyNamespace(label.to_string()));
    }
    Ok(())
}

/// Split a flattened label into its namespace path and leaf name.
pub fn split_namespaces(label: &str) -> (Vec<&str>, &str) {
    let mut parts: Vec<&str> = label.split(NAMESPACE_SEPARATOR).collect();
    let leaf = parts.pop().unwrap_or(label);
    (parts, leaf)
}
