use crate::error::KeyError;

/// Separator reserved for addressing nested attribute values.
pub const FIELD_SEPARATOR: char = '.';

/// Check an attribute or extra key.
pub fn validate_key(key: &str) -> Result<(), KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    if key.contains(FIELD_SEPARATOR) {
        return Err(KeyError::ReservedSeparator(key.to_string()));
    }
    Ok(())
}
