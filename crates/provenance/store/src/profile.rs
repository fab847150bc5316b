use serde::{Deserialize, Serialize};

/// Explicit profile context handed to a backend at construction.
///
/// Node creation takes its default owner from here instead of from any
/// process-global "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Profile name, used in log output.
    pub name: String,

    /// Email of the user owning nodes created under this profile.
    pub default_user_email: String,
}

impl Profile {
    pub fn new(name: impl Into<String>, default_user_email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_user_email: default_user_email.into(),
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            default_user_email: "user@localhost".to_string(),
        }
    }
}
