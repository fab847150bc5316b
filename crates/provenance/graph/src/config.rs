//! Provenance configuration, loaded from TOML.
//!
//! ```toml
//! [profile]
//! name = "lab"
//! default_user_email = "alice@example.org"
//!
//! [caching]
//! default_enabled = false
//! enabled_for = ["core.arithmetic.*"]
//! disabled_for = ["core.arithmetic.slow"]
//! ```

use crate::caching::CachingConfig;
use crate::error::ConfigError;
use provenance_store::Profile;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Configuration for a provenance graph session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    /// Handed to the storage backend at construction.
    pub profile: Profile,
    pub caching: CachingConfig,
}

impl ProvenanceConfig {
    /// Load configuration from a file; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&contents)?;
            debug!(path = %path.display(), profile = %config.profile.name, "Loaded configuration");
            Ok(config)
        } else {
            debug!(path = %path.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.caching.validate()?;
        Ok(config)
    }
}
