//! Process-wide caching switches.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

const WILDCARD: char = '*';

/// Which node identifiers may use the cache when they are stored.
///
/// Identifiers are process types, or type strings for nodes without one.
/// Patterns may contain `*` wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachingConfig {
    /// Answer for identifiers that no pattern matches.
    pub default_enabled: bool,
    pub enabled_for: Vec<String>,
    pub disabled_for: Vec<String>,
}

impl CachingConfig {
    /// Caching on for every identifier.
    pub fn enabled() -> Self {
        Self {
            default_enabled: true,
            ..Self::default()
        }
    }

    /// Caching off for every identifier.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn enable_for(mut self, pattern: impl Into<String>) -> Self {
        self.enabled_for.push(pattern.into());
        self
    }

    pub fn disable_for(mut self, pattern: impl Into<String>) -> Self {
        self.disabled_for.push(pattern.into());
        self
    }

    /// Check every configured pattern against the identifier grammar.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.enabled_for
            .iter()
            .chain(&self.disabled_for)
            .try_for_each(|p| validate_identifier(p, true))
    }

    /// Resolve whether nodes with `identifier` use the cache.
    ///
    /// The identifier is matched as-is; only configured patterns are held
    /// to the identifier grammar. An exact pattern beats a wildcard one, and a wildcard that is
    /// matched by another wildcard beats it. Equally specific matches in
    /// both lists are ambiguous.
    pub fn use_cache(&self, identifier: &str) -> Result<bool, ConfigError> {
        let enabled = most_specific(&self.enabled_for, identifier);
        let disabled = most_specific(&self.disabled_for, identifier);

        match (enabled, disabled) {
            (None, None) => Ok(self.default_enabled),
            (Some(_), None) => Ok(true),
            (None, Some(_)) => Ok(false),
            (Some(e), Some(d)) => {
                if more_specific(e, d) {
                    Ok(true)
                } else if more_specific(d, e) {
                    Ok(false)
                } else {
                    Err(ConfigError::AmbiguousCaching {
                        identifier: identifier.to_string(),
                        enabled: e.to_string(),
                        disabled: d.to_string(),
                    })
                }
            }
        }
    }
}

fn validate_identifier(identifier: &str, allow_wildcard: bool) -> Result<(), ConfigError> {
    let valid = !identifier.is_empty()
        && identifier.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '.' | '_' | ':')
                || (allow_wildcard && c == WILDCARD)
        });
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(identifier.to_string()))
    }
}

fn most_specific<'a>(patterns: &'a [String], identifier: &str) -> Option<&'a str> {
    patterns
        .iter()
        .map(String::as_str)
        .filter(|p| wildcard_match(p, identifier))
        .fold(None, |best, p| match best {
            Some(b) if !more_specific(p, b) => Some(b),
            _ => Some(p),
        })
}

/// `a` is strictly more specific than `b`.
fn more_specific(a: &str, b: &str) -> bool {
    if a == b {
        return false;
    }
    let a_exact = !a.contains(WILDCARD);
    let b_exact = !b.contains(WILDCARD);
    match (a_exact, b_exact) {
        (true, false) => true,
        (false, true) => false,
        // Two distinct exact patterns cannot both match one identifier.
        (true, true) => false,
        // Every identifier `a` matches is then also matched by `b`.
        (false, false) => wildcard_match(b, a) && !wildcard_match(a, b),
    }
}

/// Glob match where `*` stands for any run of characters.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] == WILDCARD {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == WILDCARD)
}
