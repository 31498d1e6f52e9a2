//! Matching policy and suite-wide settings.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming a TOML settings file.
pub const CONFIG_PATH_ENV: &str = "SPYGLASS_CONFIG";
/// Environment override for [`MatchPolicy::strict_sequence`].
pub const STRICT_SEQUENCE_ENV: &str = "SPYGLASS_STRICT_SEQUENCE";
/// Environment override for [`MatchPolicy::strict_size`].
pub const STRICT_SIZE_ENV: &str = "SPYGLASS_STRICT_SIZE";

/// How declared expectations are reconciled with recorded events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    /// Expectation `i` must match the event recorded at position `i`
    pub strict_sequence: bool,
    /// Events left over after matching are a failure
    pub strict_size: bool,
}

impl MatchPolicy {
    /// Positional matching, no leftovers allowed.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            strict_sequence: true,
            strict_size: true,
        }
    }

    /// Any order, leftovers ignored.
    #[must_use]
    pub const fn lenient() -> Self {
        Self {
            strict_sequence: false,
            strict_size: false,
        }
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::strict()
    }
}

/// Defaults for the HTTP client double.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Base URI relative request URLs resolve against
    pub base_uri: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_uri: "https://example.com".to_owned(),
        }
    }
}

/// Settings a test suite may share through a TOML file.
///
/// ```toml
/// [policy]
/// strict_sequence = false
///
/// [http]
/// base_uri = "https://api.example.test"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default matching policy
    pub policy: MatchPolicy,
    /// HTTP client double defaults
    pub http: HttpSettings,
}

impl Settings {
    /// Parse settings from TOML text.
    ///
    /// # Errors
    /// Returns an error if the text is not valid settings TOML.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load settings from the file named by `SPYGLASS_CONFIG` (defaults when
    /// unset), then apply the `SPYGLASS_STRICT_*` overrides.
    ///
    /// # Errors
    /// Returns an error if the named file cannot be loaded or an override is
    /// not a boolean.
    pub fn from_env() -> Result<Self> {
        let mut settings = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };

        if let Some(strict_sequence) = bool_override(STRICT_SEQUENCE_ENV)? {
            settings.policy.strict_sequence = strict_sequence;
        }
        if let Some(strict_size) = bool_override(STRICT_SIZE_ENV)? {
            settings.policy.strict_size = strict_size;
        }

        tracing::debug!(?settings, "loaded spyglass settings");
        Ok(settings)
    }
}

fn bool_override(name: &str) -> Result<Option<bool>> {
    let Ok(raw) = env::var(name) else {
        return Ok(None);
    };
    parse_bool(&raw)
        .map(Some)
        .ok_or_else(|| Error::Config(format!("{name} must be a boolean, got {raw:?}")))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_policy_is_strict() {
        let policy = MatchPolicy::default();
        assert!(policy.strict_sequence);
        assert!(policy.strict_size);
        assert_eq!(MatchPolicy::lenient(), MatchPolicy {
            strict_sequence: false,
            strict_size: false,
        });
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml_str("[policy]\nstrict_size = false\n").unwrap();
        assert!(settings.policy.strict_sequence);
        assert!(!settings.policy.strict_size);
        assert_eq!(settings.http.base_uri, "https://example.com");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let error = Settings::from_toml_str("[policy\n").unwrap_err();
        assert!(matches!(error, Error::Toml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nbase_uri = \"https://api.example.test\"").unwrap();

        let settings = Settings::load_from_file(file.path()).unwrap();
        assert_eq!(settings.http.base_uri, "https://api.example.test");
        assert_eq!(settings.policy, MatchPolicy::strict());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
