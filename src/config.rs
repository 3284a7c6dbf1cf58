//! Document configuration
//!
//! A `Config` value is handed to [`Document::new`](crate::Document::new) and to
//! entity constructors. Nothing in the crate reads process-wide settings.

use serde::{Deserialize, Serialize};

use crate::error::{SbolError, SbolResult};

/// Default namespace used when none is configured
pub const DEFAULT_HOMESPACE: &str = "http://examples.org";

/// Default bound on nested auto-corrections
pub const DEFAULT_MAX_CORRECTION_DEPTH: usize = 8;

/// Settings that shape identity generation and validation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Namespace that relative identities resolve against
    pub homespace: String,
    /// Derive child identities from their parent (`parent/displayId[/version]`)
    pub compliant_uris: bool,
    /// Insert the type name into top-level identities (`homespace/Type/displayId`)
    pub typed_uris: bool,
    /// Version appended to generated identities
    pub default_version: Option<String>,
    /// Run whole-document validation before writing triples
    pub validate_on_write: bool,
    /// Let rules apply their corrective action instead of failing
    pub auto_correct: bool,
    /// Maximum nesting of auto-corrections before `ValidationCycle`
    pub max_correction_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            homespace: DEFAULT_HOMESPACE.to_string(),
            compliant_uris: true,
            typed_uris: false,
            default_version: None,
            validate_on_write: true,
            auto_correct: true,
            max_correction_depth: DEFAULT_MAX_CORRECTION_DEPTH,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> SbolResult<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| SbolError::invalid(format!("config: {e}")))?;
        config.check()?;
        Ok(config)
    }

    /// Replace the homespace
    pub fn with_homespace(mut self, homespace: impl Into<String>) -> SbolResult<Self> {
        self.homespace = homespace.into();
        self.check()?;
        Ok(self)
    }

    /// Set the version appended to generated identities
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = Some(version.into());
        self
    }

    fn check(&self) -> SbolResult<()> {
        if self.homespace.ends_with('/') {
            return Err(SbolError::invalid(format!(
                "homespace '{}' must not end with a path separator",
                self.homespace
            )));
        }
        if !crate::identity::is_absolute(&self.homespace) {
            return Err(SbolError::invalid(format!(
                "homespace '{}' is not an absolute URI",
                self.homespace
            )));
        }
        if self.max_correction_depth == 0 {
            return Err(SbolError::invalid("max_correction_depth must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = Config::from_json_str(r#"{ "homespace": "http://sbols.org/test" }"#).unwrap();

        assert_eq!(config.homespace, "http://sbols.org/test");
        assert!(config.compliant_uris);
        assert!(config.auto_correct);
        assert_eq!(config.max_correction_depth, DEFAULT_MAX_CORRECTION_DEPTH);
    }

    #[test]
    fn test_trailing_separator_rejected() {
        let result = Config::default().with_homespace("http://sbols.org/test/");
        assert!(matches!(result, Err(SbolError::InvalidArgument(_))));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = Config::from_json_str("{ homespace: ");
        assert!(matches!(result, Err(SbolError::InvalidArgument(_))));
    }
}
