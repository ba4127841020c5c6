//! Composer configuration.
//!
//! Controls how a [`SchemaComposer`](crate::SchemaComposer) builds its
//! executable schema and the defaults applied while composing.
//!
//! # Example Configuration
//!
//! ```toml
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! prune_empty_types = true
//! keep_unused_types = false
//! relation_catch_errors = true
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ComposeError;
use crate::schema::BuildOptions;

/// Schema composer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Maximum query depth allowed.
    /// Default: unlimited
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Maximum query complexity allowed.
    /// Default: unlimited
    #[serde(default)]
    pub max_complexity: Option<usize>,

    /// Enable GraphQL introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Drop types that end up without fields, and every field pointing at them.
    /// Default: true
    #[serde(default = "default_prune_empty_types")]
    pub prune_empty_types: bool,

    /// Emit every registered type, even when no root field reaches it.
    /// Default: false
    #[serde(default)]
    pub keep_unused_types: bool,

    /// Resolve a failing relation to `null` instead of failing the parent.
    /// Relations may override this per call.
    /// Default: true
    #[serde(default = "default_relation_catch_errors")]
    pub relation_catch_errors: bool,
}

fn default_introspection() -> bool {
    true
}

fn default_prune_empty_types() -> bool {
    true
}

fn default_relation_catch_errors() -> bool {
    true
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_complexity: None,
            introspection: default_introspection(),
            prune_empty_types: default_prune_empty_types(),
            keep_unused_types: false,
            relation_catch_errors: default_relation_catch_errors(),
        }
    }
}

impl ComposerConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == Some(0) {
            return Err("max_depth must be > 0".into());
        }
        if self.max_complexity == Some(0) {
            return Err("max_complexity must be > 0".into());
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `MalformedDefinition` if the document does not parse or fails validation.
    pub fn from_toml_str(text: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| ComposeError::malformed(format!("invalid composer config: {e}")))?;
        config
            .validate()
            .map_err(|e| ComposeError::malformed(format!("invalid composer config: {e}")))?;
        Ok(config)
    }

    /// Converts this config to per-build options.
    #[must_use]
    pub fn to_build_options(&self) -> BuildOptions {
        BuildOptions {
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            introspection: self.introspection,
            prune_empty_types: self.prune_empty_types,
            keep_unused_types: self.keep_unused_types,
            extra_types: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ComposerConfig::default();
        assert_eq!(config.max_depth, None);
        assert!(config.introspection);
        assert!(config.prune_empty_types);
        assert!(!config.keep_unused_types);
        assert!(config.relation_catch_errors);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_limits() {
        let config = ComposerConfig {
            max_depth: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ComposerConfig {
            max_complexity: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let config = ComposerConfig::from_toml_str(
            r#"
            max_depth = 20
            introspection = false
            relation_catch_errors = false
        "#,
        )
        .unwrap();

        assert_eq!(config.max_depth, Some(20));
        assert_eq!(config.max_complexity, None);
        assert!(!config.introspection);
        assert!(config.prune_empty_types);
        assert!(!config.relation_catch_errors);
    }

    #[test]
    fn test_toml_validation_error() {
        let err = ComposerConfig::from_toml_str("max_complexity = 0").unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_DEFINITION");

        let err = ComposerConfig::from_toml_str("introspection = 3").unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_DEFINITION");
    }

    #[test]
    fn test_build_options() {
        let config = ComposerConfig {
            max_depth: Some(8),
            keep_unused_types: true,
            ..Default::default()
        };
        let options = config.to_build_options();
        assert_eq!(options.max_depth, Some(8));
        assert!(options.keep_unused_types);
        assert!(options.extra_types.is_empty());
    }
}
