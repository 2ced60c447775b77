//! Configuration for the normalization pipeline.
//!
//! - [`ForgeConfig`] — Main configuration struct
//! - [`ValidationPolicy`] — The `{warn, correct}` flags of a document's
//!   `validation` block

use crate::model::document::RawDocument;
use serde::Deserialize;

/// How validation findings are treated.
///
/// | warn  | correct | behaviour                                          |
/// |-------|---------|----------------------------------------------------|
/// | false | false   | findings collected, nothing reported or mutated     |
/// | true  | false   | findings reported, document left as written         |
/// | any   | true    | findings reported, safe fixes applied in place      |
///
/// # Examples
///
/// ```
/// use incar_forge::ValidationPolicy;
///
/// let legacy = ValidationPolicy::default();
/// assert!(!legacy.surfaces_issues());
///
/// let fix = ValidationPolicy::correcting();
/// assert!(fix.correct && fix.surfaces_issues());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationPolicy {
    /// Surface findings to the caller.
    pub warn: bool,
    /// Apply every unambiguous automatic fix.
    pub correct: bool,
}

impl ValidationPolicy {
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn warning() -> Self {
        Self {
            warn: true,
            correct: false,
        }
    }

    pub fn correcting() -> Self {
        Self {
            warn: true,
            correct: true,
        }
    }

    #[inline]
    pub fn surfaces_issues(&self) -> bool {
        self.warn || self.correct
    }
}

/// Main configuration for [`forge`](super::forge).
///
/// # Examples
///
/// ```
/// use incar_forge::{ForgeConfig, ValidationPolicy};
///
/// let config = ForgeConfig {
///     policy: ValidationPolicy::warning(),
///     ..Default::default()
/// };
/// assert!(config.schema.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ForgeConfig {
    /// Custom tag schema in TOML format.
    ///
    /// If `None`, uses the embedded `tags.toml`.
    pub schema: Option<String>,

    /// Validation flags.
    pub policy: ValidationPolicy,

    /// User-supplied base defaults, overridden by the explicit document.
    pub base_defaults: Option<RawDocument>,

    /// Materialize every built-in schema default that neither document sets.
    pub fill_builtin_defaults: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = ForgeConfig::default();
        assert!(config.schema.is_none());
        assert!(config.base_defaults.is_none());
        assert!(!config.fill_builtin_defaults);
        assert_eq!(config.policy, ValidationPolicy::silent());
    }

    #[test]
    fn policy_deserializes_with_missing_flags() {
        let policy: ValidationPolicy = serde_yaml::from_str("warn: true").unwrap();
        assert_eq!(policy, ValidationPolicy::warning());

        let empty: ValidationPolicy = serde_yaml::from_str("{}").unwrap();
        assert_eq!(empty, ValidationPolicy::silent());
    }

    #[test]
    fn unknown_policy_flag_is_rejected() {
        let result: Result<ValidationPolicy, _> = serde_yaml::from_str("fix: true");
        assert!(result.is_err());
    }
}
