mod config;
mod convention;
mod error;
mod intake;
mod merge;
mod normalize;
mod resolve;
mod schema;
mod validate;

pub use config::{ForgeConfig, ValidationPolicy};
pub use convention::{RangeRecord, SitePropertySpec, classify};
pub use error::Error;
pub use intake::normalize_document;
pub use merge::{builtin_defaults, merge_documents};
pub use normalize::{KeyResolution, Normalized, normalize_key, suggest};
pub use resolve::{Resolved, resolve_site_property};
pub use schema::{
    Arity, Choice, CoherenceRule, Condition, Domain, TagDefinition, TagSchema, load_schema,
};
pub use validate::validate;

use crate::model::document::{NormalizedDocument, RawDocument};
use crate::model::issue::ValidationIssue;
use crate::model::structure::Structure;
use tracing::debug;

/// Result of running a document through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ForgeReport {
    /// The canonical document, corrected if the policy asked for it.
    pub document: NormalizedDocument,
    /// Every finding, in the order the stages produced them.
    pub issues: Vec<ValidationIssue>,
    pub policy: ValidationPolicy,
}

impl ForgeReport {
    /// Findings to show the caller; empty under a silent policy.
    pub fn reported(&self) -> &[ValidationIssue] {
        if self.policy.surfaces_issues() {
            &self.issues
        } else {
            &[]
        }
    }

    /// Every finding regardless of policy.
    pub fn all_issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Whether any error-severity finding was left unfixed.
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_blocking)
    }

    pub fn fixed_count(&self) -> usize {
        self.issues.iter().filter(|i| i.fixed).count()
    }
}

/// Normalizes, resolves, merges and validates a raw document.
///
/// # Errors
///
/// Returns an error if the custom schema is invalid, the structure is
/// empty, a range reaches past the last site, or a structure-derived
/// property has no source column. Everything else is reported as an issue.
pub fn forge(
    raw: &RawDocument,
    structure: &Structure,
    config: &ForgeConfig,
) -> Result<ForgeReport, Error> {
    let schema = load_schema(config.schema.as_deref())?;
    if structure.is_empty() {
        return Err(Error::EmptyStructure);
    }
    let policy = config.policy;
    let mut issues = Vec::new();

    let explicit = normalize_document(raw, &schema, structure, policy, &mut issues)?;
    let base = match &config.base_defaults {
        Some(base) => Some(normalize_document(
            base,
            &schema,
            structure,
            policy,
            &mut issues,
        )?),
        None => None,
    };
    let builtins = config
        .fill_builtin_defaults
        .then(|| builtin_defaults(&schema));

    let merged = merge_documents(explicit, base, builtins);
    let (document, found) = validate(merged, &schema, structure, policy);
    issues.extend(found);

    debug!(
        tags = document.len(),
        issues = issues.len(),
        warn = policy.warn,
        correct = policy.correct,
        "forged document"
    );
    Ok(ForgeReport {
        document,
        issues,
        policy,
    })
}
