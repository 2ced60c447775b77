//! Error types for document normalization.
//!
//! Only conditions that make an output impossible are errors. Everything a
//! caller could reasonably want reported alongside a best-effort document is
//! a [`ValidationIssue`](crate::ValidationIssue) instead.

use crate::model::issue::{IssueKind, ValidationIssue};
use thiserror::Error;

/// Fatal failures of the [`forge`](super::forge) pipeline.
///
/// Schema errors come from configuration. [`Error::MissingRequiredData`] and
/// [`Error::RangeOutOfBounds`] come from the document itself and abort
/// processing regardless of the validation policy.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to parse a tag schema TOML.
    #[error("failed to parse tag schema: {0}")]
    SchemaParse(#[from] toml::de::Error),

    /// The schema parsed but is internally inconsistent.
    #[error("invalid tag schema: {0}")]
    InvalidSchema(String),

    /// The structure contains no sites.
    #[error("structure is empty: at least one site is required")]
    EmptyStructure,

    /// A property was requested from a structure column that does not exist.
    ///
    /// Occurs when a site tag is set to read from the structure (e.g.
    /// `MAGMOM: true`) but not every site carries the column.
    #[error("tag {tag} reads per-site column '{column}' from the structure, but the structure does not provide it for every site")]
    MissingRequiredData {
        /// Canonical tag name.
        tag: String,
        /// Name of the per-site metadata column.
        column: String,
    },

    /// A range record reaches past the last site.
    #[error("range [{start}, {stop}) for tag {tag} exceeds the structure's {site_count} sites")]
    RangeOutOfBounds {
        tag: String,
        start: i64,
        stop: i64,
        site_count: usize,
    },
}

impl Error {
    pub fn missing_required_data(tag: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingRequiredData {
            tag: tag.into(),
            column: column.into(),
        }
    }

    pub fn range_out_of_bounds(
        tag: impl Into<String>,
        start: i64,
        stop: i64,
        site_count: usize,
    ) -> Self {
        Self::RangeOutOfBounds {
            tag: tag.into(),
            start,
            stop,
            site_count,
        }
    }

    /// The document-level failures expressed as a reportable issue.
    ///
    /// Returns `None` for configuration errors, which do not belong to any
    /// tag.
    pub fn as_issue(&self) -> Option<ValidationIssue> {
        match self {
            Error::MissingRequiredData { tag, .. } => Some(ValidationIssue::error(
                tag.clone(),
                IssueKind::MissingRequiredData,
                self.to_string(),
            )),
            Error::RangeOutOfBounds { tag, .. } => Some(ValidationIssue::error(
                tag.clone(),
                IssueKind::RangeOutOfBounds,
                self.to_string(),
            )),
            Error::SchemaParse(_) | Error::InvalidSchema(_) | Error::EmptyStructure => None,
        }
    }
}
