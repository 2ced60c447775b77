//! Tag key normalization: case folding, alias lookup and typo matching.

use super::config::ValidationPolicy;
use super::schema::TagSchema;
use crate::model::issue::{IssueKind, ValidationIssue};
use crate::model::tag::{Tag, fold_key};
use tracing::{debug, info};

/// Largest edit distance treated as a typo.
const MAX_TYPO_DISTANCE: usize = 2;

/// Outcome of resolving one document key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResolution {
    /// The key is a canonical name or alias.
    Known(Tag),
    /// The key was a near-miss spelling and has been replaced.
    Corrected { tag: Tag, from: String },
    /// The key names no schema tag; carried upper-cased.
    Unresolved(Tag),
}

impl KeyResolution {
    pub fn tag(&self) -> &Tag {
        match self {
            KeyResolution::Known(tag)
            | KeyResolution::Corrected { tag, .. }
            | KeyResolution::Unresolved(tag) => tag,
        }
    }

    pub fn into_tag(self) -> Tag {
        match self {
            KeyResolution::Known(tag)
            | KeyResolution::Corrected { tag, .. }
            | KeyResolution::Unresolved(tag) => tag,
        }
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, KeyResolution::Unresolved(_))
    }

    #[inline]
    pub fn is_corrected(&self) -> bool {
        matches!(self, KeyResolution::Corrected { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub resolution: KeyResolution,
    pub issue: Option<ValidationIssue>,
}

/// Resolves a raw document key to its canonical tag.
///
/// Exact spellings (case-insensitive, aliases included) always resolve.
/// Otherwise the closest schema spelling is looked up; a unique close match
/// replaces the key only under a correcting policy and is merely reported
/// as a suggestion otherwise. Keys with no close match are `UnknownTag`.
///
/// The function is pure given a fixed schema and policy.
pub fn normalize_key(schema: &TagSchema, key: &str, policy: ValidationPolicy) -> Normalized {
    let folded = fold_key(key);
    if let Some(tag) = schema.lookup(&folded) {
        if tag.name() != folded {
            debug!(key, tag = %tag, "resolved alias");
        }
        return Normalized {
            resolution: KeyResolution::Known(tag.clone()),
            issue: None,
        };
    }

    match suggest(schema, &folded) {
        Some(suggestion) if policy.correct => {
            info!(key = %folded, tag = %suggestion, "corrected misspelled tag");
            let issue = ValidationIssue::error(
                folded.clone(),
                IssueKind::Typo {
                    suggestion: suggestion.name().to_string(),
                },
                format!("misspelled tag {folded} replaced by {suggestion}"),
            )
            .mark_fixed();
            Normalized {
                resolution: KeyResolution::Corrected {
                    tag: suggestion.clone(),
                    from: folded,
                },
                issue: Some(issue),
            }
        }
        Some(suggestion) => {
            debug!(key = %folded, tag = %suggestion, "possible misspelling");
            let issue = ValidationIssue::warning(
                folded.clone(),
                IssueKind::Typo {
                    suggestion: suggestion.name().to_string(),
                },
                format!("unrecognized tag {folded}; did you mean {suggestion}?"),
            );
            Normalized {
                resolution: KeyResolution::Unresolved(Tag::new(&folded)),
                issue: Some(issue),
            }
        }
        None => {
            debug!(key = %folded, "unknown tag");
            let issue = ValidationIssue::error(
                folded.clone(),
                IssueKind::UnknownTag,
                format!("{folded} is not a recognized tag"),
            );
            Normalized {
                resolution: KeyResolution::Unresolved(Tag::new(&folded)),
                issue: Some(issue),
            }
        }
    }
}

/// The unique canonical tag closest to `key`, if it is close enough.
///
/// Distance is optimal string alignment over every accepted spelling; a
/// match needs `1 <= d <= 2` and `3 * d <= key length`. Ties between
/// different tags yield no suggestion.
pub fn suggest<'s>(schema: &'s TagSchema, key: &str) -> Option<&'s Tag> {
    let folded = fold_key(key);
    let mut best: Option<(usize, &Tag)> = None;
    let mut ambiguous = false;

    for (spelling, tag) in schema.spellings() {
        let distance = strsim::osa_distance(&folded, spelling);
        match best {
            Some((d, _)) if distance > d => {}
            Some((d, current)) if distance == d => {
                if current != tag {
                    ambiguous = true;
                }
            }
            _ => {
                best = Some((distance, tag));
                ambiguous = false;
            }
        }
    }

    let (distance, tag) = best?;
    let close = (1..=MAX_TYPO_DISTANCE).contains(&distance)
        && 3 * distance <= folded.chars().count();
    (close && !ambiguous).then_some(tag)
}
