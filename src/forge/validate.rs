//! Schema-driven checks over a merged document.
//!
//! Per-tag checks confirm each value's arity and domain; coherence rules
//! from the schema then check combinations of tags. Findings with an
//! unambiguous remedy carry a replacement value that is applied only under
//! a correcting policy.

use super::config::ValidationPolicy;
use super::schema::{Arity, CoherenceRule, Condition, TagDefinition, TagSchema};
use crate::model::document::{NormalizedDocument, Provenance};
use crate::model::issue::{IssueKind, ValidationIssue};
use crate::model::structure::Structure;
use crate::model::tag::Tag;
use crate::model::value::{CanonicalSiteArray, TagValue};
use tracing::{debug, info};

/// A validation finding, with the value that would remedy it.
struct Finding {
    issue: ValidationIssue,
    fix: Option<TagValue>,
}

impl Finding {
    fn report(issue: ValidationIssue) -> Self {
        Self { issue, fix: None }
    }

    fn fixable(issue: ValidationIssue, fix: TagValue) -> Self {
        Self {
            issue,
            fix: Some(fix),
        }
    }
}

/// Checks `document` against `schema`.
///
/// Under a correcting policy every finding with a known fix is applied and
/// the entry is marked `corrected`; otherwise the document is returned
/// unchanged. Tags without a schema definition pass through unchecked.
pub fn validate(
    mut document: NormalizedDocument,
    schema: &TagSchema,
    structure: &Structure,
    policy: ValidationPolicy,
) -> (NormalizedDocument, Vec<ValidationIssue>) {
    let mut issues = Vec::new();
    let site_count = structure.site_count();

    let tags: Vec<Tag> = document.tags().cloned().collect();
    for tag in tags {
        let Some(definition) = schema.definition(tag.name()) else {
            debug!(tag = %tag, "no definition; passed through unchecked");
            continue;
        };
        let Some(entry) = document.get_mut(tag.name()) else {
            continue;
        };

        for finding in check_value(definition, &entry.value, site_count) {
            match finding.fix {
                Some(value) if policy.correct => {
                    info!(tag = %tag, kind = finding.issue.kind.name(), "applied correction");
                    entry.value = value;
                    entry.provenance = Provenance::Corrected;
                    issues.push(finding.issue.mark_fixed());
                }
                _ => issues.push(finding.issue),
            }
        }
    }

    for rule in schema.rules() {
        apply_rule(rule, &mut document, policy, &mut issues);
    }

    (document, issues)
}

/// Arity and domain checks for one value. Fixes are cumulative: each one
/// is computed from the value as corrected by the findings before it.
fn check_value(definition: &TagDefinition, value: &TagValue, site_count: usize) -> Vec<Finding> {
    let mut findings = Vec::new();
    let value = match conform(definition, value, site_count) {
        Ok(None) => value.clone(),
        Ok(Some(finding)) => {
            let coerced = finding.fix.clone().unwrap_or_else(|| value.clone());
            findings.push(finding);
            coerced
        }
        Err(finding) => {
            findings.push(finding);
            return findings;
        }
    };
    findings.extend(check_domain(definition, &value));
    findings
}

/// Confirms the value has the definition's shape.
///
/// `Ok(None)` means it conforms, `Ok(Some(_))` that it converts
/// unambiguously, and `Err(_)` that it cannot be used as written.
fn conform(
    definition: &TagDefinition,
    value: &TagValue,
    site_count: usize,
) -> Result<Option<Finding>, Finding> {
    let tag = definition.name();
    let expected = definition.arity.name();
    let coerced = |to: TagValue| {
        Finding::fixable(
            ValidationIssue::error(
                tag,
                IssueKind::TypeMismatch,
                format!(
                    "{tag} expects a {expected} value, found {} {}",
                    value.kind_name(),
                    render(value)
                ),
            ),
            to,
        )
    };
    let rejected = || {
        Finding::report(ValidationIssue::error(
            tag,
            IssueKind::TypeMismatch,
            format!("{tag} expects a {expected} value, found {}", value.kind_name()),
        ))
    };

    match (definition.arity, value) {
        (Arity::Boolean, TagValue::Bool(_)) => Ok(None),
        (Arity::Boolean, TagValue::Int(i @ (0 | 1))) => Ok(Some(coerced(TagValue::Bool(*i == 1)))),
        (Arity::Boolean, TagValue::Text(s)) => match parse_bool(s) {
            Some(b) => Ok(Some(coerced(TagValue::Bool(b)))),
            None => Err(rejected()),
        },
        (Arity::Boolean, _) => Err(rejected()),

        (Arity::Scalar, TagValue::Int(_)) => Ok(None),
        (Arity::Scalar, TagValue::Float(f)) if definition.domain.integer => {
            if f.fract() == 0.0 && f.is_finite() {
                Ok(Some(coerced(TagValue::Int(*f as i64))))
            } else {
                Err(Finding::report(ValidationIssue::error(
                    tag,
                    IssueKind::TypeMismatch,
                    format!("{tag} expects an integer, found {f}"),
                )))
            }
        }
        (Arity::Scalar, TagValue::Float(_)) => Ok(None),
        (Arity::Scalar, TagValue::Text(s)) => match parse_number(s, definition.domain.integer) {
            Some(number) => Ok(Some(coerced(number))),
            None => Err(rejected()),
        },
        (Arity::Scalar, _) => Err(rejected()),

        (Arity::Vector3, TagValue::Vector(v)) if v.len() == 3 => Ok(None),
        (Arity::Vector3, TagValue::Text(s)) => {
            let parsed: Option<Vec<f64>> = s.split_whitespace().map(|t| t.parse().ok()).collect();
            match parsed {
                Some(v) if v.len() == 3 => Ok(Some(coerced(TagValue::Vector(v)))),
                _ => Err(rejected()),
            }
        }
        (Arity::Vector3, _) => Err(rejected()),

        (Arity::String, TagValue::Text(_)) => Ok(None),
        (Arity::String, TagValue::Int(i)) => Ok(Some(coerced(TagValue::Text(i.to_string())))),
        (Arity::String, TagValue::Float(f)) => Ok(Some(coerced(TagValue::Text(f.to_string())))),
        (Arity::String, _) => Err(rejected()),

        (Arity::PerSiteScalar | Arity::PerSiteVector3, TagValue::Sites(array)) => {
            conform_sites(definition, array, site_count).map(|_| None)
        }
        (Arity::PerSiteScalar | Arity::PerSiteVector3, _) => Err(rejected()),
    }
}

fn conform_sites(
    definition: &TagDefinition,
    array: &CanonicalSiteArray,
    site_count: usize,
) -> Result<(), Finding> {
    let tag = definition.name();
    if let CanonicalSiteArray::Raw(tokens) = array {
        if tokens.trim().is_empty() {
            return Err(Finding::report(ValidationIssue::error(
                tag,
                IssueKind::OutOfDomain,
                "raw site tokens must not be empty",
            )));
        }
        return Ok(());
    }
    if array.is_vector() && !definition.accepts_vectors() {
        return Err(Finding::report(ValidationIssue::error(
            tag,
            IssueKind::TypeMismatch,
            format!("{tag} takes one number per site"),
        )));
    }
    if !array.is_vector() && definition.requires_vectors() {
        return Err(Finding::report(ValidationIssue::error(
            tag,
            IssueKind::TypeMismatch,
            format!("{tag} takes three components per site"),
        )));
    }
    match array.len() {
        Some(len) if len != site_count => Err(Finding::report(ValidationIssue::error(
            tag,
            IssueKind::OutOfDomain,
            format!("{tag} has {len} values for a structure of {site_count} sites"),
        ))),
        _ => Ok(()),
    }
}

fn check_domain(definition: &TagDefinition, value: &TagValue) -> Vec<Finding> {
    let tag = definition.name();
    let domain = &definition.domain;
    let mut findings = Vec::new();

    match value {
        TagValue::Int(_) | TagValue::Float(_) => {
            let Some(number) = value.as_f64() else {
                return findings;
            };
            if !domain.within_bounds(number) {
                findings.push(Finding::report(ValidationIssue::error(
                    tag,
                    IssueKind::OutOfDomain,
                    format!("{tag} = {} is outside {}", render(value), bounds(definition)),
                )));
            }
            if let TagValue::Int(i) = value {
                if !domain.allows_int(*i) {
                    findings.push(Finding::report(ValidationIssue::error(
                        tag,
                        IssueKind::OutOfDomain,
                        format!(
                            "{tag} = {i} is not one of {}",
                            domain.describe_choices()
                        ),
                    )));
                }
            }
            findings.extend(check_magnitude(definition, &[number]));
        }
        TagValue::Text(text) if !domain.allows_text(text) => {
            let issue = ValidationIssue::error(
                tag,
                IssueKind::OutOfDomain,
                format!("{tag} = {text} is not one of {}", domain.describe_choices()),
            );
            match domain.text_choice_folded(text) {
                Some(choice) => {
                    findings.push(Finding::fixable(issue, TagValue::Text(choice.to_string())))
                }
                None => findings.push(Finding::report(issue)),
            }
        }
        TagValue::Sites(CanonicalSiteArray::Scalars(values)) => {
            let outside: Vec<usize> = values
                .iter()
                .enumerate()
                .filter(|(_, v)| !domain.within_bounds(**v))
                .map(|(i, _)| i)
                .collect();
            if !outside.is_empty() {
                findings.push(Finding::report(ValidationIssue::error(
                    tag,
                    IssueKind::OutOfDomain,
                    format!(
                        "{tag} values at sites {:?} are outside {}",
                        outside,
                        bounds(definition)
                    ),
                )));
            }
            findings.extend(check_magnitude(definition, values));
        }
        TagValue::Sites(array @ CanonicalSiteArray::Vectors(_)) => {
            findings.extend(check_magnitude(definition, &array.flatten()));
        }
        _ => {}
    }
    findings
}

/// Warns once if any nonzero value has an unexpected decimal order.
fn check_magnitude(definition: &TagDefinition, values: &[f64]) -> Option<Finding> {
    let expected = definition.domain.magnitude?;
    let odd = values
        .iter()
        .copied()
        .find(|v| *v != 0.0 && v.abs().log10().floor() as i32 != expected)?;
    let tag = definition.name();
    Some(Finding::report(ValidationIssue::warning(
        tag,
        IssueKind::OutOfDomain,
        format!(
            "{tag} value {odd} is of order 1e{}, expected 1e{expected}",
            odd.abs().log10().floor() as i32
        ),
    )))
}

fn apply_rule(
    rule: &CoherenceRule,
    document: &mut NormalizedDocument,
    policy: ValidationPolicy,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(value) = document.value(rule.tag.name()) else {
        return;
    };
    let triggered = match &rule.when {
        Condition::Present => true,
        Condition::True => matches!(value, TagValue::Bool(true)),
        Condition::Equals(expected) => value.matches(expected),
        Condition::VectorSites => matches!(value, TagValue::Sites(CanonicalSiteArray::Vectors(_))),
        Condition::ScalarSites => matches!(value, TagValue::Sites(CanonicalSiteArray::Scalars(_))),
    };
    if !triggered {
        return;
    }
    let subject = describe_condition(rule);

    let satisfied = rule.requires_any.is_empty()
        || rule
            .requires_any
            .iter()
            .any(|t| {
                document.value(t.name()).is_some_and(|v| match rule.required_value(t) {
                    Some(required) => v.matches(required),
                    None => *v != TagValue::Bool(false),
                })
            });
    if !satisfied {
        let names: Vec<String> = rule.requires_any.iter().map(|t| t.name().to_string()).collect();
        let wanted: Vec<String> = rule
            .requires_any
            .iter()
            .map(|t| match rule.required_value(t) {
                Some(required) => format!("{t} = {}", render(required)),
                None => t.to_string(),
            })
            .collect();
        let message = rule
            .message
            .clone()
            .unwrap_or_else(|| format!("{subject} requires {}", wanted.join(" or ")));
        let issue = ValidationIssue::warning(
            rule.tag.name(),
            IssueKind::MissingCompanion { required: names },
            message,
        );
        match &rule.fix {
            Some((fix_tag, fix_value)) if policy.correct => {
                info!(tag = %rule.tag, companion = %fix_tag, "added missing companion tag");
                document.insert(fix_tag.clone(), fix_value.clone(), Provenance::Corrected);
                issues.push(issue.mark_fixed());
            }
            _ => issues.push(issue),
        }
    }

    for forbidden in &rule.forbids_true {
        if document.value(forbidden.name()) == Some(&TagValue::Bool(true)) {
            let message = rule
                .message
                .clone()
                .unwrap_or_else(|| format!("{subject} conflicts with {forbidden} = .TRUE."));
            issues.push(ValidationIssue::warning(
                rule.tag.name(),
                IssueKind::ConflictingSpecification,
                message,
            ));
        }
    }
}

fn describe_condition(rule: &CoherenceRule) -> String {
    let tag = &rule.tag;
    match &rule.when {
        Condition::Present => tag.to_string(),
        Condition::True => format!("{tag} = .TRUE."),
        Condition::Equals(value) => format!("{tag} = {}", render(value)),
        Condition::VectorSites => format!("three-component {tag}"),
        Condition::ScalarSites => format!("single-component {tag}"),
    }
}

fn bounds(definition: &TagDefinition) -> String {
    match (definition.domain.min, definition.domain.max) {
        (Some(min), Some(max)) => format!("[{min}, {max}]"),
        (Some(min), None) => format!(">= {min}"),
        (None, Some(max)) => format!("<= {max}"),
        (None, None) => "any value".to_string(),
    }
}

fn render(value: &TagValue) -> String {
    match value {
        TagValue::Bool(true) => ".TRUE.".to_string(),
        TagValue::Bool(false) => ".FALSE.".to_string(),
        TagValue::Int(i) => i.to_string(),
        TagValue::Float(f) => f.to_string(),
        TagValue::Text(s) => format!("'{s}'"),
        TagValue::Vector(v) => format!("{v:?}"),
        TagValue::Sites(_) => value.kind_name().to_string(),
    }
}

/// Boolean spellings accepted when correcting.
fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().trim_matches('.').to_ascii_uppercase().as_str() {
        "TRUE" | "T" | "YES" | "ON" => Some(true),
        "FALSE" | "F" | "NO" | "OFF" => Some(false),
        _ => None,
    }
}

fn parse_number(text: &str, integer: bool) -> Option<TagValue> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(TagValue::Int(i));
    }
    let f = text.replace(['d', 'D'], "e").parse::<f64>().ok()?;
    if integer {
        (f.fract() == 0.0 && f.is_finite()).then_some(TagValue::Int(f as i64))
    } else {
        Some(TagValue::Float(f))
    }
}
