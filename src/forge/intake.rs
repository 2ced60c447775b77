//! Turns a raw document into canonical tags.
//!
//! Every key is normalized, entries naming the same canonical tag are
//! grouped (last declaration wins, with a conflict issue), and site tags are
//! resolved against the structure. Keys that name no schema tag are carried
//! through verbatim.

use super::config::ValidationPolicy;
use super::convention::{SitePropertySpec, classify};
use super::error::Error;
use super::normalize::{KeyResolution, normalize_key};
use super::resolve::{ensure_resolvable, resolve_site_property};
use super::schema::TagSchema;
use crate::model::document::{NormalizedDocument, Provenance, RawDocument};
use crate::model::issue::{IssueKind, ValidationIssue};
use crate::model::structure::Structure;
use crate::model::tag::Tag;
use crate::model::value::{RawValue, TagValue};
use std::collections::BTreeMap;
use tracing::debug;

/// A document's entries after key normalization, before resolution.
enum Pending<'a> {
    Sites(Vec<SitePropertySpec>),
    Value(&'a RawValue),
}

struct Declared<'a> {
    key: &'a str,
    provenance: Provenance,
    pending: Pending<'a>,
}

/// Normalizes and resolves one raw document.
///
/// Entries are `explicit`, or `corrected` when their key was a replaced
/// typo. Issues are appended to `issues` in document order, followed by the
/// per-tag conflict and resolution findings in tag order.
pub fn normalize_document(
    raw: &RawDocument,
    schema: &TagSchema,
    structure: &Structure,
    policy: ValidationPolicy,
    issues: &mut Vec<ValidationIssue>,
) -> Result<NormalizedDocument, Error> {
    let mut groups: BTreeMap<Tag, Vec<Declared<'_>>> = BTreeMap::new();

    for (key, value) in raw.iter() {
        let normalized = normalize_key(schema, key, policy);
        issues.extend(normalized.issue);

        let provenance = if normalized.resolution.is_corrected() {
            Provenance::Corrected
        } else {
            Provenance::Explicit
        };
        let resolution = normalized.resolution;
        let site_tag = match &resolution {
            KeyResolution::Unresolved(_) => false,
            resolved => schema
                .definition(resolved.tag().name())
                .is_some_and(|d| d.arity.is_site()),
        };
        let tag = resolution.into_tag();

        let pending = if site_tag {
            let classified = classify(&tag, value, structure);
            issues.extend(classified.issues);
            Pending::Sites(classified.specs)
        } else {
            Pending::Value(value)
        };
        groups.entry(tag).or_default().push(Declared {
            key,
            provenance,
            pending,
        });
    }

    let mut document = NormalizedDocument::new();
    for (tag, declared) in groups {
        let sites = matches!(
            declared.first().map(|d| &d.pending),
            Some(Pending::Sites(_))
        );
        if sites {
            resolve_group(&tag, declared, schema, structure, &mut document, issues)?;
        } else {
            value_group(&tag, declared, schema, &mut document, issues);
        }
    }
    Ok(document)
}

fn resolve_group(
    tag: &Tag,
    declared: Vec<Declared<'_>>,
    schema: &TagSchema,
    structure: &Structure,
    document: &mut NormalizedDocument,
    issues: &mut Vec<ValidationIssue>,
) -> Result<(), Error> {
    let Some(definition) = schema.definition(tag.name()) else {
        return Ok(());
    };

    let mut specs: Vec<(SitePropertySpec, Provenance)> = Vec::new();
    for entry in declared {
        if let Pending::Sites(found) = entry.pending {
            specs.extend(found.into_iter().map(|spec| (spec, entry.provenance)));
        }
    }

    if specs.len() > 1 {
        let conventions: Vec<&str> = specs.iter().map(|(s, _)| s.convention()).collect();
        let last = conventions.last().copied().unwrap_or_default();
        issues.push(ValidationIssue::warning(
            tag.name(),
            IssueKind::ConflictingSpecification,
            format!(
                "{tag} is specified {} times ({}); the last ({last}) is used",
                conventions.len(),
                conventions.join(", ")
            ),
        ));
    }

    let Some((spec, provenance)) = specs.pop() else {
        debug!(tag = %tag, "no site specification; tag omitted");
        return Ok(());
    };
    for (overridden, _) in &specs {
        ensure_resolvable(overridden, definition, structure)?;
    }

    let resolved = resolve_site_property(&spec, definition, structure, schema)?;
    issues.extend(resolved.issues);
    match resolved.array {
        Some(array) => {
            document.insert(tag.clone(), TagValue::Sites(array), provenance);
        }
        None => debug!(tag = %tag, "site property dropped"),
    }
    Ok(())
}

fn value_group(
    tag: &Tag,
    declared: Vec<Declared<'_>>,
    schema: &TagSchema,
    document: &mut NormalizedDocument,
    issues: &mut Vec<ValidationIssue>,
) {
    if declared.len() > 1 {
        let keys: Vec<&str> = declared.iter().map(|d| d.key).collect();
        issues.push(ValidationIssue::warning(
            tag.name(),
            IssueKind::ConflictingSpecification,
            format!(
                "{tag} is set {} times (as {}); the last value is used",
                keys.len(),
                keys.join(", ")
            ),
        ));
    }

    let Some(last) = declared.last() else {
        return;
    };
    let Pending::Value(raw) = last.pending else {
        return;
    };
    match TagValue::from_raw(raw) {
        Some(value) => {
            document.insert(tag.clone(), value, last.provenance);
        }
        // Unknown keys were already reported at normalization.
        None if schema.definition(tag.name()).is_none() => {
            debug!(tag = %tag, kind = raw.kind_name(), "unrepresentable unknown tag dropped");
        }
        None => issues.push(ValidationIssue::error(
            tag.name(),
            IssueKind::TypeMismatch,
            format!("{tag} cannot take a {}", raw.kind_name()),
        )),
    }
}
