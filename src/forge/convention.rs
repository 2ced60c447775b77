//! Classification of raw site-tag values into input conventions.
//!
//! The same per-site property may be written many ways in a document. This
//! module recognizes which [`SitePropertySpec`] a raw value denotes; the
//! [`resolve`](super::resolve) module expands it against a structure.

use crate::model::issue::{IssueKind, ValidationIssue};
use crate::model::structure::Structure;
use crate::model::tag::Tag;
use crate::model::value::{RawValue, SiteValue};

/// Mapping keys that name a convention explicitly.
pub const CONVENTION_KEYS: [&str; 8] = [
    "species",
    "sites",
    "indices",
    "ranges",
    "raw",
    "from_structure",
    "uniform",
    "explicit",
];

/// `{start, stop, step, value}` assigning `value` to the half-open
/// interval `[start, stop)` with stride `step`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeRecord {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
    pub value: SiteValue,
}

/// One way of specifying a per-site property.
#[derive(Debug, Clone, PartialEq)]
pub enum SitePropertySpec {
    /// Species symbol to value.
    BySpecies(Vec<(String, SiteValue)>),
    /// Site label to value.
    BySite(Vec<(String, SiteValue)>),
    /// Site index (base fixed by the schema) to value.
    ByIndex(Vec<(i64, SiteValue)>),
    /// Range records applied in order; later records overwrite.
    Range(Vec<RangeRecord>),
    /// Opaque token sequence passed through verbatim.
    RawString(String),
    /// Read the values from the structure's per-site metadata.
    PoscarDerived,
    /// One value for every site.
    Uniform(SiteValue),
    /// One value per site, positionally.
    Explicit(Vec<SiteValue>),
}

impl SitePropertySpec {
    pub fn convention(&self) -> &'static str {
        match self {
            SitePropertySpec::BySpecies(_) => "species",
            SitePropertySpec::BySite(_) => "sites",
            SitePropertySpec::ByIndex(_) => "indices",
            SitePropertySpec::Range(_) => "ranges",
            SitePropertySpec::RawString(_) => "raw",
            SitePropertySpec::PoscarDerived => "from_structure",
            SitePropertySpec::Uniform(_) => "uniform",
            SitePropertySpec::Explicit(_) => "explicit",
        }
    }

    /// Values written in the document, in declaration order.
    ///
    /// Empty for raw tokens and structure-derived specifications.
    pub fn values(&self) -> Vec<SiteValue> {
        match self {
            SitePropertySpec::BySpecies(entries) | SitePropertySpec::BySite(entries) => {
                entries.iter().map(|(_, v)| *v).collect()
            }
            SitePropertySpec::ByIndex(entries) => entries.iter().map(|(_, v)| *v).collect(),
            SitePropertySpec::Range(records) => records.iter().map(|r| r.value).collect(),
            SitePropertySpec::Uniform(v) => vec![*v],
            SitePropertySpec::Explicit(values) => values.clone(),
            SitePropertySpec::RawString(_) | SitePropertySpec::PoscarDerived => Vec::new(),
        }
    }
}

/// Conventions recognized in one raw value, with any problems found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    pub specs: Vec<SitePropertySpec>,
    pub issues: Vec<ValidationIssue>,
}

/// Recognizes the convention(s) a raw site-tag value is written in.
///
/// A value normally denotes one specification. A mapping keyed by
/// convention names (`species`, `indices`, ...) yields one per key in
/// declaration order. Malformed values produce a `TypeMismatch` issue and
/// no specification. `false` yields neither.
pub fn classify(tag: &Tag, raw: &RawValue, structure: &Structure) -> Classified {
    let mut out = Classified::default();
    match raw {
        RawValue::Map(entries) if is_convention_map(entries) => {
            for (key, value) in entries {
                let name = key.trim().to_ascii_lowercase();
                if let Some(result) = classify_named(tag, &name, value, structure) {
                    push(&mut out, result);
                }
            }
        }
        other => {
            if let Some(result) = classify_shape(tag, other, structure) {
                push(&mut out, result);
            }
        }
    }
    out
}

fn push(out: &mut Classified, result: Result<SitePropertySpec, ValidationIssue>) {
    match result {
        Ok(spec) => out.specs.push(spec),
        Err(issue) => out.issues.push(issue),
    }
}

fn is_convention_map(entries: &[(String, RawValue)]) -> bool {
    !entries.is_empty()
        && entries.iter().all(|(key, _)| {
            let key = key.trim().to_ascii_lowercase();
            CONVENTION_KEYS.contains(&key.as_str())
        })
}

type Outcome = Option<Result<SitePropertySpec, ValidationIssue>>;

fn classify_shape(tag: &Tag, raw: &RawValue, structure: &Structure) -> Outcome {
    match raw {
        RawValue::Bool(true) => Some(Ok(SitePropertySpec::PoscarDerived)),
        RawValue::Bool(false) => None,
        RawValue::Int(_) | RawValue::Float(_) => Some(uniform(tag, raw)),
        RawValue::Str(tokens) => Some(Ok(SitePropertySpec::RawString(tokens.trim().to_string()))),
        RawValue::List(items) if !items.is_empty() && items.iter().all(is_range_record) => {
            Some(ranges(tag, items))
        }
        RawValue::List(items) => Some(explicit(tag, items)),
        RawValue::Map(entries) => Some(keyed(tag, entries, structure)),
    }
}

fn classify_named(tag: &Tag, name: &str, raw: &RawValue, structure: &Structure) -> Outcome {
    let result = match name {
        "species" => mapping(tag, raw).and_then(|entries| by_species(tag, entries)),
        "sites" => mapping(tag, raw).and_then(|entries| by_site(tag, entries)),
        "indices" => mapping(tag, raw).and_then(|entries| by_index(tag, entries)),
        "ranges" => match raw {
            RawValue::List(items) => ranges(tag, items),
            other => Err(mismatch(tag, "a list of range records", other)),
        },
        "raw" => match raw {
            RawValue::Str(tokens) => Ok(SitePropertySpec::RawString(tokens.trim().to_string())),
            other => Err(mismatch(tag, "a token string", other)),
        },
        "from_structure" => match raw {
            RawValue::Bool(true) => Ok(SitePropertySpec::PoscarDerived),
            RawValue::Bool(false) => return None,
            other => Err(mismatch(tag, "a boolean", other)),
        },
        "uniform" => uniform(tag, raw),
        "explicit" => match raw {
            RawValue::List(items) => explicit(tag, items),
            other => Err(mismatch(tag, "a list of per-site values", other)),
        },
        _ => return classify_shape(tag, raw, structure),
    };
    Some(result)
}

/// Picks the convention of a plain mapping from its keys.
fn keyed(
    tag: &Tag,
    entries: &[(String, RawValue)],
    structure: &Structure,
) -> Result<SitePropertySpec, ValidationIssue> {
    if entries.iter().all(|(key, _)| key.trim().parse::<i64>().is_ok()) {
        return by_index(tag, entries);
    }
    let labels_only = entries.iter().all(|(key, _)| {
        let key = key.trim();
        structure.has_label(key) && !structure.has_species(key)
    });
    if labels_only {
        by_site(tag, entries)
    } else {
        by_species(tag, entries)
    }
}

fn mapping<'a>(tag: &Tag, raw: &'a RawValue) -> Result<&'a [(String, RawValue)], ValidationIssue> {
    match raw {
        RawValue::Map(entries) => Ok(entries),
        other => Err(mismatch(tag, "a mapping", other)),
    }
}

fn by_species(
    tag: &Tag,
    entries: &[(String, RawValue)],
) -> Result<SitePropertySpec, ValidationIssue> {
    labelled(tag, entries).map(SitePropertySpec::BySpecies)
}

fn by_site(tag: &Tag, entries: &[(String, RawValue)]) -> Result<SitePropertySpec, ValidationIssue> {
    labelled(tag, entries).map(SitePropertySpec::BySite)
}

fn labelled(
    tag: &Tag,
    entries: &[(String, RawValue)],
) -> Result<Vec<(String, SiteValue)>, ValidationIssue> {
    entries
        .iter()
        .map(|(key, value)| -> Result<_, ValidationIssue> {
            Ok((key.trim().to_string(), site_value(tag, value)?))
        })
        .collect()
}

fn by_index(tag: &Tag, entries: &[(String, RawValue)]) -> Result<SitePropertySpec, ValidationIssue> {
    entries
        .iter()
        .map(|(key, value)| -> Result<_, ValidationIssue> {
            let index = key.trim().parse::<i64>().map_err(|_| {
                ValidationIssue::error(
                    tag.name(),
                    IssueKind::TypeMismatch,
                    format!("site index '{key}' is not an integer"),
                )
            })?;
            Ok((index, site_value(tag, value)?))
        })
        .collect::<Result<_, _>>()
        .map(SitePropertySpec::ByIndex)
}

fn uniform(tag: &Tag, raw: &RawValue) -> Result<SitePropertySpec, ValidationIssue> {
    site_value(tag, raw).map(SitePropertySpec::Uniform)
}

fn explicit(tag: &Tag, items: &[RawValue]) -> Result<SitePropertySpec, ValidationIssue> {
    items
        .iter()
        .map(|item| site_value(tag, item))
        .collect::<Result<_, _>>()
        .map(SitePropertySpec::Explicit)
}

fn is_range_record(raw: &RawValue) -> bool {
    raw.get("start").is_some() && raw.get("stop").is_some()
}

fn ranges(tag: &Tag, items: &[RawValue]) -> Result<SitePropertySpec, ValidationIssue> {
    items
        .iter()
        .map(|item| range_record(tag, item))
        .collect::<Result<_, _>>()
        .map(SitePropertySpec::Range)
}

fn range_record(tag: &Tag, raw: &RawValue) -> Result<RangeRecord, ValidationIssue> {
    let bound = |field: &str, required: bool| -> Result<Option<i64>, ValidationIssue> {
        match raw.get(field) {
            Some(value) => value.as_i64().map(Some).ok_or_else(|| {
                mismatch(tag, &format!("an integer range `{field}`"), value)
            }),
            None if required => Err(ValidationIssue::error(
                tag.name(),
                IssueKind::TypeMismatch,
                format!("range record is missing `{field}`"),
            )),
            None => Ok(None),
        }
    };
    let start = bound("start", true)?.unwrap_or_default();
    let stop = bound("stop", true)?.unwrap_or_default();
    let step = bound("step", false)?.unwrap_or(1);
    let value = match raw.get("value") {
        Some(value) => site_value(tag, value)?,
        None => {
            return Err(ValidationIssue::error(
                tag.name(),
                IssueKind::TypeMismatch,
                "range record is missing `value`",
            ));
        }
    };
    Ok(RangeRecord {
        start,
        stop,
        step,
        value,
    })
}

fn site_value(tag: &Tag, raw: &RawValue) -> Result<SiteValue, ValidationIssue> {
    raw.as_site_value()
        .ok_or_else(|| mismatch(tag, "a number or a three-component vector", raw))
}

fn mismatch(tag: &Tag, expected: &str, found: &RawValue) -> ValidationIssue {
    let found = match found {
        RawValue::List(items) => format!("a list of {} items", items.len()),
        other => format!("a {}", other.kind_name()),
    };
    ValidationIssue::error(
        tag.name(),
        IssueKind::TypeMismatch,
        format!("expected {expected}, found {found}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::structure::Site;

    fn perovskite() -> Structure {
        Structure::from_sites(vec![
            Site::new("Ca", [0.0, 0.0, 0.0]).with_label("Ca1"),
            Site::new("Ti", [0.5, 0.5, 0.5]).with_label("Ti1"),
            Site::new("O", [0.5, 0.5, 0.0]).with_label("O1"),
            Site::new("O", [0.5, 0.0, 0.5]).with_label("O2"),
            Site::new("O", [0.0, 0.5, 0.5]).with_label("O3"),
        ])
    }

    fn map(entries: &[(&str, RawValue)]) -> RawValue {
        RawValue::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn single(raw: RawValue) -> SitePropertySpec {
        let mut out = classify(&Tag::new("MAGMOM"), &raw, &perovskite());
        assert!(out.issues.is_empty(), "unexpected issues: {:?}", out.issues);
        assert_eq!(out.specs.len(), 1);
        out.specs.remove(0)
    }

    #[test]
    fn scalars_strings_and_booleans() {
        assert_eq!(
            single(RawValue::Float(2.0)),
            SitePropertySpec::Uniform(SiteValue::Scalar(2.0))
        );
        assert_eq!(
            single(RawValue::Str(" 1*0.0 4*2.0 ".into())),
            SitePropertySpec::RawString("1*0.0 4*2.0".into())
        );
        assert_eq!(single(RawValue::Bool(true)), SitePropertySpec::PoscarDerived);

        let none = classify(&Tag::new("MAGMOM"), &RawValue::Bool(false), &perovskite());
        assert!(none.specs.is_empty() && none.issues.is_empty());
    }

    #[test]
    fn mapping_keys_select_the_convention() {
        let species = single(map(&[("Ti", RawValue::Float(2.0))]));
        assert_eq!(species.convention(), "species");

        let indices = single(map(&[("1", RawValue::Float(2.0)), ("4", RawValue::Int(1))]));
        assert_eq!(
            indices,
            SitePropertySpec::ByIndex(vec![
                (1, SiteValue::Scalar(2.0)),
                (4, SiteValue::Scalar(1.0))
            ])
        );

        let sites = single(map(&[("Ti1", RawValue::Float(2.0))]));
        assert_eq!(sites.convention(), "sites");
    }

    #[test]
    fn list_of_range_records_is_a_range() {
        let record = map(&[
            ("start", RawValue::Int(0)),
            ("stop", RawValue::Int(5)),
            ("step", RawValue::Int(2)),
            ("value", RawValue::Float(1.5)),
        ]);
        let spec = single(RawValue::List(vec![record]));
        assert_eq!(
            spec,
            SitePropertySpec::Range(vec![RangeRecord {
                start: 0,
                stop: 5,
                step: 2,
                value: SiteValue::Scalar(1.5),
            }])
        );
    }

    #[test]
    fn range_step_defaults_to_one() {
        let record = map(&[
            ("start", RawValue::Int(1)),
            ("stop", RawValue::Int(3)),
            ("value", RawValue::Int(2)),
        ]);
        match single(RawValue::List(vec![record])) {
            SitePropertySpec::Range(records) => assert_eq!(records[0].step, 1),
            other => panic!("expected a range, got {other:?}"),
        }
    }

    #[test]
    fn convention_map_yields_one_spec_per_key() {
        let raw = map(&[
            ("species", map(&[("Ti", RawValue::Float(2.0))])),
            ("indices", map(&[("0", RawValue::Float(1.0))])),
        ]);
        let out = classify(&Tag::new("MAGMOM"), &raw, &perovskite());
        let names: Vec<_> = out.specs.iter().map(SitePropertySpec::convention).collect();
        assert_eq!(names, vec!["species", "indices"]);
    }

    #[test]
    fn malformed_values_are_type_mismatches() {
        let pair = RawValue::List(vec![RawValue::Int(1), RawValue::Int(2)]);
        let out = classify(
            &Tag::new("MAGMOM"),
            &map(&[("Ti", pair)]),
            &perovskite(),
        );
        assert!(out.specs.is_empty());
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].kind, IssueKind::TypeMismatch);
        assert!(out.issues[0].message.contains("list of 2 items"));

        let missing_value = map(&[("start", RawValue::Int(0)), ("stop", RawValue::Int(2))]);
        let out = classify(
            &Tag::new("MAGMOM"),
            &RawValue::List(vec![missing_value]),
            &perovskite(),
        );
        assert_eq!(out.issues[0].kind, IssueKind::TypeMismatch);
    }

    #[test]
    fn explicit_lists_accept_vectors() {
        let vectors = RawValue::List(vec![
            RawValue::List(vec![RawValue::Int(0), RawValue::Int(0), RawValue::Int(1)]),
            RawValue::Float(0.0),
        ]);
        assert_eq!(
            single(vectors),
            SitePropertySpec::Explicit(vec![
                SiteValue::Vector([0.0, 0.0, 1.0]),
                SiteValue::Scalar(0.0)
            ])
        );
    }
}
