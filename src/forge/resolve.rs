use super::convention::{RangeRecord, SitePropertySpec};
use super::error::Error;
use super::schema::{TagDefinition, TagSchema};
use crate::model::issue::{IssueKind, ValidationIssue};
use crate::model::structure::Structure;
use crate::model::value::{CanonicalSiteArray, SiteValue};
use tracing::{debug, warn};

/// Outcome of resolving one site-property specification.
///
/// `array` is `None` when the specification cannot yield an array but the
/// problem is not fatal; the reason is among `issues`.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub array: Option<CanonicalSiteArray>,
    pub issues: Vec<ValidationIssue>,
}

impl Resolved {
    fn dropped(mut issues: Vec<ValidationIssue>, issue: ValidationIssue) -> Self {
        issues.push(issue);
        Self {
            array: None,
            issues,
        }
    }
}

/// Checks the conditions that abort resolution without building an array.
///
/// Used on specifications that are overridden by a later one for the same
/// tag, so a fatal problem is never hidden by the override.
///
/// # Errors
///
/// Returns [`Error::RangeOutOfBounds`] for a range reaching past the last
/// site and [`Error::MissingRequiredData`] for a structure-derived property
/// whose column is missing.
pub fn ensure_resolvable(
    spec: &SitePropertySpec,
    definition: &TagDefinition,
    structure: &Structure,
) -> Result<(), Error> {
    let tag = definition.name();
    match spec {
        SitePropertySpec::Range(records) => records
            .iter()
            .try_for_each(|record| range_within(tag, record, structure.site_count())),
        SitePropertySpec::PoscarDerived => {
            let column = definition.column_name();
            match structure.column(&column) {
                Some(_) => Ok(()),
                None => Err(Error::missing_required_data(tag, &column)),
            }
        }
        _ => Ok(()),
    }
}

/// Expands `spec` into an array aligned with `structure`'s site order.
///
/// Sites the specification leaves unset receive the definition's default.
/// Lookups are driven by structure order, so the result never depends on
/// the order of mapping keys. Entries that match no site are reported and
/// take no part in deciding the element width.
///
/// # Errors
///
/// Fails when the array cannot be built at all: an empty structure, a range
/// reaching past the last site, or a structure-derived property whose
/// column is missing.
pub fn resolve_site_property(
    spec: &SitePropertySpec,
    definition: &TagDefinition,
    structure: &Structure,
    schema: &TagSchema,
) -> Result<Resolved, Error> {
    if structure.is_empty() {
        return Err(Error::EmptyStructure);
    }
    ensure_resolvable(spec, definition, structure)?;

    let tag = definition.name();
    let n = structure.site_count();
    let base = schema.index_base() as i64;
    let mut issues = dead_entries(spec, tag, structure, base);

    let values = match spec {
        SitePropertySpec::PoscarDerived => {
            let column = definition.column_name();
            let values = structure
                .column(&column)
                .ok_or_else(|| Error::missing_required_data(tag, &column))?;
            debug!(tag, column = %column, "reading site property from structure");
            values
        }
        SitePropertySpec::Explicit(items) => {
            regroup_flat(items, definition, n).unwrap_or_else(|| items.clone())
        }
        _ => landing_values(spec, structure, base),
    };

    let vector = definition.requires_vectors() || values.iter().any(SiteValue::is_vector);
    if vector && !definition.accepts_vectors() {
        return Ok(Resolved::dropped(
            issues,
            ValidationIssue::error(
                tag,
                IssueKind::TypeMismatch,
                format!("{tag} takes one number per site, but three-component values were given"),
            ),
        ));
    }
    let lift = |value: SiteValue| fit(value, vector, definition.broadcast_axis);
    if values.iter().any(|v| lift(*v).is_none()) {
        let detail = if definition.requires_vectors() {
            format!("{tag} takes three components per site and defines no broadcast axis for single numbers")
        } else {
            format!("{tag} mixes single numbers and three-component values")
        };
        return Ok(Resolved::dropped(
            issues,
            ValidationIssue::error(tag, IssueKind::TypeMismatch, detail),
        ));
    }

    let mut sites = vec![definition.site_default(vector); n];
    let mut assigned: Vec<Option<SiteValue>> = vec![None; n];

    let mut assign = |index: usize, value: SiteValue, key: &str, issues: &mut Vec<ValidationIssue>| {
        if let Some(value) = lift(value) {
            if let Some(previous) = assigned[index] {
                if previous != value {
                    issues.push(ValidationIssue::warning(
                        tag,
                        IssueKind::ConflictingSpecification,
                        format!(
                            "site {index} is assigned both {previous} and {value} (via '{key}'); the last one is used"
                        ),
                    ));
                }
            }
            assigned[index] = Some(value);
            sites[index] = value;
        }
    };

    match spec {
        SitePropertySpec::BySpecies(entries) => {
            for (species, value) in entries {
                for (index, site) in structure.sites.iter().enumerate() {
                    if site.species == *species {
                        assign(index, *value, species.as_str(), &mut issues);
                    }
                }
            }
        }
        SitePropertySpec::BySite(entries) => {
            for (label, value) in entries {
                if let Some(index) = structure.site_index(label) {
                    assign(index, *value, label.as_str(), &mut issues);
                }
            }
        }
        SitePropertySpec::ByIndex(entries) => {
            for (key, value) in entries {
                if let Some(index) = site_slot(*key, base, n) {
                    assign(index, *value, &key.to_string(), &mut issues);
                }
            }
        }
        SitePropertySpec::Range(records) => {
            for record in records {
                if let Some(indices) = range_indices(tag, record, &mut issues) {
                    for index in indices {
                        if let Some(value) = lift(record.value) {
                            sites[index] = value;
                        }
                    }
                }
            }
        }
        SitePropertySpec::Uniform(value) => {
            if let Some(value) = lift(*value) {
                sites.fill(value);
            }
        }
        SitePropertySpec::Explicit(_) => {
            if values.len() != n {
                return Ok(Resolved::dropped(
                    issues,
                    ValidationIssue::error(
                        tag,
                        IssueKind::OutOfDomain,
                        format!("{tag} lists {} values for a structure of {n} sites", values.len()),
                    ),
                ));
            }
            for (slot, value) in sites.iter_mut().zip(values) {
                if let Some(value) = lift(value) {
                    *slot = value;
                }
            }
        }
        SitePropertySpec::PoscarDerived => {
            for (slot, value) in sites.iter_mut().zip(values) {
                if let Some(value) = lift(value) {
                    *slot = value;
                }
            }
        }
        SitePropertySpec::RawString(tokens) => return Ok(resolve_raw(tag, tokens)),
    }

    debug!(
        tag,
        convention = spec.convention(),
        sites = n,
        vector,
        "resolved site property"
    );
    Ok(Resolved {
        array: Some(into_array(&sites, vector)),
        issues,
    })
}

fn resolve_raw(tag: &str, tokens: &str) -> Resolved {
    if tokens.trim().is_empty() {
        return Resolved::dropped(
            Vec::new(),
            ValidationIssue::error(tag, IssueKind::OutOfDomain, "raw site tokens must not be empty"),
        );
    }
    debug!(tag, "passing raw site tokens through");
    Resolved {
        array: Some(CanonicalSiteArray::Raw(tokens.trim().to_string())),
        issues: Vec::new(),
    }
}

/// Position of an index key in the structure, if it names a site.
fn site_slot(key: i64, base: i64, n: usize) -> Option<usize> {
    let index = key - base;
    (0..n as i64).contains(&index).then_some(index as usize)
}

/// Findings for keyed entries that match no site.
fn dead_entries(
    spec: &SitePropertySpec,
    tag: &str,
    structure: &Structure,
    base: i64,
) -> Vec<ValidationIssue> {
    let n = structure.site_count();
    match spec {
        SitePropertySpec::BySpecies(entries) => entries
            .iter()
            .filter(|(species, _)| !structure.has_species(species))
            .map(|(species, _)| {
                warn!(tag, species = %species, "species not present in structure");
                ValidationIssue::warning(
                    tag,
                    IssueKind::OutOfDomain,
                    format!("species '{species}' does not occur in the structure and is ignored"),
                )
            })
            .collect(),
        SitePropertySpec::BySite(entries) => entries
            .iter()
            .filter(|(label, _)| structure.site_index(label).is_none())
            .map(|(label, _)| {
                warn!(tag, label = %label, "site label not present in structure");
                ValidationIssue::warning(
                    tag,
                    IssueKind::OutOfDomain,
                    format!("site label '{label}' does not occur in the structure and is ignored"),
                )
            })
            .collect(),
        SitePropertySpec::ByIndex(entries) => entries
            .iter()
            .filter(|(key, _)| site_slot(*key, base, n).is_none())
            .map(|(key, _)| {
                ValidationIssue::error(
                    tag,
                    IssueKind::OutOfDomain,
                    format!(
                        "site index {key} is outside the structure's {n} sites (indices start at {base})"
                    ),
                )
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Written values that will be assigned to at least one site.
fn landing_values(spec: &SitePropertySpec, structure: &Structure, base: i64) -> Vec<SiteValue> {
    let n = structure.site_count();
    match spec {
        SitePropertySpec::BySpecies(entries) => entries
            .iter()
            .filter(|(species, _)| structure.has_species(species))
            .map(|(_, value)| *value)
            .collect(),
        SitePropertySpec::BySite(entries) => entries
            .iter()
            .filter(|(label, _)| structure.site_index(label).is_some())
            .map(|(_, value)| *value)
            .collect(),
        SitePropertySpec::ByIndex(entries) => entries
            .iter()
            .filter(|(key, _)| site_slot(*key, base, n).is_some())
            .map(|(_, value)| *value)
            .collect(),
        SitePropertySpec::Range(records) => records
            .iter()
            .filter(|r| r.start >= 0 && r.step >= 1 && r.start < r.stop)
            .map(|r| r.value)
            .collect(),
        other => other.values(),
    }
}

fn range_within(tag: &str, record: &RangeRecord, n: usize) -> Result<(), Error> {
    if record.stop > n as i64 {
        return Err(Error::range_out_of_bounds(tag, record.start, record.stop, n));
    }
    Ok(())
}

/// Indices touched by one range record, or `None` if the record is skipped.
///
/// The record must already be within bounds.
fn range_indices(
    tag: &str,
    record: &RangeRecord,
    issues: &mut Vec<ValidationIssue>,
) -> Option<impl Iterator<Item = usize>> {
    let RangeRecord {
        start, stop, step, ..
    } = *record;
    if step < 1 || start < 0 {
        issues.push(ValidationIssue::error(
            tag,
            IssueKind::OutOfDomain,
            format!("range [{start}, {stop}) with step {step} needs start >= 0 and step >= 1; skipped"),
        ));
        return None;
    }
    if start >= stop {
        debug!(tag, start, stop, "empty range");
    }
    Some((start as usize..stop.max(start) as usize).step_by(step as usize))
}

/// A flat numeric list of three numbers per site for a vector-only tag.
fn regroup_flat(items: &[SiteValue], definition: &TagDefinition, n: usize) -> Option<Vec<SiteValue>> {
    if !definition.requires_vectors() || items.len() != 3 * n || items.iter().any(SiteValue::is_vector) {
        return None;
    }
    let flat: Vec<f64> = items.iter().flat_map(|v| v.components().to_vec()).collect();
    Some(
        flat.chunks_exact(3)
            .map(|c| SiteValue::Vector([c[0], c[1], c[2]]))
            .collect(),
    )
}

fn fit(value: SiteValue, vector: bool, axis: Option<usize>) -> Option<SiteValue> {
    match (value, vector) {
        (SiteValue::Scalar(_), false) | (SiteValue::Vector(_), true) => Some(value),
        (SiteValue::Scalar(s), true) => axis.map(|axis| {
            let mut v = [0.0; 3];
            v[axis] = s;
            SiteValue::Vector(v)
        }),
        (SiteValue::Vector(_), false) => None,
    }
}

fn into_array(sites: &[SiteValue], vector: bool) -> CanonicalSiteArray {
    let flat: Vec<f64> = sites.iter().flat_map(|v| v.components().to_vec()).collect();
    if vector {
        CanonicalSiteArray::Vectors(
            flat.chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
        )
    } else {
        CanonicalSiteArray::Scalars(flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::structure::Site;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn perovskite() -> Structure {
        Structure::from_sites(vec![
            Site::new("Ca", [0.0, 0.0, 0.0]).with_label("Ca1"),
            Site::new("Ti", [0.5, 0.5, 0.5]).with_label("Ti1"),
            Site::new("O", [0.5, 0.5, 0.0]).with_label("O1"),
            Site::new("O", [0.5, 0.0, 0.5]).with_label("O2"),
            Site::new("O", [0.0, 0.5, 0.5]).with_label("O3"),
        ])
    }

    fn fluorite() -> Structure {
        let mut sites = Vec::new();
        for i in 0..4 {
            sites.push(Site::new("Ca", [0.0, 0.5 * i as f64, 0.0]));
        }
        for i in 0..8 {
            sites.push(Site::new("F", [0.25, 0.25, 0.125 * i as f64]));
        }
        Structure::from_sites(sites)
    }

    fn schema() -> &'static TagSchema {
        TagSchema::builtin()
    }

    fn definition(name: &str) -> &'static TagDefinition {
        schema().definition(name).unwrap()
    }

    fn resolve(spec: &SitePropertySpec, tag: &str, structure: &Structure) -> Resolved {
        resolve_site_property(spec, definition(tag), structure, schema()).unwrap()
    }

    fn scalars(resolved: &Resolved) -> Vec<f64> {
        match &resolved.array {
            Some(CanonicalSiteArray::Scalars(v)) => v.clone(),
            other => panic!("expected scalars, got {other:?}"),
        }
    }

    #[test]
    fn by_species_fills_unlisted_species_with_default() {
        let spec = SitePropertySpec::BySpecies(vec![("Ti".into(), SiteValue::Scalar(2.0))]);
        let resolved = resolve(&spec, "MAGMOM", &perovskite());
        assert_eq!(scalars(&resolved), vec![0.0, 2.0, 0.0, 0.0, 0.0]);
        assert!(resolved.issues.is_empty());
    }

    #[test]
    fn dead_species_are_warned_but_do_not_block() {
        let spec = SitePropertySpec::BySpecies(vec![
            ("Fe".into(), SiteValue::Scalar(5.0)),
            ("Ti".into(), SiteValue::Scalar(2.0)),
        ]);
        let resolved = resolve(&spec, "MAGMOM", &perovskite());
        assert_eq!(scalars(&resolved), vec![0.0, 2.0, 0.0, 0.0, 0.0]);
        assert_eq!(resolved.issues.len(), 1);
        assert_eq!(
            resolved.issues[0].severity,
            crate::model::issue::Severity::Warning
        );
    }

    #[test]
    fn dead_vector_entry_does_not_widen_or_drop() {
        let spec = SitePropertySpec::BySpecies(vec![
            ("Ca".into(), SiteValue::Scalar(2.0)),
            ("Fe".into(), SiteValue::Vector([0.0, 0.0, 1.0])),
        ]);
        let resolved = resolve(&spec, "MAGMOM", &fluorite());
        let mut expected = vec![2.0; 4];
        expected.extend([0.0; 8]);
        assert_eq!(scalars(&resolved), expected);
        assert_eq!(resolved.issues.len(), 1);
        assert_eq!(resolved.issues[0].kind, IssueKind::OutOfDomain);
        assert!(resolved.issues[0].message.contains("'Fe'"));
    }

    #[test]
    fn dead_entries_are_reported_even_when_the_tag_is_dropped() {
        let spec = SitePropertySpec::BySpecies(vec![
            ("Ca".into(), SiteValue::Scalar(2.0)),
            ("F".into(), SiteValue::Vector([0.0, 0.0, 1.0])),
            ("Fe".into(), SiteValue::Scalar(1.0)),
        ]);
        let resolved = resolve(&spec, "MAGMOM", &fluorite());
        assert!(resolved.array.is_none());
        let kinds: Vec<_> = resolved.issues.iter().map(|i| i.kind.name()).collect();
        assert_eq!(kinds, vec!["OutOfDomain", "TypeMismatch"]);
    }

    #[test]
    fn out_of_range_index_value_is_ignored_for_width() {
        let spec = SitePropertySpec::ByIndex(vec![
            (0, SiteValue::Scalar(1.0)),
            (9, SiteValue::Vector([1.0, 0.0, 0.0])),
        ]);
        let resolved = resolve(&spec, "MAGMOM", &perovskite());
        assert_eq!(scalars(&resolved), vec![1.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(resolved.issues[0].is_blocking());
    }

    #[test]
    fn overridden_specs_are_checked_for_fatal_conditions() {
        let range = SitePropertySpec::Range(vec![RangeRecord {
            start: 0,
            stop: 13,
            step: 1,
            value: SiteValue::Scalar(1.0),
        }]);
        let result = ensure_resolvable(&range, definition("MAGMOM"), &fluorite());
        assert!(matches!(result, Err(Error::RangeOutOfBounds { stop: 13, .. })));

        let derived = ensure_resolvable(&SitePropertySpec::PoscarDerived, definition("MAGMOM"), &fluorite());
        assert!(matches!(derived, Err(Error::MissingRequiredData { .. })));

        let uniform = SitePropertySpec::Uniform(SiteValue::Scalar(1.0));
        assert!(ensure_resolvable(&uniform, definition("MAGMOM"), &fluorite()).is_ok());
    }

    #[test]
    fn ldaul_default_fills_unset_sites() {
        let spec = SitePropertySpec::BySpecies(vec![("Ti".into(), SiteValue::Scalar(2.0))]);
        let resolved = resolve(&spec, "LDAUL", &perovskite());
        assert_eq!(scalars(&resolved), vec![-1.0, 2.0, -1.0, -1.0, -1.0]);
    }

    #[test]
    fn duplicate_index_keys_conflict_and_last_wins() {
        let spec = SitePropertySpec::ByIndex(vec![
            (1, SiteValue::Scalar(2.0)),
            (1, SiteValue::Scalar(3.0)),
            (4, SiteValue::Scalar(1.0)),
        ]);
        let resolved = resolve(&spec, "MAGMOM", &perovskite());
        assert_eq!(scalars(&resolved), vec![0.0, 3.0, 0.0, 0.0, 1.0]);
        assert_eq!(resolved.issues.len(), 1);
        assert_eq!(resolved.issues[0].kind, IssueKind::ConflictingSpecification);
    }

    #[test]
    fn index_outside_structure_is_skipped_with_error() {
        let spec = SitePropertySpec::ByIndex(vec![(7, SiteValue::Scalar(2.0))]);
        let resolved = resolve(&spec, "MAGMOM", &perovskite());
        assert_eq!(scalars(&resolved), vec![0.0; 5]);
        assert_eq!(resolved.issues[0].kind, IssueKind::OutOfDomain);
        assert!(resolved.issues[0].is_blocking());
    }

    #[test]
    fn by_site_resolves_labels() {
        let spec = SitePropertySpec::BySite(vec![
            ("Ti1".into(), SiteValue::Scalar(2.0)),
            ("O3".into(), SiteValue::Scalar(-1.0)),
        ]);
        let resolved = resolve(&spec, "MAGMOM", &perovskite());
        assert_eq!(scalars(&resolved), vec![0.0, 2.0, 0.0, 0.0, -1.0]);
    }

    #[test]
    fn interleaved_vector_ranges_alternate() {
        let spec = SitePropertySpec::Range(vec![
            RangeRecord {
                start: 0,
                stop: 12,
                step: 2,
                value: SiteValue::Vector([0.0, 0.0, 1.0]),
            },
            RangeRecord {
                start: 1,
                stop: 12,
                step: 2,
                value: SiteValue::Vector([0.0, 0.0, -1.0]),
            },
        ]);
        let resolved = resolve(&spec, "MAGMOM", &fluorite());
        match resolved.array {
            Some(CanonicalSiteArray::Vectors(v)) => {
                assert_eq!(v.len(), 12);
                for (i, m) in v.iter().enumerate() {
                    let expected = if i % 2 == 0 { 1.0 } else { -1.0 };
                    assert!(approx_eq(m[2], expected));
                    assert!(approx_eq(m[0], 0.0) && approx_eq(m[1], 0.0));
                }
            }
            other => panic!("expected vectors, got {other:?}"),
        }
    }

    #[test]
    fn later_ranges_overwrite_earlier_ones() {
        let spec = SitePropertySpec::Range(vec![
            RangeRecord {
                start: 0,
                stop: 12,
                step: 1,
                value: SiteValue::Scalar(2.0),
            },
            RangeRecord {
                start: 4,
                stop: 12,
                step: 1,
                value: SiteValue::Scalar(0.0),
            },
        ]);
        let resolved = resolve(&spec, "MAGMOM", &fluorite());
        let values = scalars(&resolved);
        assert_eq!(&values[..4], &[2.0; 4]);
        assert_eq!(&values[4..], &[0.0; 8]);
        assert!(resolved.issues.is_empty());
    }

    #[test]
    fn range_past_last_site_is_fatal() {
        let spec = SitePropertySpec::Range(vec![RangeRecord {
            start: 0,
            stop: 13,
            step: 1,
            value: SiteValue::Scalar(1.0),
        }]);
        let result = resolve_site_property(&spec, definition("MAGMOM"), &fluorite(), schema());
        assert!(matches!(
            result,
            Err(Error::RangeOutOfBounds {
                stop: 13,
                site_count: 12,
                ..
            })
        ));
    }

    #[test]
    fn bad_step_skips_record_and_empty_range_is_a_no_op() {
        let spec = SitePropertySpec::Range(vec![
            RangeRecord {
                start: 0,
                stop: 5,
                step: 0,
                value: SiteValue::Scalar(1.0),
            },
            RangeRecord {
                start: 3,
                stop: 2,
                step: 1,
                value: SiteValue::Scalar(1.0),
            },
        ]);
        let resolved = resolve(&spec, "MAGMOM", &perovskite());
        assert_eq!(scalars(&resolved), vec![0.0; 5]);
        assert_eq!(resolved.issues.len(), 1);
        assert_eq!(resolved.issues[0].kind, IssueKind::OutOfDomain);
    }

    #[test]
    fn structure_column_is_required_for_derived_values() {
        let structure = perovskite();
        let result = resolve_site_property(
            &SitePropertySpec::PoscarDerived,
            definition("MAGMOM"),
            &structure,
            schema(),
        );
        assert!(matches!(result, Err(Error::MissingRequiredData { .. })));

        let mut structure = perovskite();
        for (i, site) in structure.sites.iter_mut().enumerate() {
            site.properties
                .insert("magmom".into(), SiteValue::Scalar(i as f64));
        }
        let resolved = resolve(&SitePropertySpec::PoscarDerived, "MAGMOM", &structure);
        assert_eq!(scalars(&resolved), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn uniform_scalar_on_vector_tag_uses_broadcast_axis() {
        let spec = SitePropertySpec::Uniform(SiteValue::Scalar(1.5));
        let resolved = resolve(&spec, "M_CONSTR", &perovskite());
        assert_eq!(
            resolved.array,
            Some(CanonicalSiteArray::Vectors(vec![[0.0, 0.0, 1.5]; 5]))
        );
    }

    #[test]
    fn vector_values_rejected_for_scalar_only_tags() {
        let spec = SitePropertySpec::Uniform(SiteValue::Vector([0.0, 0.0, 1.0]));
        let resolved = resolve(&spec, "LDAUU", &perovskite());
        assert!(resolved.array.is_none());
        assert_eq!(resolved.issues[0].kind, IssueKind::TypeMismatch);
    }

    #[test]
    fn mixed_widths_drop_the_tag() {
        let spec = SitePropertySpec::BySpecies(vec![
            ("Ti".into(), SiteValue::Vector([0.0, 0.0, 2.0])),
            ("O".into(), SiteValue::Scalar(0.0)),
        ]);
        let resolved = resolve(&spec, "MAGMOM", &perovskite());
        assert!(resolved.array.is_none());
        assert_eq!(resolved.issues[0].kind, IssueKind::TypeMismatch);
    }

    #[test]
    fn explicit_lists_must_match_site_count() {
        let good = SitePropertySpec::Explicit(vec![SiteValue::Scalar(1.0); 5]);
        assert_eq!(scalars(&resolve(&good, "MAGMOM", &perovskite())), vec![1.0; 5]);

        let short = SitePropertySpec::Explicit(vec![SiteValue::Scalar(1.0); 4]);
        let resolved = resolve(&short, "MAGMOM", &perovskite());
        assert!(resolved.array.is_none());
        assert_eq!(resolved.issues[0].kind, IssueKind::OutOfDomain);
    }

    #[test]
    fn flat_explicit_list_regroups_for_vector_tags() {
        let spec = SitePropertySpec::Explicit(
            (0..15).map(|i| SiteValue::Scalar((i % 3) as f64)).collect(),
        );
        let resolved = resolve(&spec, "M_CONSTR", &perovskite());
        assert_eq!(
            resolved.array,
            Some(CanonicalSiteArray::Vectors(vec![[0.0, 1.0, 2.0]; 5]))
        );
    }

    #[test]
    fn raw_tokens_pass_through_unless_empty() {
        let resolved = resolve(&SitePropertySpec::RawString("5*0.6".into()), "MAGMOM", &perovskite());
        assert_eq!(resolved.array, Some(CanonicalSiteArray::Raw("5*0.6".into())));

        let empty = resolve(&SitePropertySpec::RawString("  ".into()), "MAGMOM", &perovskite());
        assert!(empty.array.is_none());
    }

    #[test]
    fn conventions_agree_on_equivalent_assignments() {
        let structure = perovskite();
        let by_species = SitePropertySpec::BySpecies(vec![("Ti".into(), SiteValue::Scalar(2.0))]);
        let by_site = SitePropertySpec::BySite(vec![("Ti1".into(), SiteValue::Scalar(2.0))]);
        let by_index = SitePropertySpec::ByIndex(vec![(1, SiteValue::Scalar(2.0))]);
        let a = resolve(&by_species, "MAGMOM", &structure).array;
        let b = resolve(&by_site, "MAGMOM", &structure).array;
        let c = resolve(&by_index, "MAGMOM", &structure).array;
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn empty_structure_is_rejected() {
        let result = resolve_site_property(
            &SitePropertySpec::Uniform(SiteValue::Scalar(1.0)),
            definition("MAGMOM"),
            &Structure::new(),
            schema(),
        );
        assert!(matches!(result, Err(Error::EmptyStructure)));
    }
}
