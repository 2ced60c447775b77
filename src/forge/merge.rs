use super::schema::TagSchema;
use crate::model::document::{NormalizedDocument, Provenance};
use tracing::debug;

/// Combines the explicit document with base and built-in defaults.
///
/// Precedence, highest first: explicit tag, base-default tag, built-in
/// default. Both documents are already keyed by canonical tag, so aliases
/// never produce duplicate entries. Every entry not taken from `explicit`
/// is recorded as `fromDefault`.
pub fn merge_documents(
    explicit: NormalizedDocument,
    base: Option<NormalizedDocument>,
    builtins: Option<NormalizedDocument>,
) -> NormalizedDocument {
    let mut merged = NormalizedDocument::new();
    let layers = builtins.into_iter().chain(base);

    for layer in layers {
        for (tag, mut entry) in layer {
            entry.provenance = Provenance::FromDefault;
            merged.insert_entry(tag, entry);
        }
    }
    let defaults = merged.len();

    let mut overridden = 0usize;
    for (tag, entry) in explicit {
        if merged.insert_entry(tag, entry).is_some() {
            overridden += 1;
        }
    }
    debug!(
        defaults,
        overridden,
        total = merged.len(),
        "merged explicit tags over defaults"
    );
    merged
}

/// Built-in defaults of every non-site tag in the schema.
///
/// Site tags are excluded: their default is a fill value for unset sites,
/// not a document entry.
pub fn builtin_defaults(schema: &TagSchema) -> NormalizedDocument {
    let mut document = NormalizedDocument::new();
    for definition in schema.definitions() {
        if definition.arity.is_site() {
            continue;
        }
        if let Some(value) = &definition.default {
            document.insert(definition.tag.clone(), value.clone(), Provenance::FromDefault);
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tag::Tag;
    use crate::model::value::TagValue;

    fn doc(entries: &[(&str, TagValue, Provenance)]) -> NormalizedDocument {
        let mut doc = NormalizedDocument::new();
        for (name, value, provenance) in entries {
            doc.insert(Tag::new(name), value.clone(), *provenance);
        }
        doc
    }

    #[test]
    fn explicit_beats_base_beats_builtin() {
        let explicit = doc(&[("ENCUT", TagValue::Int(520), Provenance::Explicit)]);
        let base = doc(&[
            ("ENCUT", TagValue::Int(400), Provenance::Explicit),
            ("EDIFF", TagValue::Float(1e-6), Provenance::Explicit),
        ]);
        let builtins = doc(&[
            ("EDIFF", TagValue::Float(1e-4), Provenance::FromDefault),
            ("NSW", TagValue::Int(0), Provenance::FromDefault),
        ]);

        let merged = merge_documents(explicit, Some(base), Some(builtins));
        assert_eq!(merged.value("ENCUT"), Some(&TagValue::Int(520)));
        assert_eq!(merged.provenance("ENCUT"), Some(Provenance::Explicit));
        assert_eq!(merged.value("EDIFF"), Some(&TagValue::Float(1e-6)));
        assert_eq!(merged.provenance("EDIFF"), Some(Provenance::FromDefault));
        assert_eq!(merged.value("NSW"), Some(&TagValue::Int(0)));
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn corrected_base_entries_become_defaults() {
        let base = doc(&[("IVDW", TagValue::Int(11), Provenance::Corrected)]);
        let merged = merge_documents(NormalizedDocument::new(), Some(base), None);
        assert_eq!(merged.provenance("IVDW"), Some(Provenance::FromDefault));
    }

    #[test]
    fn explicit_only_passes_through_unchanged() {
        let explicit = doc(&[("ISPIN", TagValue::Int(2), Provenance::Corrected)]);
        let merged = merge_documents(explicit.clone(), None, None);
        assert_eq!(merged, explicit);
    }

    #[test]
    fn builtin_defaults_skip_site_tags() {
        let defaults = builtin_defaults(TagSchema::builtin());
        assert_eq!(defaults.value("ISPIN"), Some(&TagValue::Int(1)));
        assert_eq!(defaults.value("LWAVE"), Some(&TagValue::Bool(true)));
        assert!(!defaults.contains("MAGMOM"));
        assert!(!defaults.contains("LDAUL"));
        assert!(!defaults.contains("ENCUT"));
        assert!(
            defaults
                .iter()
                .all(|(_, e)| e.provenance == Provenance::FromDefault)
        );
    }
}
