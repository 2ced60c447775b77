use incar_forge::io::{encode_run_length, expand_run_length, read_deck_str, read_incar, write_incar};
use incar_forge::{
    CanonicalSiteArray, ForgeConfig, ForgeError, ForgeReport, IssueKind, Provenance, Severity,
    TagValue, ValidationPolicy, forge,
};

const PEROVSKITE: &str = r#"
structure:
  lattice: {a: 3.905, b: 3.905, c: 3.905, alpha: 90, beta: 90, gamma: 90}
  species: [Sr, Ti, O, O, O]
  coords:
    - [0.0, 0.0, 0.0]
    - [0.5, 0.5, 0.5]
    - [0.5, 0.5, 0.0]
    - [0.5, 0.0, 0.5]
    - [0.0, 0.5, 0.5]
"#;

const FLUORITE: &str = r#"
structure:
  species: [{Ca: 4}, {F: 8}]
"#;

fn run(deck_yaml: &str) -> Result<ForgeReport, ForgeError> {
    let deck = read_deck_str(deck_yaml).expect("deck should parse");
    forge(
        &deck.incar,
        &deck.structure,
        &ForgeConfig {
            policy: deck.validation,
            ..Default::default()
        },
    )
}

fn compose(structure: &str, rest: &str) -> String {
    format!("{structure}{rest}")
}

fn render(report: &ForgeReport) -> String {
    let mut out = Vec::new();
    write_incar(&mut out, &report.document).unwrap();
    String::from_utf8(out).unwrap()
}

fn count(report: &ForgeReport, kind: fn(&IssueKind) -> bool) -> usize {
    report.all_issues().iter().filter(|i| kind(&i.kind)).count()
}

#[test]
fn overlapping_ranges_alternate_moments_over_fluorite() {
    let yaml = compose(
        FLUORITE,
        r#"
incar:
  LNONCOLLINEAR: true
  MAGMOM:
    - {start: 0, stop: 12, step: 2, value: [0, 0, 1]}
    - {start: 1, stop: 12, step: 2, value: [0, 0, -1]}
validation:
  warn: true
"#,
    );
    let report = run(&yaml).unwrap();

    let expected: Vec<[f64; 3]> = (0..12)
        .map(|i| if i % 2 == 0 { [0.0, 0.0, 1.0] } else { [0.0, 0.0, -1.0] })
        .collect();
    assert_eq!(
        report.document.value("MAGMOM"),
        Some(&TagValue::Sites(CanonicalSiteArray::Vectors(expected)))
    );
    assert!(report.reported().is_empty(), "{:?}", report.reported());

    let line = vec!["2*0.0 1*1.0 2*0.0 1*-1.0"; 6].join(" ");
    assert!(render(&report).contains(&format!("MAGMOM = {line}\n")));
}

#[test]
fn range_past_last_site_aborts_under_every_policy() {
    for policy in ["", "validation: {warn: true}\n", "validation: {correct: true}\n"] {
        let yaml = compose(
            FLUORITE,
            &format!(
                "incar:\n  MAGMOM:\n    - {{start: 0, stop: 13, step: 1, value: 1.0}}\n{policy}"
            ),
        );
        let err = run(&yaml).unwrap_err();
        match err {
            ForgeError::RangeOutOfBounds {
                tag,
                stop,
                site_count,
                ..
            } => {
                assert_eq!(tag, "MAGMOM");
                assert_eq!(stop, 13);
                assert_eq!(site_count, 12);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn misspelled_tag_is_corrected_when_asked() {
    let yaml = compose(
        PEROVSKITE,
        "incar:\n  IDVW: 11\nvalidation:\n  correct: true\n",
    );
    let report = run(&yaml).unwrap();

    assert_eq!(report.document.value("IVDW"), Some(&TagValue::Int(11)));
    assert_eq!(
        report.document.provenance("IVDW"),
        Some(Provenance::Corrected)
    );
    assert!(!report.document.contains("IDVW"));

    let typo = report
        .reported()
        .iter()
        .find(|i| matches!(i.kind, IssueKind::Typo { .. }))
        .expect("typo finding");
    assert!(typo.fixed);
    assert!(!report.has_errors());
}

#[test]
fn misspelled_tag_is_kept_and_reported_when_only_warning() {
    let yaml = compose(PEROVSKITE, "incar:\n  IDVW: 11\nvalidation:\n  warn: true\n");
    let report = run(&yaml).unwrap();

    assert_eq!(report.document.value("IDVW"), Some(&TagValue::Int(11)));
    assert!(!report.document.contains("IVDW"));

    let typo = report
        .reported()
        .iter()
        .find(|i| matches!(i.kind, IssueKind::Typo { .. }))
        .expect("typo finding");
    assert_eq!(
        typo.kind,
        IssueKind::Typo {
            suggestion: "IVDW".into()
        }
    );
    assert_eq!(typo.severity, Severity::Warning);
    assert!(!typo.fixed);
}

#[test]
fn silent_policy_collects_but_does_not_report() {
    let yaml = compose(PEROVSKITE, "incar:\n  IDVW: 11\n  ISPIN: 3\n");
    let report = run(&yaml).unwrap();

    assert!(report.reported().is_empty());
    assert!(!report.all_issues().is_empty());
    assert_eq!(report.document.value("IDVW"), Some(&TagValue::Int(11)));
    assert_eq!(report.document.value("ISPIN"), Some(&TagValue::Int(3)));
}

#[test]
fn species_moments_round_trip_through_run_length() {
    let yaml = compose(
        PEROVSKITE,
        "incar:\n  ISPIN: 2\n  MAGMOM: {Ti: 2.0}\nvalidation:\n  warn: true\n",
    );
    let report = run(&yaml).unwrap();
    assert!(report.reported().is_empty(), "{:?}", report.reported());

    let text = render(&report);
    assert!(text.contains("MAGMOM = 1*0.0 1*2.0 3*0.0\n"));

    let encoded = encode_run_length(&[0.0, 2.0, 0.0, 0.0, 0.0]);
    assert_eq!(encoded, "1*0.0 1*2.0 3*0.0");
    assert_eq!(
        expand_run_length(&encoded).unwrap(),
        vec![0.0, 2.0, 0.0, 0.0, 0.0]
    );
}

#[test]
fn species_and_index_conventions_conflict_last_wins() {
    let yaml = compose(
        PEROVSKITE,
        r#"
incar:
  ISPIN: 2
  MAGMOM:
    species: {Ti: 2.0}
    indices: {4: 1.0}
validation:
  warn: true
"#,
    );
    let report = run(&yaml).unwrap();

    assert_eq!(
        report.document.value("MAGMOM"),
        Some(&TagValue::Sites(CanonicalSiteArray::Scalars(vec![
            0.0, 0.0, 0.0, 0.0, 1.0
        ])))
    );
    assert_eq!(
        count(&report, |k| *k == IssueKind::ConflictingSpecification),
        1
    );
}

#[test]
fn hubbard_values_switch_on_ldau() {
    let yaml = compose(
        PEROVSKITE,
        "incar:\n  LDAUU: {Ti: 4.0}\nvalidation:\n  correct: true\n",
    );
    let report = run(&yaml).unwrap();

    assert_eq!(report.document.value("LDAU"), Some(&TagValue::Bool(true)));
    assert_eq!(
        report.document.provenance("LDAU"),
        Some(Provenance::Corrected)
    );
    let missing = report
        .reported()
        .iter()
        .find(|i| matches!(i.kind, IssueKind::MissingCompanion { .. }))
        .expect("missing companion finding");
    assert!(missing.fixed);

    let text = render(&report);
    assert!(text.contains("LDAU = .TRUE.\n"));
    assert!(text.contains("LDAUU = 1*0.0 1*4.0 3*0.0\n"));
}

#[test]
fn hubbard_values_without_ldau_are_reported_when_warning() {
    let yaml = compose(
        PEROVSKITE,
        "incar:\n  LDAUU: {Ti: 4.0}\nvalidation:\n  warn: true\n",
    );
    let report = run(&yaml).unwrap();

    assert!(!report.document.contains("LDAU"));
    assert_eq!(
        count(&report, |k| matches!(k, IssueKind::MissingCompanion { .. })),
        1
    );
}

#[test]
fn base_defaults_fill_gaps_without_overriding() {
    let deck = read_deck_str(&compose(PEROVSKITE, "incar:\n  ENCUT: 520\n")).unwrap();
    let base = read_incar("ENCUT = 400\nEDIFF = 1E-6\nLWAVE = .FALSE.\n".as_bytes()).unwrap();

    let report = forge(
        &deck.incar,
        &deck.structure,
        &ForgeConfig {
            base_defaults: Some(base),
            policy: ValidationPolicy::warning(),
            ..Default::default()
        },
    )
    .unwrap();

    let doc = &report.document;
    assert_eq!(doc.value("ENCUT"), Some(&TagValue::Int(520)));
    assert_eq!(doc.provenance("ENCUT"), Some(Provenance::Explicit));
    assert_eq!(doc.value("EDIFF"), Some(&TagValue::Float(1e-6)));
    assert_eq!(doc.provenance("EDIFF"), Some(Provenance::FromDefault));
    assert_eq!(doc.value("LWAVE"), Some(&TagValue::Bool(false)));
    assert_eq!(doc.provenance("LWAVE"), Some(Provenance::FromDefault));

    assert_eq!(
        render(&report),
        "EDIFF = 0.000001\nENCUT = 520\nLWAVE = .FALSE.\n"
    );
}

#[test]
fn builtin_defaults_are_filled_on_request() {
    let deck = read_deck_str(&compose(PEROVSKITE, "incar:\n  ISPIN: 2\n  MAGMOM: 1.0\n")).unwrap();
    let report = forge(
        &deck.incar,
        &deck.structure,
        &ForgeConfig {
            fill_builtin_defaults: true,
            policy: ValidationPolicy::warning(),
            ..Default::default()
        },
    )
    .unwrap();

    let doc = &report.document;
    assert_eq!(doc.value("ISPIN"), Some(&TagValue::Int(2)));
    assert_eq!(doc.provenance("ISPIN"), Some(Provenance::Explicit));
    assert_eq!(doc.value("LWAVE"), Some(&TagValue::Bool(true)));
    assert_eq!(doc.provenance("LWAVE"), Some(Provenance::FromDefault));
    assert_eq!(
        doc.value("MAGMOM"),
        Some(&TagValue::Sites(CanonicalSiteArray::Scalars(vec![1.0; 5])))
    );
}

#[test]
fn cutoff_of_unexpected_order_is_warned() {
    let low = run(&compose(
        PEROVSKITE,
        "incar:\n  ENCUT: 90\nvalidation:\n  warn: true\n",
    ))
    .unwrap();
    let issue = low
        .reported()
        .iter()
        .find(|i| i.tag == "ENCUT")
        .expect("magnitude warning");
    assert_eq!(issue.kind, IssueKind::OutOfDomain);
    assert_eq!(issue.severity, Severity::Warning);
    assert!(!low.has_errors());

    let typical = run(&compose(
        PEROVSKITE,
        "incar:\n  ENCUT: 620\nvalidation:\n  warn: true\n",
    ))
    .unwrap();
    assert!(typical.reported().is_empty());
}

#[test]
fn booleans_are_written_in_fortran_spelling() {
    let report = run(&compose(PEROVSKITE, "incar:\n  LWAVE: false\n  lcharg: true\n")).unwrap();
    let text = render(&report);
    assert!(text.contains("LWAVE = .FALSE.\n"));
    assert!(text.contains("LCHARG = .TRUE.\n"));
}

#[test]
fn moments_can_be_read_from_the_structure() {
    let with_column = r#"
structure:
  species: [Fe, Fe, O]
  properties:
    magmom: [3.0, -3.0, 0.0]
incar:
  ISPIN: 2
  MAGMOM: true
validation:
  warn: true
"#;
    let report = run(with_column).unwrap();
    assert_eq!(
        report.document.value("MAGMOM"),
        Some(&TagValue::Sites(CanonicalSiteArray::Scalars(vec![
            3.0, -3.0, 0.0
        ])))
    );
    assert!(report.reported().is_empty(), "{:?}", report.reported());

    let without_column = "structure:\n  species: [Fe, Fe, O]\nincar:\n  MAGMOM: true\n";
    match run(without_column).unwrap_err() {
        ForgeError::MissingRequiredData { tag, column } => {
            assert_eq!(tag, "MAGMOM");
            assert_eq!(column, "magmom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_structure_is_rejected() {
    let deck = read_deck_str(&compose(PEROVSKITE, "incar:\n  ENCUT: 520\n")).unwrap();
    let err = forge(
        &deck.incar,
        &incar_forge::Structure::new(),
        &ForgeConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ForgeError::EmptyStructure));
}

#[test]
fn overridden_range_past_last_site_still_aborts() {
    let yaml = compose(
        FLUORITE,
        r#"
incar:
  MAGMOM:
    ranges:
      - {start: 0, stop: 13, step: 1, value: 1.0}
    species: {Ca: 2.0}
validation:
  correct: true
"#,
    );
    match run(&yaml).unwrap_err() {
        ForgeError::RangeOutOfBounds {
            stop, site_count, ..
        } => {
            assert_eq!(stop, 13);
            assert_eq!(site_count, 12);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn overridden_structure_read_without_column_still_aborts() {
    let yaml = compose(
        FLUORITE,
        "incar:\n  MAGMOM:\n    from_structure: true\n    species: {Ca: 2.0}\n",
    );
    assert!(matches!(
        run(&yaml).unwrap_err(),
        ForgeError::MissingRequiredData { .. }
    ));
}

#[test]
fn absent_species_with_vector_value_does_not_drop_the_tag() {
    let yaml = compose(
        FLUORITE,
        r#"
incar:
  ISPIN: 2
  MAGMOM: {Ca: 2.0, Fe: [0, 0, 1]}
validation:
  warn: true
"#,
    );
    let report = run(&yaml).unwrap();

    let mut expected = vec![2.0; 4];
    expected.extend([0.0; 8]);
    assert_eq!(
        report.document.value("MAGMOM"),
        Some(&TagValue::Sites(CanonicalSiteArray::Scalars(expected)))
    );
    let kinds: Vec<&IssueKind> = report.reported().iter().map(|i| &i.kind).collect();
    assert_eq!(kinds, vec![&IssueKind::OutOfDomain]);
    assert_eq!(report.reported()[0].severity, Severity::Warning);
}

#[test]
fn unknown_mapping_tag_is_reported_once() {
    let yaml = compose(
        PEROVSKITE,
        "incar:\n  FOOBARBAZ: {Ti: 1.0}\nvalidation:\n  warn: true\n",
    );
    let report = run(&yaml).unwrap();
    assert_eq!(report.reported().len(), 1);
    assert_eq!(report.reported()[0].kind, IssueKind::UnknownTag);
}
