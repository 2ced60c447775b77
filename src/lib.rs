//! A pure Rust library that turns loosely written INCAR tag documents into
//! canonical, validated control files for plane-wave DFT calculations.
//! It resolves per-site properties against an ordered atomic structure,
//! catches misspelled and inconsistent tags, and merges user and built-in
//! defaults before emission.
//!
//! # Features
//!
//! - **Tag normalization** — Case-insensitive alias resolution and
//!   edit-distance typo suggestions against a declarative tag schema
//! - **Site-property resolution** — Per-species, per-label, per-index, range,
//!   uniform, explicit and structure-derived specifications all resolve to one
//!   canonical array aligned with the structure's site order
//! - **Validation and correction** — Type, domain and magnitude checks plus
//!   coherence rules between tags, with optional automatic fixes
//! - **Default merging** — Explicit tags over a base-default document over
//!   built-in schema defaults, each entry recording its provenance
//! - **INCAR I/O** — YAML input decks in, INCAR files with run-length
//!   encoded per-site arrays out
//!
//! # Quick Start
//!
//! The main entry point is the [`forge`] function, which takes a
//! [`RawDocument`], a [`Structure`] and a [`ForgeConfig`] and produces a
//! [`ForgeReport`] holding the [`NormalizedDocument`] and every finding:
//!
//! ```
//! use incar_forge::{CanonicalSiteArray, RawDocument, RawValue, Site, Structure, TagValue};
//! use incar_forge::{forge, ForgeConfig, ForgeError, ValidationPolicy};
//!
//! // Cubic CaTiO3 perovskite, five sites
//! let structure = Structure::from_sites(vec![
//!     Site::new("Ca", [0.0, 0.0, 0.0]),
//!     Site::new("Ti", [0.5, 0.5, 0.5]),
//!     Site::new("O", [0.5, 0.5, 0.0]),
//!     Site::new("O", [0.5, 0.0, 0.5]),
//!     Site::new("O", [0.0, 0.5, 0.5]),
//! ]);
//!
//! let raw = RawDocument::new()
//!     .with("encut", RawValue::Int(520))
//!     .with("MAGMOM", RawValue::Map(vec![("Ti".into(), RawValue::Float(2.0))]))
//!     .with("IDVW", RawValue::Int(11)); // misspelled IVDW
//!
//! let config = ForgeConfig {
//!     policy: ValidationPolicy::correcting(),
//!     ..Default::default()
//! };
//! let report = forge(&raw, &structure, &config)?;
//!
//! // Per-species moments expand to one value per site
//! assert_eq!(
//!     report.document.value("MAGMOM"),
//!     Some(&TagValue::Sites(CanonicalSiteArray::Scalars(vec![0.0, 2.0, 0.0, 0.0, 0.0])))
//! );
//!
//! // The typo is replaced by the canonical tag
//! assert_eq!(report.document.value("IVDW"), Some(&TagValue::Int(11)));
//! assert!(!report.document.contains("IDVW"));
//!
//! // Moments need a spin-polarized run; the missing companion is filled in
//! assert_eq!(report.document.value("ISPIN"), Some(&TagValue::Int(2)));
//!
//! // Every finding was fixed, so nothing blocks emission
//! assert!(!report.has_errors());
//! # Ok::<(), ForgeError>(())
//! ```
//!
//! # Module Organization
//!
//! - [`io`] — YAML input decks, INCAR reading and writing, run-length notation
//! - [`forge`] — The normalize → resolve → merge → validate pipeline
//! - [`ForgeConfig`] — Schema override, validation policy and defaults
//!
//! # Data Types
//!
//! ## Inputs
//!
//! - [`Structure`] — Ordered sites with optional lattice
//! - [`Site`] — Species symbol, position, optional label and metadata columns
//! - [`RawDocument`] — Tag keys as written, with [`RawValue`] values
//!
//! ## Outputs
//!
//! - [`ForgeReport`] — Normalized document plus findings
//! - [`NormalizedDocument`] — Canonical tags mapped to [`TagEntry`] values
//! - [`TagValue`] — Typed tag value; per-site tags hold a [`CanonicalSiteArray`]
//! - [`Provenance`] — Whether an entry was explicit, defaulted or corrected
//! - [`ValidationIssue`] — One finding with [`IssueKind`] and [`Severity`]
//!
//! ## Schema
//!
//! - [`TagSchema`] — Tag definitions, aliases and coherence rules
//! - [`TagDefinition`] — Arity, domain and defaults of one tag
//! - [`SitePropertySpec`] — The conventions a per-site tag can be written in

mod forge;
mod model;

pub mod io;

pub use model::document::{NormalizedDocument, Provenance, RawDocument, TagEntry};
pub use model::issue::{IssueKind, Severity, ValidationIssue};
pub use model::structure::{Site, Structure};
pub use model::tag::Tag;
pub use model::value::{CanonicalSiteArray, RawValue, SiteValue, TagValue};

pub use forge::{
    Arity, Choice, CoherenceRule, Condition, Domain, ForgeConfig, ForgeReport, KeyResolution,
    Normalized, RangeRecord, Resolved, SitePropertySpec, TagDefinition, TagSchema,
    ValidationPolicy, builtin_defaults, classify, forge, load_schema, merge_documents,
    normalize_document, normalize_key, resolve_site_property, suggest, validate,
};

pub use forge::Error as ForgeError;
