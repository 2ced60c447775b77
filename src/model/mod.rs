//! Core data structures flowing through the `incar-forge` pipeline.
//!
//! - [`structure`] – Ordered atomic structure supplied by the caller (read-only).
//! - [`value`] – Raw document values, per-site values and canonical site arrays.
//! - [`tag`] – Canonical tag identifiers.
//! - [`document`] – Raw input documents and the normalized tag set with provenance.
//! - [`issue`] – Validation findings reported back to the caller.
//!
//! The model separates what the user wrote ([`RawDocument`]) from what is
//! handed to emission ([`NormalizedDocument`]); the [`crate::forge`] pipeline
//! transforms one into the other.
//!
//! [`RawDocument`]: document::RawDocument
//! [`NormalizedDocument`]: document::NormalizedDocument

pub mod document;
pub mod issue;
pub mod structure;
pub mod tag;
pub mod value;
