//! Reading input decks and INCAR files, writing INCAR files.
//!
//! - [`read_deck`] – YAML input deck → structure, raw tag document and policy
//! - [`read_incar`] / [`read_tags_yaml`] – INCAR text or a YAML tag mapping →
//!   raw tag document (used for base defaults)
//! - [`write_incar`] – normalized document → INCAR text
//! - [`encode_run_length`] / [`expand_run_length`] – per-site array notation

use std::fmt;

pub mod error;
pub mod util;

mod document;
mod incar;

pub use document::{InputDeck, read_deck, read_deck_str, read_tags_yaml};
pub use error::Error;
pub use incar::{read_incar, render_value, write_incar};
pub use util::{encode_run_length, expand_run_length};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Incar,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Yaml => write!(f, "YAML"),
            Format::Incar => write!(f, "INCAR"),
        }
    }
}
