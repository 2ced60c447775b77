use std::path::Path;

use anyhow::{Context, Result};

use incar_forge::io::{Format, read_incar, read_tags_yaml};
use incar_forge::{ForgeConfig, RawDocument, ValidationPolicy};

use crate::cli::{CommonOptions, PolicyOptions};
use crate::io::{InputKind, infer_defaults_format, open_input, read_text};

pub fn build_forge_config(
    opts: &CommonOptions,
    policy: ValidationPolicy,
    fill_builtin_defaults: bool,
) -> Result<ForgeConfig> {
    let schema = opts
        .schema
        .as_deref()
        .map(|p| read_text(p, InputKind::Schema))
        .transpose()?;
    let base_defaults = opts.defaults.as_deref().map(read_defaults).transpose()?;

    Ok(ForgeConfig {
        schema,
        policy,
        base_defaults,
        fill_builtin_defaults,
    })
}

/// The deck's policy with command-line flags switched on over it.
pub fn resolve_policy(deck: ValidationPolicy, opts: &PolicyOptions) -> ValidationPolicy {
    ValidationPolicy {
        warn: deck.warn || opts.warn,
        correct: deck.correct || opts.correct,
    }
}

fn read_defaults(path: &Path) -> Result<RawDocument> {
    let input = open_input(Some(path), InputKind::Defaults)?;
    let document = match infer_defaults_format(path) {
        Format::Yaml => read_tags_yaml(input),
        Format::Incar => read_incar(input),
    };
    document.with_context(|| format!("Failed to read defaults file: {}", path.display()))
}
