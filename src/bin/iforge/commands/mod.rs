mod check;
mod fix;
mod write;

use check::run_check;
use fix::run_fix;
use write::run_write;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};

use incar_forge::io::{InputDeck, read_deck, write_incar};
use incar_forge::{ForgeConfig, ForgeReport, forge};

use crate::cli::{Command, CommonOptions};
use crate::display::{
    Context as DisplayContext, Progress, print_document, print_issues, print_structure_info,
};
use crate::io::{InputKind, create_output, open_input, stdin_is_tty};

pub fn dispatch(command: Command, ctx: DisplayContext) -> Result<()> {
    match command {
        Command::Check(args) => run_check(args, ctx),
        Command::Fix(args) => run_fix(args, ctx),
        Command::Write(args) => run_write(args, ctx),
    }
}

fn read_input_deck(opts: &CommonOptions) -> Result<InputDeck> {
    if opts.input.is_none() && stdin_is_tty() {
        bail!(
            "No input deck specified and stdin is a terminal.\n\nUsage: iforge <COMMAND> <INPUT> or pipe the deck via stdin."
        );
    }
    let input = open_input(opts.input.as_deref(), InputKind::Deck)?;
    read_deck(input).context("Failed to read input deck")
}

/// A deck run through the pipeline with the configuration that was used.
struct Pipeline {
    deck: InputDeck,
    config: ForgeConfig,
    report: ForgeReport,
}

/// Reads the deck and runs the pipeline, reporting each step.
///
/// `configure` receives the deck so commands can derive the policy from it.
fn run_pipeline(
    opts: &CommonOptions,
    ctx: DisplayContext,
    progress: &mut Progress,
    configure: impl FnOnce(&InputDeck) -> Result<ForgeConfig>,
) -> Result<Pipeline> {
    progress.step("Reading input deck");
    let deck = read_input_deck(opts)?;
    let config = configure(&deck)?;
    progress.complete_step(
        "Reading input deck",
        &[
            format!("{} sites", deck.structure.site_count()),
            format!("{} tags", deck.incar.len()),
        ],
    );

    if ctx.interactive {
        print_structure_info(&deck.structure);
    }

    progress.step("Resolving and validating tags");
    let report = forge(&deck.incar, &deck.structure, &config).context("Normalization failed")?;
    progress.complete_step(
        "Resolving and validating tags",
        &pipeline_details(&config, &report),
    );

    Ok(Pipeline {
        deck,
        config,
        report,
    })
}

fn pipeline_details(config: &ForgeConfig, report: &ForgeReport) -> Vec<String> {
    let mut details = Vec::new();
    if config.schema.is_some() {
        details.push("Custom tag schema".to_string());
    }
    if let Some(base) = &config.base_defaults {
        details.push(format!("Merged {} base-default tag(s)", base.len()));
    }
    if config.fill_builtin_defaults {
        details.push("Filled built-in defaults".to_string());
    }
    details.push(format!(
        "{} tag(s), {} finding(s), {} fixed",
        report.document.len(),
        report.all_issues().len(),
        report.fixed_count()
    ));
    details
}

/// Issue table when interactive, one plain line per finding otherwise.
fn report_issues(report: &ForgeReport, ctx: DisplayContext) {
    let reported = report.reported();
    if ctx.interactive {
        print_issues(reported);
        return;
    }
    let mut stderr = std::io::stderr().lock();
    for issue in reported {
        let _ = writeln!(stderr, "{issue}");
    }
}

fn emit(report: &ForgeReport, output: Option<&Path>, ctx: DisplayContext) -> Result<()> {
    if ctx.interactive {
        print_document(&report.document);
    }
    let mut writer = create_output(output)?;
    write_incar(&mut writer, &report.document).context("Failed to write INCAR")?;
    writer.flush().context("Failed to write INCAR")?;
    Ok(())
}

fn output_name(output: Option<&Path>) -> String {
    output
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stdout".to_string())
}
