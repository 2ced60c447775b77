use anyhow::{Context, Result};

use incar_forge::{ForgeConfig, ValidationPolicy, forge};

use super::{Pipeline, report_issues, run_pipeline};
use crate::cli::CheckArgs;
use crate::config::build_forge_config;
use crate::display::{BlockingIssues, Context as DisplayContext, Progress, print_document};

const TOTAL_STEPS: u8 = 2;

pub fn run_check(args: CheckArgs, ctx: DisplayContext) -> Result<()> {
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    let Pipeline {
        deck,
        config,
        report,
    } = run_pipeline(&args.common, ctx, &mut progress, |_| {
        build_forge_config(&args.common, ValidationPolicy::warning(), false)
    })?;

    report_issues(&report, ctx);
    if ctx.interactive {
        print_document(&report.document);
    }
    progress.finish("Check complete");

    let errors = count_blocking(report.all_issues());
    if errors == 0 {
        return Ok(());
    }

    let corrected = forge(
        &deck.incar,
        &deck.structure,
        &ForgeConfig {
            policy: ValidationPolicy::correcting(),
            ..config
        },
    )
    .context("Normalization failed")?;
    let remaining = count_blocking(corrected.all_issues());

    Err(BlockingIssues {
        errors,
        fixable: errors.saturating_sub(remaining),
    }
    .into())
}

fn count_blocking(issues: &[incar_forge::ValidationIssue]) -> usize {
    issues.iter().filter(|i| i.is_blocking()).count()
}
