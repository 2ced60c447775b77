use anyhow::Result;

use incar_forge::ValidationPolicy;

use super::{emit, output_name, report_issues, run_pipeline};
use crate::cli::FixArgs;
use crate::config::build_forge_config;
use crate::display::{Context as DisplayContext, Progress};

const TOTAL_STEPS: u8 = 3;

pub fn run_fix(args: FixArgs, ctx: DisplayContext) -> Result<()> {
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    let pipeline = run_pipeline(&args.common, ctx, &mut progress, |_| {
        build_forge_config(&args.common, ValidationPolicy::correcting(), false)
    })?;
    let report = pipeline.report;
    report_issues(&report, ctx);

    progress.step("Writing INCAR");
    emit(&report, args.output.as_deref(), ctx)?;
    progress.complete_step(
        "Writing INCAR",
        &[
            format!("Applied {} fix(es)", report.fixed_count()),
            format!("Write INCAR → {}", output_name(args.output.as_deref())),
        ],
    );

    progress.finish("Fix complete");
    Ok(())
}
