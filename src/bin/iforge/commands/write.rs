use anyhow::Result;

use super::{emit, output_name, report_issues, run_pipeline};
use crate::cli::WriteArgs;
use crate::config::{build_forge_config, resolve_policy};
use crate::display::{Context as DisplayContext, Progress};

const TOTAL_STEPS: u8 = 3;

pub fn run_write(args: WriteArgs, ctx: DisplayContext) -> Result<()> {
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    let pipeline = run_pipeline(&args.common, ctx, &mut progress, |deck| {
        let policy = resolve_policy(deck.validation, &args.policy);
        build_forge_config(&args.common, policy, args.policy.fill_defaults)
    })?;
    let report = pipeline.report;
    report_issues(&report, ctx);

    progress.step("Writing INCAR");
    emit(&report, args.output.as_deref(), ctx)?;
    progress.complete_step(
        "Writing INCAR",
        &[format!(
            "Write INCAR → {}",
            output_name(args.output.as_deref())
        )],
    );

    progress.finish("Write complete");
    Ok(())
}
