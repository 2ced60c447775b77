use std::io::{self, Write};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
const RULE_WIDTH: usize = 56;

/// A single spinner reused across steps, cleared between them so tables
/// printed after a step do not interleave with it.
struct StepSpinner {
    bar: ProgressBar,
    started: Instant,
    step_started: Instant,
    step: u8,
    total_steps: u8,
}

impl StepSpinner {
    fn new(total_steps: u8) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {prefix:.dim} {msg}") {
            bar.set_style(style.tick_chars(TICK_CHARS));
        }
        let now = Instant::now();
        Self {
            bar,
            started: now,
            step_started: now,
            step: 0,
            total_steps,
        }
    }

    fn step(&mut self, description: &str) {
        self.step = self.step.saturating_add(1).min(self.total_steps);
        self.step_started = Instant::now();
        self.bar.reset();
        self.bar
            .set_prefix(format!("[{}/{}]", self.step, self.total_steps));
        self.bar.set_message(format!("{description}..."));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn complete_step(&mut self, description: &str, details: &[String]) {
        let seconds = self.step_started.elapsed().as_secs_f64();
        self.bar.println(format!(
            "  \x1b[32m✓\x1b[0m {description:<44} {seconds:>5.2}s"
        ));
        for detail in details {
            self.bar.println(format!("      \x1b[2m·\x1b[0m {detail}"));
        }
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }

    fn finish(self, summary: &str) {
        self.bar.finish_and_clear();

        let total = format!("Total: {:.2}s", self.started.elapsed().as_secs_f64());
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr);
        let _ = writeln!(
            stderr,
            "  \x1b[2m╺{}╸\x1b[0m",
            "━".repeat(RULE_WIDTH)
        );
        let _ = writeln!(stderr, "  \x1b[32m✓\x1b[0m {summary:<40} {total:>12}");
        let _ = writeln!(stderr);
    }
}

/// Step reporting on stderr; does nothing when not interactive.
pub struct Progress(Option<StepSpinner>);

impl Progress {
    pub fn new(interactive: bool, total_steps: u8) -> Self {
        Self(interactive.then(|| StepSpinner::new(total_steps)))
    }

    pub fn step(&mut self, description: &str) {
        if let Some(spinner) = &mut self.0 {
            spinner.step(description);
        }
    }

    pub fn complete_step(&mut self, description: &str, details: &[String]) {
        if let Some(spinner) = &mut self.0 {
            spinner.complete_step(description, details);
        }
    }

    pub fn finish(self, summary: &str) {
        if let Some(spinner) = self.0 {
            spinner.finish(summary);
        }
    }
}
