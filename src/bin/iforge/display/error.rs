use std::io::{self, Write};

use anyhow::Error;
use incar_forge::ForgeError;
use incar_forge::io::Error as IoError;

use crate::util::text::wrap;

/// Error-severity findings left in a checked document.
#[derive(Debug, thiserror::Error)]
#[error("{errors} unresolved error(s) in the input deck")]
pub struct BlockingIssues {
    pub errors: usize,
    /// How many of them `iforge fix` would remedy automatically.
    pub fixable: usize,
}

const PANEL_WIDTH: usize = 62;

/// Lines of a double-ruled box, collected before anything is written.
struct Panel {
    lines: Vec<String>,
}

impl Panel {
    fn new(title: &str) -> Self {
        let mut panel = Self {
            lines: vec![format!("╔{}╗", "═".repeat(PANEL_WIDTH))],
        };
        panel.row(0, title);
        panel
    }

    fn row(&mut self, indent: usize, text: &str) {
        let width = PANEL_WIDTH - 3 - indent;
        self.lines
            .push(format!("║  {}{text:<width$} ║", " ".repeat(indent)));
    }

    fn paragraph(&mut self, indent: usize, text: &str) {
        for line in wrap(text, PANEL_WIDTH - 3 - indent) {
            self.row(indent, &line);
        }
    }

    fn bullet(&mut self, text: &str) {
        let wrapped = wrap(text, PANEL_WIDTH - 7);
        for (i, line) in wrapped.iter().enumerate() {
            let marker = if i == 0 { "• " } else { "  " };
            self.row(2, &format!("{marker}{line}"));
        }
    }

    fn section(&mut self, heading: &str) {
        self.lines.push(format!("╟{}╢", "─".repeat(PANEL_WIDTH)));
        if !heading.is_empty() {
            self.row(0, heading);
        }
    }

    fn print(mut self) {
        self.lines.push(format!("╚{}╝", "═".repeat(PANEL_WIDTH)));
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr);
        for line in &self.lines {
            let _ = writeln!(stderr, "   {line}");
        }
        let _ = writeln!(stderr);
    }
}

pub fn print_error(err: &Error) {
    let mut panel = Panel::new("✗ Error");
    panel.section("");
    panel.paragraph(0, &err.to_string());

    for cause in err.chain().skip(1) {
        panel.section("Caused by:");
        panel.paragraph(2, &cause.to_string());
    }

    let hints = hints_for(err);
    if !hints.is_empty() {
        panel.section("Hints:");
        for hint in &hints {
            panel.bullet(hint);
        }
    }

    panel.print();
}

/// Hints from the first typed error in the chain, or from the message text.
fn hints_for(err: &Error) -> Vec<String> {
    if let Some(io_err) = err.downcast_ref::<IoError>() {
        return io_hints(io_err);
    }
    if let Some(forge_err) = err.downcast_ref::<ForgeError>() {
        return forge_hints(forge_err);
    }
    if let Some(blocking) = err.downcast_ref::<BlockingIssues>() {
        let mut hints = vec!["See the findings table above for each error".to_string()];
        if blocking.fixable > 0 {
            hints.push(format!(
                "{} of them can be corrected automatically with `iforge fix`",
                blocking.fixable
            ));
        }
        return hints;
    }
    if let Some(source) = err.downcast_ref::<io::Error>() {
        return std_io_hints(source);
    }
    message_hints(&error_chain_text(err))
}

fn io_hints(err: &IoError) -> Vec<String> {
    match err {
        IoError::Io { source } => std_io_hints(source),
        IoError::Yaml(yaml) => {
            let mut hints = vec![match yaml.location() {
                Some(loc) => format!(
                    "YAML syntax problem near line {}, column {}",
                    loc.line(),
                    loc.column()
                ),
                None => "The input is not a valid deck for this layout".to_string(),
            }];
            hints.push("Check indentation and that lists use either [..] or '- ' items".into());
            hints.push("The 'validation' block only accepts 'warn' and 'correct'".into());
            hints
        }
        IoError::Parse { format, line, .. } => vec![
            format!("{format} statement on line {line} could not be read"),
            "Each INCAR statement must read 'TAG = value'".into(),
            "Comments start with '#' or '!'; ';' separates statements".into(),
        ],
        IoError::InvalidDocument(msg) => {
            let mut hints =
                vec!["The input deck is missing data or has inconsistent lengths".to_string()];
            hints.extend(document_hint(msg).map(String::from));
            hints
        }
        IoError::Conversion(msg) => vec![
            "A value could not be converted while reading the input".into(),
            format!("Details: {msg}"),
        ],
    }
}

fn document_hint(msg: &str) -> Option<&'static str> {
    let msg = msg.to_lowercase();
    let missing = msg.contains("missing");
    if missing && msg.contains("structure") {
        Some("Add a 'structure' section with at least 'species'")
    } else if missing && msg.contains("incar") {
        Some("Add an 'incar' section mapping tag names to values")
    } else if msg.contains("coords") || msg.contains("labels") || msg.contains("sites") {
        Some("'coords', 'labels' and every 'properties' column need one entry per site")
    } else if msg.contains("mode") {
        Some("Only 'manual' structures (lattice, species, coords) are read")
    } else if msg.contains("tag ") {
        Some("Every tag in the 'incar' section needs a value")
    } else {
        None
    }
}

fn std_io_hints(source: &io::Error) -> Vec<String> {
    let hints: &[&str] = match source.kind() {
        io::ErrorKind::NotFound => &["Check that the path is spelled correctly and exists"],
        io::ErrorKind::PermissionDenied => &["Check file permissions with `ls -la`"],
        io::ErrorKind::InvalidData => &["The file is not valid UTF-8 text"],
        io::ErrorKind::BrokenPipe => &["The process reading the output exited early"],
        _ => &["Check the file path, permissions and free disk space"],
    };
    hints.iter().map(|h| h.to_string()).collect()
}

fn forge_hints(err: &ForgeError) -> Vec<String> {
    match err {
        ForgeError::SchemaParse(_) => vec![
            "The custom tag schema is not valid TOML".into(),
            "Check for missing quotes, brackets, or invalid values".into(),
        ],
        ForgeError::InvalidSchema(msg) => vec![
            format!("Schema problem: {msg}"),
            "Aliases must be unique and rules may only name defined tags".into(),
        ],
        ForgeError::EmptyStructure => {
            vec!["List at least one species in the 'structure' section".into()]
        }
        ForgeError::MissingRequiredData { tag, column } => vec![
            format!("{tag} = true reads the '{column}' column from the structure"),
            format!("Add 'properties: {{{column}: [...]}}' with one value per site"),
            format!("Or give {tag} values explicitly"),
        ],
        ForgeError::RangeOutOfBounds {
            tag,
            stop,
            site_count,
            ..
        } => vec![
            format!("A {tag} range stops at {stop} but the structure has {site_count} sites"),
            format!("Ranges are 0-based and half-open, so the largest valid stop is {site_count}"),
        ],
    }
}

fn message_hints(msg: &str) -> Vec<String> {
    if msg.contains("terminal") || msg.contains("stdin") {
        vec!["Provide the input deck as an argument or pipe it to stdin".into()]
    } else if msg.contains("no such file") || msg.contains("not found") {
        vec!["Check that the path is spelled correctly and exists".into()]
    } else if msg.contains("permission denied") {
        vec!["Check file permissions with `ls -la`".into()]
    } else {
        Vec::new()
    }
}

fn error_chain_text(err: &Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_errors_name_the_largest_valid_stop() {
        let err = Error::new(ForgeError::range_out_of_bounds("MAGMOM", 0, 13, 12));
        let hints = hints_for(&err);
        assert!(hints.iter().any(|h| h.contains("largest valid stop is 12")));
    }

    #[test]
    fn blocking_issues_mention_fix_only_when_something_is_fixable() {
        let none = Error::new(BlockingIssues {
            errors: 2,
            fixable: 0,
        });
        assert_eq!(hints_for(&none).len(), 1);

        let some = Error::new(BlockingIssues {
            errors: 2,
            fixable: 1,
        });
        assert!(hints_for(&some).iter().any(|h| h.contains("iforge fix")));
    }

    #[test]
    fn context_does_not_hide_typed_errors() {
        let err = Error::new(ForgeError::EmptyStructure).context("Normalization failed");
        assert_eq!(
            hints_for(&err),
            vec!["List at least one species in the 'structure' section".to_string()]
        );
    }

    #[test]
    fn panel_rows_have_constant_width() {
        let mut panel = Panel::new("✗ Error");
        panel.section("Hints:");
        panel.bullet("a hint long enough that it has to be wrapped onto a second line of the panel");
        let widths: Vec<usize> = panel.lines.iter().map(|l| l.chars().count()).collect();
        assert!(widths.iter().all(|w| *w == PANEL_WIDTH + 2), "{widths:?}");
    }
}
