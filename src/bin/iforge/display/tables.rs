use std::io::{self, Write};

use incar_forge::io::render_value;
use incar_forge::{NormalizedDocument, Severity, Structure, ValidationIssue};

use crate::util::text::{truncate, wrap};

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

pub fn print_structure_info(structure: &Structure) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let composition = structure
        .species()
        .into_iter()
        .map(|symbol| {
            let count = structure
                .sites
                .iter()
                .filter(|s| s.species == symbol)
                .count();
            format!("{symbol}{count}")
        })
        .collect::<Vec<_>>()
        .join(" ");

    let mut rows = vec![
        ("Sites", structure.site_count().to_string()),
        ("Composition", composition),
    ];

    if let Some(lattice) = &structure.lattice {
        let (a, b, c) = (
            vec_len(&lattice[0]),
            vec_len(&lattice[1]),
            vec_len(&lattice[2]),
        );
        rows.push(("Lattice (Å)", format!("{:.2} × {:.2} × {:.2}", a, b, c)));

        let (alpha, beta, gamma) = calc_angles(lattice);
        rows.push((
            "Angles (α β γ)",
            format!("{:.1}° {:.1}° {:.1}°", alpha, beta, gamma),
        ));
    }

    print_kv_table(&mut out, "Structure Summary", &rows);
}

/// Findings table; fixed findings are marked with a check.
pub fn print_issues(issues: &[ValidationIssue]) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let errors = issues.iter().filter(|i| i.is_blocking()).count();
    let warnings = issues
        .iter()
        .filter(|i| i.severity == Severity::Warning)
        .count();
    let fixed = issues.iter().filter(|i| i.fixed).count();

    let title = format!("Findings: {errors} error(s), {warnings} warning(s), {fixed} fixed");
    let _ = writeln!(out, "{}┌─ {} ─┐", INDENT, truncate(&title, SAFE_TABLE_WIDTH - 6));
    if issues.is_empty() {
        let _ = writeln!(out, "{}  no findings", INDENT);
        return;
    }

    let sev_w = 5usize;
    let tag_w = 10usize;
    let sep_overhead = 8;
    let msg_w = SAFE_TABLE_WIDTH.saturating_sub(sev_w + tag_w + sep_overhead);

    let rule = |left: &str, mid: &str, right: &str| {
        format!(
            "{}{left}{}{mid}{}{mid}{}{right}",
            INDENT,
            "─".repeat(sev_w + 2),
            "─".repeat(tag_w + 2),
            "─".repeat(msg_w + 2)
        )
    };

    let _ = writeln!(out, "{}", rule("┌", "┬", "┐"));
    let _ = writeln!(
        out,
        "{}│ {:<sev_w$} │ {:<tag_w$} │ {:<msg_w$} │",
        INDENT, "Sev", "Tag", "Finding"
    );
    let _ = writeln!(out, "{}", rule("├", "┼", "┤"));

    for issue in issues {
        let sev = match (issue.severity, issue.fixed) {
            (_, true) => "✓",
            (Severity::Error, false) => "ERR",
            (Severity::Warning, false) => "WARN",
        };
        let text = format!("{}: {}", issue.kind.name(), issue.message);
        for (i, line) in wrap(&text, msg_w).into_iter().enumerate() {
            let (sev_cell, tag_cell) = if i == 0 {
                (sev.to_string(), truncate(&issue.tag, tag_w))
            } else {
                (String::new(), String::new())
            };
            let _ = writeln!(
                out,
                "{}│ {:<sev_w$} │ {:<tag_w$} │ {:<msg_w$} │",
                INDENT, sev_cell, tag_cell, line
            );
        }
    }

    let _ = writeln!(out, "{}", rule("└", "┴", "┘"));
}

/// Resolved tags with their value and where it came from.
pub fn print_document(document: &NormalizedDocument) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let tag_w = 12usize;
    let src_w = 11usize;
    let sep_overhead = 8;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(tag_w + src_w + sep_overhead);

    let rule = |left: &str, mid: &str, right: &str| {
        format!(
            "{}{left}{}{mid}{}{mid}{}{right}",
            INDENT,
            "─".repeat(tag_w + 2),
            "─".repeat(val_w + 2),
            "─".repeat(src_w + 2)
        )
    };

    let _ = writeln!(out, "{}┌─ Resolved Tags ({}) ─┐", INDENT, document.len());
    let _ = writeln!(out, "{}", rule("┌", "┬", "┐"));
    let _ = writeln!(
        out,
        "{}│ {:<tag_w$} │ {:<val_w$} │ {:<src_w$} │",
        INDENT, "Tag", "Value", "Source"
    );
    let _ = writeln!(out, "{}", rule("├", "┼", "┤"));

    for (tag, entry) in document {
        let value = render_value(&entry.value);
        let _ = writeln!(
            out,
            "{}│ {:<tag_w$} │ {:<val_w$} │ {:<src_w$} │",
            INDENT,
            truncate(tag.name(), tag_w),
            truncate(&value, val_w),
            entry.provenance.to_string()
        );
    }

    let _ = writeln!(out, "{}", rule("└", "┴", "┘"));
}

fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 16usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(
        out,
        "{}┌{k_line}┬{v_line}┐",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );

    for (key, val) in rows {
        let _ = writeln!(
            out,
            "{}│ {:<key_w$} │ {:>val_w$} │",
            INDENT,
            truncate(key, key_w),
            truncate(val, val_w),
        );
    }

    let _ = writeln!(
        out,
        "{}└{k_line}┴{v_line}┘",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );
}

fn vec_len(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn calc_angles(lattice: &[[f64; 3]; 3]) -> (f64, f64, f64) {
    let angle = |u: &[f64; 3], v: &[f64; 3]| {
        let dot = u[0] * v[0] + u[1] * v[1] + u[2] * v[2];
        (dot / (vec_len(u) * vec_len(v))).acos().to_degrees()
    };
    let [a, b, c] = lattice;
    (angle(b, c), angle(a, c), angle(a, b))
}
