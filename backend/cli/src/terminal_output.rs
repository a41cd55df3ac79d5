//! Terminal output: notes, tables, and the field-state listing.

use docfill_core::{FieldState, Registry, ValidationReport};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

pub fn note_info(msg: &str) {
    if supports_color() {
        eprintln!("{CYAN}{BOLD}ℹ{RESET} {msg}");
    } else {
        eprintln!("INFO: {msg}");
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        eprintln!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        eprintln!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        eprintln!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        eprintln!("OK: {msg}");
    }
}

pub enum Align {
    Left,
    Center,
}

pub struct Column {
    pub header: String,
    pub align: Align,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Left,
        }
    }

    pub fn center(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Center,
        }
    }
}

pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let num_cols = columns.len();
    let mut widths: Vec<usize> = columns
        .iter()
        .map(|c| strip_ansi(&c.header).chars().count())
        .collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(num_cols) {
            widths[i] = widths[i].max(strip_ansi(cell).chars().count());
        }
    }

    let mut out = String::new();

    let header_cells: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| pad_cell(&col.header, widths[i], &col.align))
        .collect();
    if supports_color() {
        out.push_str(&format!("{BOLD}  {}  {RESET}\n", header_cells.join("  ")));
    } else {
        out.push_str(&format!("  {}  \n", header_cells.join("  ")));
    }

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}  \n", sep.join("  ")));

    for row in rows {
        let cells: Vec<String> = (0..num_cols)
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                pad_cell(cell, widths[i], &columns[i].align)
            })
            .collect();
        out.push_str(&format!("  {}  \n", cells.join("  ")));
    }

    out
}

fn pad_cell(s: &str, width: usize, align: &Align) -> String {
    let pad = width.saturating_sub(strip_ansi(s).chars().count());
    match align {
        Align::Left => format!("{s}{}", " ".repeat(pad)),
        Align::Center => {
            let left = pad / 2;
            format!("{}{s}{}", " ".repeat(left), " ".repeat(pad - left))
        }
    }
}

fn mark(flag: bool) -> String {
    if flag { "yes" } else { "-" }.to_string()
}

/// Configuration of every placeholder, in registry order.
pub fn registry_table(registry: &Registry) -> String {
    let columns = [
        Column::left("Placeholder"),
        Column::left("Type"),
        Column::center("Required"),
        Column::left("Depends on"),
        Column::left("Options"),
    ];
    let rows: Vec<Vec<String>> = registry
        .iter()
        .map(|(name, config)| {
            let deps = config
                .active_dependencies()
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                name.delimited(),
                config.kind.to_string(),
                mark(config.required),
                if deps.is_empty() { "-".to_string() } else { deps },
                if config.options.is_empty() {
                    "-".to_string()
                } else {
                    config.options.join(" | ")
                },
            ]
        })
        .collect();
    render_table(&columns, &rows)
}

/// Visibility and requiredness for the current values. Hidden fields are
/// listed dimmed so the user sees why they are not asked for.
pub fn field_state_table(states: &[FieldState]) -> String {
    let columns = [
        Column::left("Field"),
        Column::left("Type"),
        Column::center("Visible"),
        Column::center("Required"),
        Column::center("Filled"),
    ];
    let color = supports_color();
    let rows: Vec<Vec<String>> = states
        .iter()
        .map(|s| {
            let name = if !s.visible && color {
                format!("{DIM}{}{RESET}", s.name)
            } else {
                s.name.to_string()
            };
            vec![
                name,
                s.kind.to_string(),
                mark(s.visible),
                mark(s.effectively_required),
                mark(s.filled),
            ]
        })
        .collect();
    render_table(&columns, &rows)
}

pub fn report_notes(report: &ValidationReport) {
    if !report.missing.is_empty() {
        let names: Vec<&str> = report.missing.iter().map(|n| n.as_str()).collect();
        note_error(&format!("Missing required fields: {}", names.join(", ")));
    }
    if !report.empty_optional.is_empty() {
        let names: Vec<&str> = report.empty_optional.iter().map(|n| n.as_str()).collect();
        note_warn(&format!("Optional fields left empty: {}", names.join(", ")));
    }
}
