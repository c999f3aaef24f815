//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Tables come either
//! from a `Tabled` row type or from a core `TableView`, structured formats
//! use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

use peerly_core::table::{SortDirection, TableView};
use peerly_core::{Alert, AlertVariant};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Print an alert from the core's alert bus to stderr.
pub fn print_alert(alert: &Alert, color: bool, quiet: bool) {
    if quiet && alert.variant != AlertVariant::Danger {
        return;
    }
    let (mark, text) = match alert.variant {
        AlertVariant::Success => ("✓", alert.message.clone()),
        AlertVariant::Danger => ("✗", alert.message.clone()),
        AlertVariant::Warning => ("!", alert.message.clone()),
        AlertVariant::Info => ("·", alert.message.clone()),
    };
    let line = if color {
        match alert.variant {
            AlertVariant::Success => format!("{} {text}", mark.green()),
            AlertVariant::Danger => format!("{} {}", mark.red(), text.red()),
            AlertVariant::Warning => format!("{} {text}", mark.yellow()),
            AlertVariant::Info => format!("{} {text}", mark.cyan()),
        }
    } else {
        format!("{mark} {text}")
    };
    eprintln!("{line}");
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Plain => Ok(data.iter().map(id_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render a core table projection. Structured formats serialize `data`
/// (the rows on the current page) rather than the rendered cells.
pub fn render_view<T: Serialize>(
    format: OutputFormat,
    view: &TableView,
    data: &[&T],
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_view_table(view)),
        OutputFormat::Plain => Ok(view
            .rows
            .iter()
            .map(|r| r.id.to_string())
            .collect::<Vec<_>>()
            .join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render a single serde-serializable item in the chosen format.
pub fn render_single<T: Serialize>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Plain => Ok(id_fn(data)),
        structured => render_structured(structured, data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_view_table(view: &TableView) -> String {
    let mut builder = Builder::default();
    builder.push_record(view.headers.iter().map(|h| match h.sort {
        Some(SortDirection::Ascending) => format!("{} ▲", h.title),
        Some(SortDirection::Descending) => format!("{} ▼", h.title),
        None => h.title.clone(),
    }));
    for row in &view.rows {
        builder.push_record(row.cells.iter().cloned());
    }
    let mut out = builder.build().with(Style::rounded()).to_string();
    if view.page.count > 1 {
        out.push_str(&format!(
            "\nPage {} of {} ({} rows)",
            view.page.index + 1,
            view.page.count,
            view.page.total_rows
        ));
    }
    out
}

fn render_structured<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    let rendered = match format {
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| e.to_string()),
        _ => serde_json::to_string_pretty(data).map_err(|e| e.to_string()),
    };
    rendered.map_err(CliError::Serialize)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use peerly_core::table::{HeaderView, PageInfo, RowView};

    fn view() -> TableView {
        TableView {
            headers: vec![HeaderView {
                id: "name".into(),
                title: "Name".into(),
                sortable: true,
                sort: Some(SortDirection::Ascending),
                filter: None,
            }],
            rows: vec![
                RowView {
                    id: 7,
                    selected: false,
                    cells: vec!["Grading".into()],
                },
                RowView {
                    id: 2,
                    selected: false,
                    cells: vec!["Mentoring".into()],
                },
            ],
            page: PageInfo {
                index: 0,
                count: 2,
                size: 2,
                total_rows: 3,
            },
        }
    }

    #[test]
    fn view_table_marks_sorted_column_and_page() {
        let out = render_view::<u8>(OutputFormat::Table, &view(), &[]).unwrap();
        assert!(out.contains("Name ▲"));
        assert!(out.contains("Mentoring"));
        assert!(out.ends_with("Page 1 of 2 (3 rows)"));
    }

    #[test]
    fn plain_prints_row_ids() {
        let out = render_view::<u8>(OutputFormat::Plain, &view(), &[]).unwrap();
        assert_eq!(out, "7\n2");
    }

    #[test]
    fn structured_formats_serialize_data() {
        let data = [&1u8, &2u8];
        assert_eq!(
            render_view(OutputFormat::JsonCompact, &view(), &data).unwrap(),
            "[1,2]"
        );
        assert_eq!(
            render_view(OutputFormat::Yaml, &view(), &data).unwrap(),
            "- 1\n- 2\n"
        );
    }
}
