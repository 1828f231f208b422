//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use adscope_core::{StatusKind, StatusMessage};
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

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

/// One status-bar line, coloured by kind.
pub fn format_status(message: &StatusMessage, color: bool) -> String {
    match (message.kind, color) {
        (StatusKind::Success, true) => format!("{} {}", "✓".green(), message.text),
        (StatusKind::Error, true) => format!("{} {}", "✗".red(), message.text.red()),
        (StatusKind::Success, false) => format!("ok: {}", message.text),
        (StatusKind::Error, false) => format!("error: {}", message.text),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render rows whose columns are only known at runtime.
pub fn render_grid<T>(
    format: OutputFormat,
    data: &[T],
    headers: &[String],
    cells_fn: impl Fn(&T) -> Vec<String>,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(headers.iter().cloned());
            for item in data {
                builder.push_record(cells_fn(item));
            }
            Ok(builder.build().with(Style::rounded()).to_string())
        }
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted string,
/// since single-item detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
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

fn render_structured<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    match format {
        OutputFormat::JsonCompact => Ok(serde_json::to_string(data)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
        OutputFormat::Json | OutputFormat::Table | OutputFormat::Plain => {
            Ok(serde_json::to_string_pretty(data)?)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Line {
        dn: String,
        name: String,
    }

    fn lines() -> Vec<Line> {
        vec![
            Line {
                dn: "OU=Ops,DC=x".into(),
                name: "Ops".into(),
            },
            Line {
                dn: "OU=Sales,DC=x".into(),
                name: "Sales".into(),
            },
        ]
    }

    #[test]
    fn grid_table_uses_runtime_headers() {
        let headers = vec!["Name".to_owned(), "Distinguished name".to_owned()];
        let out = render_grid(
            OutputFormat::Table,
            &lines(),
            &headers,
            |l| vec![l.name.clone(), l.dn.clone()],
            |l| l.dn.clone(),
        )
        .unwrap();

        insta::assert_snapshot!(out, @r"
        ╭───────┬────────────────────╮
        │ Name  │ Distinguished name │
        ├───────┼────────────────────┤
        │ Ops   │ OU=Ops,DC=x        │
        │ Sales │ OU=Sales,DC=x      │
        ╰───────┴────────────────────╯
        ");
    }

    #[test]
    fn plain_emits_one_identifier_per_line() {
        let out = render_grid(
            OutputFormat::Plain,
            &lines(),
            &[],
            |_| Vec::new(),
            |l| l.dn.clone(),
        )
        .unwrap();
        assert_eq!(out, "OU=Ops,DC=x\nOU=Sales,DC=x");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_single(
            OutputFormat::JsonCompact,
            &lines()[0],
            |_| String::new(),
            |_| String::new(),
        )
        .unwrap();
        assert_eq!(out, r#"{"dn":"OU=Ops,DC=x","name":"Ops"}"#);
    }

    #[test]
    fn uncoloured_status_is_prefixed_by_kind() {
        let message = StatusMessage::error("Failed to delete 1 of 2 objects");
        assert_eq!(
            format_status(&message, false),
            "error: Failed to delete 1 of 2 objects"
        );
    }
}
