use comfy_table::{presets, CellAlignment, Table};
use serde::Serialize;

use crate::app::GlobalOptions;

/// Headers of the numeric package table columns; these are right aligned.
const NUMERIC_COLUMNS: &[&str] = &["#", "Outer", "Offset", "Size", "Exports"];

/// Prints `data` as pretty JSON with `--json`, otherwise hands it to `display`.
pub fn print_output<T: Serialize>(
    data: &T,
    opts: &GlobalOptions,
    display: impl FnOnce(&T),
) -> anyhow::Result<()> {
    if opts.json {
        println!("{}", serde_json::to_string_pretty(data)?);
    } else {
        display(data);
    }
    Ok(())
}

/// Prints package table rows without borders. With a title, the rows are listed under a
/// `Title (count):` line and indented.
pub fn print_table(title: Option<&str>, headers: &[&str], rows: Vec<Vec<String>>) {
    let indent = match title {
        Some(title) => {
            println!("{title} ({}):", rows.len());
            "  "
        }
        None => "",
    };
    for line in render_table(headers, rows).lines() {
        println!("{indent}{line}");
    }
}

fn render_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING).set_header(headers.to_vec());
    for (index, header) in headers.iter().enumerate() {
        if let Some(column) = table.column_mut(index) {
            if NUMERIC_COLUMNS.contains(header) {
                column.set_cell_alignment(CellAlignment::Right);
            }
            column.set_padding((0, 2));
        }
    }
    table.add_rows(rows);

    table
        .to_string()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_columns_align_right() {
        let rendered = render_table(
            &["#", "Name", "Size"],
            vec![
                vec!["1".into(), "Dodo_Character_BP_C".into(), "4096".into()],
                vec!["12".into(), "Default__Dodo".into(), "8".into()],
            ],
        );
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with(" 1  Dodo_Character_BP_C"));
        assert!(lines[2].starts_with("12  Default__Dodo"));
        assert!(lines[1].ends_with("4096"));
        assert!(lines[2].ends_with("   8"));
        assert!(lines.iter().all(|line| line.len() == lines[1].len()));
    }
}
