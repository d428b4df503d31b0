use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use polars::prelude::DataFrame;

use itemconv_cli::pipeline::LookupRun;
use itemconv_ingest::LoadedMapping;
use itemconv_model::{KEY_COLUMNS, MATCH_COLUMN};

pub fn print_summary(run: &LookupRun, output: Option<&Path>, preview_rows: usize) {
    println!("Mapping: {} ({} rows)", run.mapping.key, run.mapping.row_count());
    if let Some(path) = output {
        println!("Output: {}", path.display());
    }

    let summary = &run.summary;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Count")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("IDs provided"), Cell::new(summary.tokens)]);
    table.add_row(vec![
        Cell::new("Matches found"),
        count_cell(summary.matched_tokens, Color::Green),
    ]);
    for (kind, count) in &summary.by_kind {
        table.add_row(vec![
            dim_cell(format!("  {kind}")),
            Cell::new(count).fg(kind_color(kind)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Not found"),
        count_cell(summary.not_found.len(), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Result rows")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(summary.rows).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    if !summary.not_found.is_empty() {
        println!();
        println!("Not found:");
        for token in &summary.not_found {
            println!("- {token}");
        }
    }

    if preview_rows > 0 && run.table.height() > 0 {
        println!();
        println!("{}", preview_table(&run.table, preview_rows));
    }
}

/// Render up to `limit` rows of the result table.
pub fn preview_table(df: &DataFrame, limit: usize) -> Table {
    let mut table = Table::new();
    table.set_header(
        df.get_column_names()
            .into_iter()
            .map(|name| header_cell(name.as_str()))
            .collect::<Vec<_>>(),
    );
    apply_table_style(&mut table);

    let columns: Vec<_> = df
        .get_columns()
        .iter()
        .map(|column| (column.name().as_str() == MATCH_COLUMN, column.str().ok()))
        .collect();
    let shown = df.height().min(limit);
    for row in 0..shown {
        let cells: Vec<Cell> = columns
            .iter()
            .map(|(is_match, values)| {
                let value = values.and_then(|ca| ca.get(row));
                match value {
                    Some(text) if *is_match => Cell::new(text).fg(kind_color(text)),
                    Some(text) => Cell::new(text),
                    None => dim_cell("-"),
                }
            })
            .collect();
        table.add_row(cells);
    }
    if shown < df.height() {
        let mut more = vec![dim_cell(format!("... {} more rows", df.height() - shown))];
        more.extend((1..df.width()).map(|_| dim_cell("")));
        table.add_row(more);
    }
    table
}

/// Canonical column → header found in the mapping table.
pub fn print_columns(mapping: &LoadedMapping) {
    println!("Mapping: {} ({} rows)", mapping.key, mapping.row_count());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Found as"),
        header_cell("Role"),
    ]);
    apply_table_style(&mut table);
    for (canonical, actual) in mapping.columns.iter() {
        let is_key = KEY_COLUMNS.iter().any(|key| *key == canonical);
        let found = match actual {
            Some(name) => Cell::new(name).fg(Color::Green),
            None if is_key => Cell::new("missing")
                .fg(Color::Red)
                .add_attribute(Attribute::Bold),
            None => dim_cell("missing"),
        };
        let role = if is_key {
            Cell::new("key").fg(Color::Blue)
        } else {
            dim_cell("payload")
        };
        table.add_row(vec![Cell::new(canonical), found, role]);
    }
    println!("{table}");

    let headers = mapping.headers();
    if !headers.is_empty() {
        println!("Headers: {}", headers.join(", "));
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(160);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

/// Colour of a match label; fuzzy labels carry their score.
fn kind_color(label: &str) -> Color {
    match label {
        "Exact" => Color::Green,
        "Prefix" | "Substring" => Color::Blue,
        "No match" => Color::Red,
        _ if label.starts_with("Fuzzy") => Color::Yellow,
        _ => Color::Reset,
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
