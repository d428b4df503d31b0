//! Projection of match results onto the canonical output table.

use itemconv_model::{
    ColumnMap, MATCH_COLUMN, MatchResult, OutputSchema, QUERY_COLUMN, ResultOrder,
};
use polars::prelude::*;
use tracing::debug;

use crate::error::{OutputError, Result};

/// Arrange results for display.
///
/// `ByMatchKind` sorts by tier (fuzzy by descending score), then by query;
/// the sort is stable so rows of one query keep table order.
pub fn order_results(results: &[MatchResult], order: ResultOrder) -> Vec<&MatchResult> {
    let mut ordered: Vec<&MatchResult> = results.iter().collect();
    if order == ResultOrder::ByMatchKind {
        ordered.sort_by(|a, b| {
            a.kind
                .sort_key()
                .cmp(&b.kind.sort_key())
                .then_with(|| a.query.cmp(&b.query))
        });
    }
    ordered
}

/// Build the result table: `Your input`, `Match`, then every schema column.
///
/// Schema columns missing from the reference table come out all-null, as
/// do the payload cells of no-match rows.
pub fn project(
    results: &[MatchResult],
    table: &DataFrame,
    columns: &ColumnMap,
    schema: &OutputSchema,
    order: ResultOrder,
) -> Result<DataFrame> {
    let ordered = order_results(results, order);
    let height = table.height();
    if let Some(row) = ordered.iter().filter_map(|r| r.row).find(|&row| row >= height) {
        return Err(OutputError::RowOutOfRange { row, height });
    }

    let mut output = Vec::with_capacity(schema.headers().len() + 2);
    let queries: Vec<&str> = ordered.iter().map(|r| r.query.as_str()).collect();
    let labels: Vec<String> = ordered.iter().map(|r| r.kind.to_string()).collect();
    output.push(Column::new(QUERY_COLUMN.into(), queries));
    output.push(Column::new(MATCH_COLUMN.into(), labels));

    for header in schema.headers() {
        let column = match columns.get(header) {
            Some(actual) => {
                let source = table.column(actual)?.str()?;
                let values: Vec<Option<&str>> = ordered
                    .iter()
                    .map(|r| r.row.and_then(|row| source.get(row)))
                    .collect();
                Column::new(header.as_str().into(), values)
            }
            None => Column::full_null(header.as_str().into(), ordered.len(), &DataType::String),
        };
        output.push(column);
    }

    debug!(rows = ordered.len(), columns = output.len(), "results projected");
    Ok(DataFrame::new(output)?)
}
