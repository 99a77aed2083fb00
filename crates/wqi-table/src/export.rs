use wqi_core::{ParameterSet, Sample, ScoreResult};

use crate::batch::{BatchInput, LOCATION_COLUMN};
use crate::csv::write_csv_record;
use crate::error::TableError;

pub const WQI_COLUMN: &str = "WQI";
pub const CLASS_COLUMN: &str = "Class";

/// Raw value as exported: shortest round-trip decimal, empty when absent.
pub fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn header(params: &ParameterSet, extra: &[String]) -> Vec<String> {
    [LOCATION_COLUMN, WQI_COLUMN, CLASS_COLUMN]
        .into_iter()
        .map(str::to_string)
        .chain(params.parameter_names().map(str::to_string))
        .chain(extra.iter().cloned())
        .collect()
}

fn record<'a>(
    location: &str,
    result: &ScoreResult,
    cells: impl IntoIterator<Item = String>,
    extra: impl IntoIterator<Item = &'a String>,
) -> Vec<String> {
    [
        location.to_string(),
        format_cell(result.wqi),
        result.class_label.clone(),
    ]
    .into_iter()
    .chain(cells)
    .chain(extra.into_iter().cloned())
    .collect()
}

/// One-row export for a single scored sample. Unscored samples have nothing
/// to download.
pub fn export_single(
    location: &str,
    sample: &Sample,
    result: &ScoreResult,
    params: &ParameterSet,
) -> Result<String, TableError> {
    result.outcome()?;
    let mut out = String::new();
    write_csv_record(&mut out, &header(params, &[]));
    let cells = params
        .parameter_names()
        .map(|name| format_cell(sample.get(name)));
    write_csv_record(&mut out, &record(location, result, cells, std::iter::empty()));
    Ok(out)
}

/// Whole-batch export. Parameter and extra cells are echoed exactly as
/// uploaded. Rows that could not be scored keep an empty `WQI` and carry the
/// diagnostic in `Class`.
pub fn export_batch(
    input: &BatchInput,
    results: &[ScoreResult],
    params: &ParameterSet,
) -> Result<String, TableError> {
    input.check_rows()?;
    if results.len() != input.len() {
        return Err(TableError::LengthMismatch {
            rows: input.len(),
            results: results.len(),
        });
    }

    let mut out = String::new();
    write_csv_record(&mut out, &header(params, &input.extra_headers));
    let rows = input
        .locations
        .iter()
        .zip(&input.parameter_cells)
        .zip(&input.extra_values)
        .zip(results);
    for (((location, cells), extra), result) in rows {
        write_csv_record(&mut out, &record(location, result, cells.iter().cloned(), extra));
    }
    Ok(out)
}
