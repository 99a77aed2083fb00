use tracing::{debug, warn};
use wqi_core::{score_batch, ParameterSet, Sample, ScoreResult};

use crate::csv::{parse_csv, CsvTable};
use crate::error::TableError;

pub const LOCATION_COLUMN: &str = "Location";

const MISSING_TOKENS: [&str; 8] = ["", "nan", "-nan", "na", "n/a", "#n/a", "null", "none"];

/// An uploaded table split into what the engine needs and what is echoed
/// back on export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchInput {
    pub locations: Vec<String>,
    pub samples: Vec<Sample>,
    /// Uploaded parameter cells as written, one per set parameter in set
    /// order; empty where the upload has no such column.
    pub parameter_cells: Vec<Vec<String>>,
    /// Columns that are neither the location nor a known parameter.
    pub extra_headers: Vec<String>,
    pub extra_values: Vec<Vec<String>>,
    /// Parameters of the active set with no column in the upload.
    pub missing_parameters: Vec<String>,
}

impl BatchInput {
    pub fn from_csv(text: &str, params: &ParameterSet) -> Result<Self, TableError> {
        let table = parse_csv(text)?;
        Ok(Self::from_table(&table, params))
    }

    pub fn from_table(table: &CsvTable, params: &ParameterSet) -> Self {
        let location_col = table
            .headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(LOCATION_COLUMN));

        let mut param_cols: Vec<(usize, &str)> = Vec::new();
        let mut extra_cols: Vec<usize> = Vec::new();
        for (idx, header) in table.headers.iter().enumerate() {
            if Some(idx) == location_col {
                continue;
            }
            let claimed = param_cols.iter().any(|(_, name)| *name == header.as_str());
            match params.get(header) {
                Some(spec) if !claimed => param_cols.push((idx, spec.name.as_str())),
                _ => extra_cols.push(idx),
            }
        }

        let missing_parameters: Vec<String> = params
            .parameter_names()
            .filter(|name| !param_cols.iter().any(|(_, n)| n == name))
            .map(str::to_string)
            .collect();
        if !missing_parameters.is_empty() {
            debug!(
                set = params.name(),
                missing = missing_parameters.len(),
                "upload lacks parameter columns; treating them as absent"
            );
        }

        let mut input = Self {
            extra_headers: extra_cols
                .iter()
                .filter_map(|&idx| table.headers.get(idx).cloned())
                .collect(),
            missing_parameters,
            ..Self::default()
        };

        for (row_idx, row) in table.rows.iter().enumerate() {
            let location = location_col
                .and_then(|idx| row.get(idx))
                .map(|cell| cell.trim().to_string())
                .unwrap_or_default();

            let mut sample = Sample::new();
            for &(idx, name) in &param_cols {
                let cell = row.get(idx).map_or("", String::as_str);
                sample.insert(name, parse_cell(cell, row_idx, name));
            }
            for name in &input.missing_parameters {
                sample.insert(name.as_str(), None);
            }
            let cells = params
                .parameter_names()
                .map(|name| {
                    param_cols
                        .iter()
                        .find(|(_, n)| *n == name)
                        .and_then(|&(idx, _)| row.get(idx).cloned())
                        .unwrap_or_default()
                })
                .collect();

            input.locations.push(location);
            input.samples.push(sample);
            input.parameter_cells.push(cells);
            input.extra_values.push(
                extra_cols
                    .iter()
                    .map(|&idx| row.get(idx).cloned().unwrap_or_default())
                    .collect(),
            );
        }

        input
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Checks that every per-row vector has one entry per sample.
    pub fn check_rows(&self) -> Result<(), TableError> {
        let rows = self.samples.len();
        for (field, found) in [
            ("locations", self.locations.len()),
            ("parameter_cells", self.parameter_cells.len()),
            ("extra_values", self.extra_values.len()),
        ] {
            if found != rows {
                return Err(TableError::InconsistentRows {
                    field,
                    expected: rows,
                    found,
                });
            }
        }
        Ok(())
    }

    pub fn score(&self, params: &ParameterSet) -> Vec<ScoreResult> {
        score_batch(&self.samples, params)
    }
}

/// Empty cells and the usual missing-value tokens are absent. Text that is
/// not a number is absent too, with a warning.
pub fn parse_cell(cell: &str, row: usize, column: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if MISSING_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
    {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(row, column, cell = trimmed, "non-numeric measurement treated as absent");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wqi_core::{ParameterSpec, ScoringModel};

    fn set() -> ParameterSet {
        ParameterSet::new(
            "t",
            ScoringModel::LinearRatio,
            vec![
                ParameterSpec::standard("Lead", 0.5, 10.0),
                ParameterSpec::standard("Iron", 0.25, 200.0),
                ParameterSpec::range("pH", 0.25, 6.5, 9.5),
            ],
        )
        .unwrap()
    }

    #[test]
    fn maps_known_columns_and_keeps_extras() {
        let input = BatchInput::from_csv(
            "location,Lead,Operator,pH\nWell 1,5,ann,7.0\nWell 2,,bob,NaN\n",
            &set(),
        )
        .unwrap();

        assert_eq!(input.locations, ["Well 1", "Well 2"]);
        assert_eq!(input.extra_headers, ["Operator"]);
        assert_eq!(input.extra_values, vec![vec!["ann"], vec!["bob"]]);
        assert_eq!(input.missing_parameters, ["Iron"]);

        assert_eq!(input.samples[0].get("Lead"), Some(5.0));
        assert_eq!(input.samples[0].get("pH"), Some(7.0));
        assert!(input.samples[0].contains_key("Iron"));
        assert_eq!(input.samples[0].get("Iron"), None);
        assert_eq!(input.samples[1].get("Lead"), None);
        assert_eq!(input.samples[1].get("pH"), None);

        assert_eq!(
            input.parameter_cells,
            vec![vec!["5", "", "7.0"], vec!["", "", "NaN"]]
        );
    }

    #[test]
    fn missing_column_is_absent_in_every_row() {
        let input = BatchInput::from_csv("Lead\n10\n20\n", &set()).unwrap();
        let results = input.score(&set());
        // Iron and pH never participate; Lead alone is summed, not averaged.
        assert_eq!(results[0].wqi, Some(50.0));
        assert_eq!(results[1].wqi, Some(100.0));
        assert_eq!(input.locations, ["", ""]);
    }

    #[test]
    fn garbage_cells_are_absent() {
        assert_eq!(parse_cell("  n/a ", 0, "Lead"), None);
        assert_eq!(parse_cell("<0.5", 0, "Lead"), None);
        assert_eq!(parse_cell(" 0 ", 0, "Lead"), Some(0.0));
        assert_eq!(parse_cell("1e2", 0, "Lead"), Some(100.0));
    }

    #[test]
    fn duplicate_parameter_columns_keep_the_first() {
        let input = BatchInput::from_csv("Lead,Lead\n1,2\n", &set()).unwrap();
        assert_eq!(input.samples[0].get("Lead"), Some(1.0));
        assert_eq!(input.extra_headers, ["Lead"]);
        assert_eq!(input.parameter_cells[0][0], "1");
    }

    #[test]
    fn row_vectors_must_agree() {
        let mut input = BatchInput::from_csv("Lead\n1\n", &set()).unwrap();
        assert_eq!(input.check_rows(), Ok(()));
        input.locations.push("stray".to_string());
        assert_eq!(
            input.check_rows(),
            Err(TableError::InconsistentRows {
                field: "locations",
                expected: 1,
                found: 2
            })
        );
    }
}
