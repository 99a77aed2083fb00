use rayon::prelude::*;
use tracing::debug;

use crate::aggregate::aggregate;
use crate::model::{ParameterSet, Sample, ScoreResult};

/// Scores every row independently. `results[i]` always belongs to `rows[i]`.
pub fn score_batch(rows: &[Sample], params: &ParameterSet) -> Vec<ScoreResult> {
    let results: Vec<ScoreResult> = rows.par_iter().map(|row| aggregate(row, params)).collect();
    debug!(
        set = params.name(),
        rows = rows.len(),
        unscored = results.iter().filter(|r| !r.is_scored()).count(),
        "scored batch"
    );
    results
}
