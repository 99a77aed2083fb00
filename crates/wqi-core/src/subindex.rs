use crate::model::{ParameterSpec, Reference, Response};

/// Neutral point of the pH-like range shape.
pub const NEUTRAL_PH: f64 = 7.0;

/// Sub-index (Qi) of one measurement against its spec.
///
/// Returns `None` for NaN or infinite input, meaning the parameter does not
/// take part in this sample. Linear-ratio sub-indices are not clamped and
/// exceed 100 when the standard is exceeded.
pub fn sub_index(value: f64, spec: &ParameterSpec) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }

    let qi = match spec.reference {
        Reference::Standard { standard } => (value / standard) * 100.0,
        Reference::Range { high, .. } => ((value - NEUTRAL_PH) / (high - NEUTRAL_PH)).abs() * 100.0,
        Reference::IdealLimit {
            ideal,
            limit,
            response,
        } => ideal_limit_sub_index(value, ideal, limit, response),
    };
    Some(qi)
}

fn ideal_limit_sub_index(value: f64, ideal: f64, limit: f64, response: Response) -> f64 {
    if value > limit {
        return 0.0;
    }

    match response {
        Response::LowerIsBetter => 100.0 * (limit - value) / limit,
        Response::Logarithmic => {
            if value > 0.0 {
                // (0, 1) collapses onto 1 so log10 stays defined.
                100.0 * (1.0 - value.max(1.0).log10() / limit.log10())
            } else {
                100.0
            }
        }
        Response::IdealPoint => {
            if limit == ideal {
                100.0
            } else {
                100.0 * (value - ideal) / (limit - ideal)
            }
        }
    }
}
