use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{ParameterSet, Sample, ScoreResult};
use crate::subindex::sub_index;

/// How weighted sub-indices are folded into one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// `Σ qi·wi`. The table weights already sum to roughly one, so nothing
    /// is divided; missing parameters are simply left out of the sum.
    WeightedSum,
    /// `Σ qi·wi / Σ wi` over the parameters that took part.
    WeightedMean,
}

/// One parameter that took part in a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub name: String,
    pub value: f64,
    pub sub_index: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored {
    pub result: ScoreResult,
    pub contributions: Vec<Contribution>,
}

pub fn aggregate(sample: &Sample, params: &ParameterSet) -> ScoreResult {
    aggregate_detailed(sample, params).result
}

pub fn aggregate_detailed(sample: &Sample, params: &ParameterSet) -> Scored {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut contributions = Vec::new();

    for spec in params.parameters() {
        let Some(value) = sample.get(&spec.name) else {
            continue;
        };
        let Some(qi) = sub_index(value, spec) else {
            continue;
        };
        weighted_sum += qi * spec.weight;
        total_weight += spec.weight;
        contributions.push(Contribution {
            name: spec.name.clone(),
            value,
            sub_index: qi,
            weight: spec.weight,
        });
    }

    if total_weight == 0.0 {
        debug!(set = params.name(), "sample has no scorable parameters");
        return Scored {
            result: ScoreResult::no_valid_data(),
            contributions,
        };
    }

    let wqi = match params.model().aggregation() {
        Aggregation::WeightedSum => weighted_sum,
        Aggregation::WeightedMean => weighted_sum / total_weight,
    };
    let label = params.policy().classify(wqi);
    debug!(
        set = params.name(),
        participating = contributions.len(),
        total_weight,
        wqi,
        label,
        "scored sample"
    );

    Scored {
        result: ScoreResult::scored(wqi, label),
        contributions,
    }
}

/// Display form of a score: two decimals.
pub fn format_wqi(wqi: f64) -> String {
    format!("{wqi:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParameterSpec, Response, ScoringModel};

    fn linear_set() -> ParameterSet {
        ParameterSet::new(
            "mini",
            ScoringModel::LinearRatio,
            vec![
                ParameterSpec::standard("Lead", 0.25, 10.0),
                ParameterSpec::standard("Iron", 0.5, 200.0),
                ParameterSpec::range("pH", 0.25, 6.5, 9.5),
            ],
        )
        .unwrap()
    }

    fn ideal_limit_set() -> ParameterSet {
        ParameterSet::new(
            "mini-b",
            ScoringModel::IdealLimit,
            vec![
                ParameterSpec::ideal_limit("pH", 0.11, 7.0, 8.5, Response::IdealPoint),
                ParameterSpec::ideal_limit("DO", 0.17, 5.0, 14.6, Response::IdealPoint),
                ParameterSpec::ideal_limit("BOD5", 0.5, 0.0, 5.0, Response::LowerIsBetter),
            ],
        )
        .unwrap()
    }

    #[test]
    fn empty_sample_has_no_valid_data() {
        let result = aggregate(&Sample::new(), &linear_set());
        assert_eq!(result, ScoreResult::no_valid_data());
    }

    #[test]
    fn explicitly_absent_values_do_not_participate() {
        let mut sample = Sample::new();
        sample.insert("Lead", None);
        sample.insert("Iron", Some(f64::NAN));
        let result = aggregate(&sample, &linear_set());
        assert_eq!(result.wqi, None);
        assert_eq!(result.class_label, "No valid data provided");
    }

    #[test]
    fn unknown_parameters_are_ignored() {
        let sample = Sample::new().with("Mercury", 3.0);
        assert!(!aggregate(&sample, &linear_set()).is_scored());
    }

    #[test]
    fn weighted_sum_does_not_renormalize_partial_samples() {
        // Lead at its standard: 100 * 0.25, Iron absent, pH absent.
        let sample = Sample::new().with("Lead", 10.0);
        let result = aggregate(&sample, &linear_set());
        assert_eq!(result.wqi, Some(25.0));
        assert_eq!(result.class_label, "Excellent water");
    }

    #[test]
    fn weighted_sum_over_all_parameters() {
        // Lead 100*0.25 + Iron 100*0.5 + pH 0*0.25 = 75
        let sample = Sample::new()
            .with("Lead", 10.0)
            .with("Iron", 200.0)
            .with("pH", 7.0);
        let result = aggregate(&sample, &linear_set());
        assert_eq!(result.wqi, Some(75.0));
        assert_eq!(result.class_label, "Good water");
    }

    #[test]
    fn weighted_mean_divides_by_participating_weight() {
        // BOD5 at 2.5 -> 50; only BOD5 participates so the mean is 50.
        let sample = Sample::new().with("BOD5", 2.5);
        let result = aggregate(&sample, &ideal_limit_set());
        assert_eq!(result.wqi, Some(50.0));
        assert_eq!(result.class_label, "Poor");
    }

    #[test]
    fn ideal_points_score_zero_and_classify_very_poor() {
        let sample = Sample::new().with("pH", 7.0).with("DO", 5.0);
        let result = aggregate(&sample, &ideal_limit_set());
        assert_eq!(result.wqi, Some(0.0));
        assert_eq!(result.class_label, "Very Poor");
    }

    #[test]
    fn zero_weight_parameters_alone_are_not_valid_data() {
        let set = ParameterSet::new(
            "weightless",
            ScoringModel::IdealLimit,
            vec![ParameterSpec::ideal_limit("x", 0.0, 0.0, 1.0, Response::LowerIsBetter)],
        )
        .unwrap();
        let result = aggregate(&Sample::new().with("x", 0.5), &set);
        assert!(!result.is_scored());
    }

    #[test]
    fn detailed_scoring_lists_participants_in_table_order() {
        let sample = Sample::new().with("pH", 8.0).with("Lead", 5.0);
        let scored = aggregate_detailed(&sample, &linear_set());
        let names: Vec<_> = scored.contributions.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Lead", "pH"]);
        assert_eq!(scored.contributions[0].sub_index, 50.0);
    }

    #[test]
    fn formats_two_decimals() {
        assert_eq!(format_wqi(12.345_6), "12.35");
        assert_eq!(format_wqi(0.0), "0.00");
    }
}
