use proptest::prelude::*;
use wqi_core::{
    aggregate, classify_ascending, classify_descending, score_batch, sub_index, ParameterSet,
    ParameterSpec, Response, Sample, ScoreResult, ScoringModel,
};

fn linear_set() -> ParameterSet {
    ParameterSet::new(
        "props",
        ScoringModel::LinearRatio,
        vec![
            ParameterSpec::standard("Chlorides", 0.3, 250.0),
            ParameterSpec::standard("Nitrates", 0.3, 50.0),
            ParameterSpec::range("pH", 0.4, 6.5, 9.5),
        ],
    )
    .unwrap()
}

fn sample_strategy() -> impl Strategy<Value = Sample> {
    (
        proptest::option::of(0.0f64..1000.0),
        proptest::option::of(0.0f64..200.0),
        proptest::option::of(0.0f64..14.0),
    )
        .prop_map(|(chlorides, nitrates, ph)| {
            let mut sample = Sample::new();
            sample.insert("Chlorides", chlorides);
            sample.insert("Nitrates", nitrates);
            sample.insert("pH", ph);
            sample
        })
}

proptest! {
    #[test]
    fn value_at_standard_is_exactly_one_hundred(standard in 0.001f64..10_000.0) {
        let spec = ParameterSpec::standard("x", 1.0, standard);
        prop_assert_eq!(sub_index(standard, &spec), Some(100.0));
    }

    #[test]
    fn linear_ratio_is_strictly_increasing(
        standard in 0.1f64..1000.0,
        a in 0.0f64..1000.0,
        delta in 0.01f64..1000.0,
    ) {
        let spec = ParameterSpec::standard("x", 1.0, standard);
        let low = sub_index(a, &spec).unwrap();
        let high = sub_index(a + delta, &spec).unwrap();
        prop_assert!(high > low, "{} !> {}", high, low);
    }

    #[test]
    fn lower_is_better_is_strictly_decreasing_below_limit(
        limit in 1.0f64..1000.0,
        a_frac in 0.0f64..0.98,
        gap_frac in 0.01f64..0.02,
    ) {
        let spec = ParameterSpec::ideal_limit("x", 1.0, 0.0, limit, Response::LowerIsBetter);
        let a = a_frac * limit;
        let b = (a_frac + gap_frac) * limit;
        let qa = sub_index(a, &spec).unwrap();
        let qb = sub_index(b, &spec).unwrap();
        prop_assert!(qb < qa, "{} !< {}", qb, qa);
    }

    #[test]
    fn ideal_limit_exceedance_is_exactly_zero(
        ideal in -10.0f64..10.0,
        span in 0.1f64..100.0,
        excess in 0.001f64..1000.0,
        which in 0usize..3,
    ) {
        let response = [Response::IdealPoint, Response::LowerIsBetter, Response::Logarithmic][which];
        let limit = ideal + span;
        let spec = ParameterSpec::ideal_limit("x", 1.0, ideal, limit, response);
        prop_assert_eq!(sub_index(limit + excess, &spec), Some(0.0));
    }

    #[test]
    fn all_absent_samples_have_no_valid_data(present in proptest::collection::vec(any::<bool>(), 3)) {
        let mut sample = Sample::new();
        for (name, keep_key) in ["Chlorides", "Nitrates", "pH"].iter().zip(present) {
            if keep_key {
                sample.insert(*name, None);
            }
        }
        prop_assert_eq!(aggregate(&sample, &linear_set()), ScoreResult::no_valid_data());
    }

    #[test]
    fn batch_permutation_permutes_results(
        rows in proptest::collection::vec(sample_strategy(), 0..24),
        seed in any::<u64>(),
    ) {
        let set = linear_set();
        let forward = score_batch(&rows, &set);
        prop_assert_eq!(forward.len(), rows.len());

        let mut order: Vec<usize> = (0..rows.len()).collect();
        if !order.is_empty() {
            let len = order.len();
            order.rotate_left(usize::try_from(seed % len as u64).unwrap());
            order.reverse();
        }
        let permuted_rows: Vec<Sample> = order.iter().map(|&i| rows[i].clone()).collect();
        let permuted = score_batch(&permuted_rows, &set);

        for (position, &original) in order.iter().enumerate() {
            prop_assert_eq!(&permuted[position], &forward[original]);
            prop_assert_eq!(&forward[original], &aggregate(&rows[original], &set));
        }
    }

    #[test]
    fn classification_is_total(wqi in -1000.0f64..1000.0) {
        prop_assert!(!classify_ascending(wqi).is_empty());
        prop_assert!(!classify_descending(wqi).is_empty());
    }
}

#[test]
fn springs_style_neutral_ph_alone_is_excellent() {
    let set = ParameterSet::new(
        "Springs",
        ScoringModel::LinearRatio,
        vec![ParameterSpec::range("pH", 0.076_599, 6.5, 9.5)],
    )
    .unwrap();
    let result = aggregate(&Sample::new().with("pH", 7.0), &set);
    assert_eq!(result.wqi, Some(0.0));
    assert_eq!(result.class_label, "Excellent water");
}
