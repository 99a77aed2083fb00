use serde::{Deserialize, Serialize};

/// Threshold tables mapping a WQI score onto a quality band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassPolicy {
    /// Lower is better; used with the linear-ratio model.
    AscendingBad,
    /// Higher is better; used with the ideal/limit model.
    DescendingGood,
}

impl ClassPolicy {
    pub fn classify(self, wqi: f64) -> &'static str {
        match self {
            Self::AscendingBad => classify_ascending(wqi),
            Self::DescendingGood => classify_descending(wqi),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AscendingBad => "ascending_bad",
            Self::DescendingGood => "descending_good",
        }
    }

    /// Labels in the order the table is evaluated.
    pub const fn bands(self) -> &'static [&'static str] {
        match self {
            Self::AscendingBad => &[
                "Excellent water",
                "Good water",
                "Poor water",
                "Very poor water",
                "Unsuitable for drinking",
            ],
            Self::DescendingGood => &["Excellent", "Good", "Medium", "Poor", "Very Poor"],
        }
    }
}

pub fn classify(wqi: f64, policy: ClassPolicy) -> &'static str {
    policy.classify(wqi)
}

/// The first band is strict (`< 50`), the rest inclusive.
pub fn classify_ascending(wqi: f64) -> &'static str {
    if wqi < 50.0 {
        "Excellent water"
    } else if wqi <= 100.0 {
        "Good water"
    } else if wqi <= 200.0 {
        "Poor water"
    } else if wqi <= 300.0 {
        "Very poor water"
    } else {
        "Unsuitable for drinking"
    }
}

/// All tests strict; `Very Poor` catches everything at or below 25.
pub fn classify_descending(wqi: f64) -> &'static str {
    if wqi > 90.0 {
        "Excellent"
    } else if wqi > 70.0 {
        "Good"
    } else if wqi > 50.0 {
        "Medium"
    } else if wqi > 25.0 {
        "Poor"
    } else {
        "Very Poor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascending_boundaries_are_exact() {
        assert_eq!(classify_ascending(49.999), "Excellent water");
        assert_eq!(classify_ascending(50.0), "Good water");
        assert_eq!(classify_ascending(100.0), "Good water");
        assert_eq!(classify_ascending(100.001), "Poor water");
        assert_eq!(classify_ascending(200.0), "Poor water");
        assert_eq!(classify_ascending(300.0), "Very poor water");
        assert_eq!(classify_ascending(300.5), "Unsuitable for drinking");
    }

    #[test]
    fn descending_boundaries_are_exact() {
        assert_eq!(classify_descending(90.5), "Excellent");
        assert_eq!(classify_descending(90.0), "Good");
        assert_eq!(classify_descending(70.0), "Medium");
        assert_eq!(classify_descending(50.0), "Poor");
        assert_eq!(classify_descending(25.001), "Poor");
        assert_eq!(classify_descending(25.0), "Very Poor");
        assert_eq!(classify_descending(0.0), "Very Poor");
    }

    #[test]
    fn every_label_belongs_to_its_policy() {
        for policy in [ClassPolicy::AscendingBad, ClassPolicy::DescendingGood] {
            for wqi in [-10.0, 0.0, 26.0, 55.0, 75.0, 95.0, 150.0, 250.0, 400.0] {
                assert!(policy.bands().contains(&policy.classify(wqi)));
            }
        }
    }
}
