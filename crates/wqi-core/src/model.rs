use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregation;
use crate::classify::ClassPolicy;
use crate::error::{ModelError, ScoreError};

/// How an ideal/limit parameter maps its measurement onto the 0..100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    /// Linear from the ideal point towards the limit.
    #[default]
    IdealPoint,
    /// Only "less is better" matters; the ideal point is ignored.
    LowerIsBetter,
    /// Count data scored on a log10 scale (coliform style).
    Logarithmic,
}

/// Reference values a measurement is compared against.
///
/// Serialized flat, the same way the parameter tables are authored:
/// `{"standard": 250}`, `{"low": 6.5, "high": 9.5}` or
/// `{"ideal": 7.0, "limit": 8.5, "response": "ideal_point"}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    IdealLimit {
        ideal: f64,
        limit: f64,
        #[serde(default)]
        response: Response,
    },
    Range {
        low: f64,
        high: f64,
    },
    Standard {
        standard: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub weight: f64,
    /// Display only.
    #[serde(default)]
    pub unit: String,
    #[serde(flatten)]
    pub reference: Reference,
}

impl ParameterSpec {
    pub fn standard(name: impl Into<String>, weight: f64, standard: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            unit: String::new(),
            reference: Reference::Standard { standard },
        }
    }

    pub fn range(name: impl Into<String>, weight: f64, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            unit: String::new(),
            reference: Reference::Range { low, high },
        }
    }

    pub fn ideal_limit(
        name: impl Into<String>,
        weight: f64,
        ideal: f64,
        limit: f64,
        response: Response,
    ) -> Self {
        Self {
            name: name.into(),
            weight,
            unit: String::new(),
            reference: Reference::IdealLimit {
                ideal,
                limit,
                response,
            },
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }
}

/// The two independently evolved scoring models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringModel {
    /// Measurement / standard ratios, weights pre-normalized by the table author.
    LinearRatio,
    /// Ideal/limit sub-indices averaged over the participating weight.
    IdealLimit,
}

impl ScoringModel {
    pub const fn aggregation(self) -> Aggregation {
        match self {
            Self::LinearRatio => Aggregation::WeightedSum,
            Self::IdealLimit => Aggregation::WeightedMean,
        }
    }

    pub const fn default_policy(self) -> ClassPolicy {
        match self {
            Self::LinearRatio => ClassPolicy::AscendingBad,
            Self::IdealLimit => ClassPolicy::DescendingGood,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::LinearRatio => "linear_ratio",
            Self::IdealLimit => "ideal_limit",
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawParameterSet {
    name: String,
    model: ScoringModel,
    #[serde(default)]
    classification: Option<ClassPolicy>,
    parameters: Vec<ParameterSpec>,
}

/// A named, immutable table of parameter specs for one kind of water body.
///
/// Parameters keep their authoring order, which is also the column order
/// used on export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameterSet")]
pub struct ParameterSet {
    name: String,
    model: ScoringModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    classification: Option<ClassPolicy>,
    parameters: Vec<ParameterSpec>,
}

impl TryFrom<RawParameterSet> for ParameterSet {
    type Error = ModelError;

    fn try_from(raw: RawParameterSet) -> Result<Self, Self::Error> {
        let mut set = Self::new(raw.name, raw.model, raw.parameters)?;
        set.classification = raw.classification;
        Ok(set)
    }
}

impl ParameterSet {
    pub fn new(
        name: impl Into<String>,
        model: ScoringModel,
        parameters: Vec<ParameterSpec>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::EmptySetName);
        }

        let mut seen = HashSet::with_capacity(parameters.len());
        for spec in &parameters {
            if spec.name.trim().is_empty() {
                return Err(ModelError::EmptyName { set: name });
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(ModelError::DuplicateParameter {
                    set: name,
                    parameter: spec.name.clone(),
                });
            }
        }

        Ok(Self {
            name,
            model,
            classification: None,
            parameters,
        })
    }

    /// Replaces the model's default classification table.
    pub fn with_policy(mut self, policy: ClassPolicy) -> Self {
        self.classification = Some(policy);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn model(&self) -> ScoringModel {
        self.model
    }

    pub fn policy(&self) -> ClassPolicy {
        self.classification
            .unwrap_or_else(|| self.model.default_policy())
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|spec| spec.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|spec| spec.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.parameters.iter().map(|spec| spec.weight).sum()
    }
}

/// One set of measurements. A `None` entry is an explicit absence and is
/// never confused with a measured `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sample {
    values: BTreeMap<String, Option<f64>>,
}

impl Sample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), Some(value));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<f64>) {
        self.values.insert(name.into(), value);
    }

    /// The measured value, or `None` when missing or explicitly absent.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied().flatten()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Sample {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), Some(value)))
                .collect(),
        }
    }
}

/// Outcome of scoring one sample.
///
/// `wqi` is `None` exactly when nothing in the sample could be scored; the
/// label then carries the diagnostic message instead of a class name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub wqi: Option<f64>,
    pub class_label: String,
}

impl ScoreResult {
    pub fn scored(wqi: f64, class_label: impl Into<String>) -> Self {
        Self {
            wqi: Some(wqi),
            class_label: class_label.into(),
        }
    }

    pub fn no_valid_data() -> Self {
        Self {
            wqi: None,
            class_label: ScoreError::NoValidData.to_string(),
        }
    }

    pub const fn is_scored(&self) -> bool {
        self.wqi.is_some()
    }

    /// Score and label, or the reason there is none. Callers gate any
    /// chart or export on this.
    pub fn outcome(&self) -> Result<(f64, &str), ScoreError> {
        self.wqi
            .map(|wqi| (wqi, self.class_label.as_str()))
            .ok_or(ScoreError::NoValidData)
    }
}
