//! Naive Bayes classification
//!
//! Models are driven through the [`Classifier`] capability. [`Model`] is the
//! persisted, serializable sum of all concrete variants; new variants are
//! added as enum arms behind the same trait.

pub mod bootstrap;
pub mod frequency;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{LogsiftError, Result};

pub use frequency::{Accumulator, FrequencyModel, Retention, TrainedTables};

/// Attribute (token) to non-negative weight
pub type Attributes = BTreeMap<String, u32>;

/// Labels attached to one instance
pub type Labels = BTreeSet<String>;

/// Label to score
pub type Scores = BTreeMap<String, f64>;

/// Incremental classifier capability
pub trait Classifier {
    /// Accumulate one observation under every label in `labels`.
    ///
    /// Has no effect on predictions until [`Classifier::train`] runs.
    fn add_instance(&mut self, attributes: &Attributes, labels: &Labels) -> Result<()>;

    /// Rebuild the trained tables from everything accumulated so far
    fn train(&mut self) -> Result<()>;

    /// Rescaled per-label scores for an attribute set
    fn predict(&self, attributes: &Attributes) -> Result<Scores>;

    /// Whether `train` has produced tables
    fn is_trained(&self) -> bool;

    /// Whether the trained model has seen `attribute`
    fn is_known(&self, attribute: &str) -> bool;

    /// Instances currently held by the accumulator
    fn instance_count(&self) -> u64;

    /// Distinct attributes known to the trained model
    fn vocabulary_size(&self) -> usize;

    /// Labels known to the trained model, in order
    fn labels(&self) -> Vec<String>;
}

/// Model variant selector used by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Word frequency Naive Bayes with add-one smoothing
    #[default]
    Frequency,
}

impl FromStr for ModelKind {
    type Err = LogsiftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "frequency" => Ok(ModelKind::Frequency),
            other => Err(LogsiftError::Config(format!("Unknown model kind '{}'", other))),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Frequency => write!(f, "frequency"),
        }
    }
}

/// A persisted classifier of any supported kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    Frequency(FrequencyModel),
}

impl Model {
    /// Create an empty, untrained model
    pub fn new(kind: ModelKind, retention: Retention) -> Self {
        match kind {
            ModelKind::Frequency => Model::Frequency(FrequencyModel::new(retention)),
        }
    }

    /// Kind of this model
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Frequency(_) => ModelKind::Frequency,
        }
    }

    /// Change the retention policy applied on the next `train`
    pub fn set_retention(&mut self, retention: Retention) {
        match self {
            Model::Frequency(model) => model.set_retention(retention),
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Model::Frequency(model) => model,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            Model::Frequency(model) => model,
        }
    }
}

impl Classifier for Model {
    fn add_instance(&mut self, attributes: &Attributes, labels: &Labels) -> Result<()> {
        self.inner_mut().add_instance(attributes, labels)
    }

    fn train(&mut self) -> Result<()> {
        self.inner_mut().train()
    }

    fn predict(&self, attributes: &Attributes) -> Result<Scores> {
        self.inner().predict(attributes)
    }

    fn is_trained(&self) -> bool {
        self.inner().is_trained()
    }

    fn is_known(&self, attribute: &str) -> bool {
        self.inner().is_known(attribute)
    }

    fn instance_count(&self) -> u64 {
        self.inner().instance_count()
    }

    fn vocabulary_size(&self) -> usize {
        self.inner().vocabulary_size()
    }

    fn labels(&self) -> Vec<String> {
        self.inner().labels()
    }
}

/// Convert log-scores into bounded relative likelihoods.
///
/// Every score is shifted by the maximum, exponentiated, and divided by the
/// L2 norm of the result. The output has unit norm and preserves ranking; it
/// is not a probability distribution.
pub fn rescale(mut scores: Scores) -> Scores {
    let max = scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return scores;
    }

    let mut total = 0.0f64;
    for score in scores.values_mut() {
        *score = (*score - max).exp();
        total += *score * *score;
    }

    let total = total.sqrt();
    for score in scores.values_mut() {
        *score /= total;
    }

    scores
}

/// Highest-scoring label; ties go to the lexicographically smallest label
pub fn best_label(scores: &Scores) -> Option<(&str, f64)> {
    let mut best: Option<(&str, f64)> = None;

    for (label, &score) in scores {
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((label.as_str(), score)),
        }
    }

    best
}

/// Build a label set from string slices
pub fn labels<I, S>(items: I) -> Labels
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn scores(pairs: &[(&str, f64)]) -> Scores {
        pairs.iter().map(|(l, s)| (l.to_string(), *s)).collect()
    }

    #[test]
    fn test_rescale_bounds_and_norm() {
        let rescaled = rescale(scores(&[("a", -1200.0), ("b", -1201.5), ("c", -1300.0)]));

        let norm: f64 = rescaled.values().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < EPSILON);
        assert!(rescaled.values().all(|&v| v > 0.0));
        assert!(rescaled.values().all(|&v| v <= 1.0));
        assert!(rescaled["a"] > rescaled["b"]);
        assert!(rescaled["b"] > rescaled["c"]);
        assert_eq!(best_label(&rescaled).unwrap().0, "a");
    }

    #[test]
    fn test_rescale_close_scores_stay_positive() {
        let rescaled = rescale(scores(&[("a", -10.0), ("b", -11.0), ("c", -12.0)]));
        assert!(rescaled.values().all(|&v| v > 0.0 && v <= 1.0));
    }

    #[test]
    fn test_rescale_single_label_is_one() {
        let rescaled = rescale(scores(&[("only", -42.0)]));
        assert!((rescaled["only"] - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_rescale_equal_scores() {
        let rescaled = rescale(scores(&[("a", -3.0), ("b", -3.0)]));
        let expected = 1.0 / 2f64.sqrt();
        assert!((rescaled["a"] - expected).abs() < EPSILON);
        assert!((rescaled["b"] - expected).abs() < EPSILON);
    }

    #[test]
    fn test_rescale_empty() {
        assert!(rescale(Scores::new()).is_empty());
    }

    #[test]
    fn test_best_label_tie_break_is_lexicographic() {
        let tied = scores(&[("warning", 0.5), ("critical", 0.5), ("ignore", 0.1)]);
        assert_eq!(best_label(&tied).unwrap().0, "critical");
        assert!(best_label(&Scores::new()).is_none());
    }

    #[test]
    fn test_model_kind_parse() {
        assert_eq!("frequency".parse::<ModelKind>().unwrap(), ModelKind::Frequency);
        assert_eq!("Frequency".parse::<ModelKind>().unwrap(), ModelKind::Frequency);
        assert!("bernoulli".parse::<ModelKind>().is_err());
        assert_eq!(ModelKind::Frequency.to_string(), "frequency");
    }

    #[test]
    fn test_model_dispatch() {
        let mut model = Model::new(ModelKind::Frequency, Retention::Retain);
        assert_eq!(model.kind(), ModelKind::Frequency);
        assert!(!model.is_trained());

        let attrs: Attributes = [("disk".to_string(), 1)].into_iter().collect();
        model.add_instance(&attrs, &labels(["critical"])).unwrap();
        model.train().unwrap();

        assert!(model.is_trained());
        assert_eq!(model.labels(), vec!["critical".to_string()]);
        assert_eq!(model.vocabulary_size(), 1);
    }
}
