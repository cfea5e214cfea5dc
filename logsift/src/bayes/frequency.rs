//! Frequency-based Naive Bayes
//!
//! Instances are folded into an [`Accumulator`] of counts. Training turns the
//! counts into log-probability [`TrainedTables`] with add-one smoothing;
//! prediction sums log-probabilities in log space and rescales at the end.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::{rescale, Attributes, Classifier, Labels, Scores};
use crate::error::{LogsiftError, Result};

/// What happens to the accumulated counts after a successful `train`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
    /// Keep counts, so later instances are trained on top of history
    #[default]
    Retain,
    /// Discard counts; the next `train` only sees instances added after it
    Purge,
}

/// Pre-training counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Accumulator {
    /// Attribute weight across all instances
    pub attribute_totals: BTreeMap<String, u64>,
    /// Number of instances per label
    pub label_counts: BTreeMap<String, u64>,
    /// Attribute weight per label
    pub label_attribute_totals: BTreeMap<String, BTreeMap<String, u64>>,
    /// Instances added
    pub instance_count: u64,
}

impl Accumulator {
    /// Fold one instance into the counts
    pub fn add(&mut self, attributes: &Attributes, labels: &Labels) {
        self.instance_count += 1;

        for (attribute, &weight) in attributes {
            *self.attribute_totals.entry(attribute.clone()).or_insert(0) += u64::from(weight);
        }

        for label in labels {
            *self.label_counts.entry(label.clone()).or_insert(0) += 1;

            let totals = self.label_attribute_totals.entry(label.clone()).or_default();
            for (attribute, &weight) in attributes {
                *totals.entry(attribute.clone()).or_insert(0) += u64::from(weight);
            }
        }
    }

    /// Sum of attribute weights observed under `label`
    pub fn label_token_total(&self, label: &str) -> u64 {
        self.label_attribute_totals
            .get(label)
            .map(|totals| totals.values().sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.instance_count == 0
    }
}

/// Post-training log-probability tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedTables {
    /// ln(P(label))
    pub prior_log_prob: BTreeMap<String, f64>,
    /// Log-probability of an attribute never seen under the label
    pub smoother_log_prob: BTreeMap<String, f64>,
    /// ln(P(attribute | label)) for attributes observed under the label
    pub attribute_log_prob: BTreeMap<String, BTreeMap<String, f64>>,
    /// Every attribute seen at training time
    pub known_attributes: BTreeSet<String>,
    /// Number of distinct attributes at training time
    pub vocabulary_size: usize,
}

impl TrainedTables {
    /// Compute tables from the counts
    pub fn from_accumulator(acc: &Accumulator) -> Result<Self> {
        if acc.is_empty() {
            return Err(LogsiftError::NoTrainingData);
        }

        let instances = acc.instance_count as f64;
        let vocabulary_size = acc.attribute_totals.len();

        let mut prior_log_prob = BTreeMap::new();
        let mut smoother_log_prob = BTreeMap::new();
        let mut attribute_log_prob = BTreeMap::new();

        for (label, &count) in &acc.label_counts {
            prior_log_prob.insert(label.clone(), (count as f64 / instances).ln());

            // max(1) keeps the smoother finite when nothing was ever observed
            let denominator =
                ((acc.label_token_total(label) + vocabulary_size as u64).max(1) as f64).ln();
            smoother_log_prob.insert(label.clone(), -denominator);

            let per_attribute = acc
                .label_attribute_totals
                .get(label)
                .map(|totals| {
                    totals
                        .iter()
                        .map(|(attr, &c)| (attr.clone(), ((c + 1) as f64).ln() - denominator))
                        .collect::<BTreeMap<_, _>>()
                })
                .unwrap_or_default();
            attribute_log_prob.insert(label.clone(), per_attribute);
        }

        Ok(Self {
            prior_log_prob,
            smoother_log_prob,
            attribute_log_prob,
            known_attributes: acc.attribute_totals.keys().cloned().collect(),
            vocabulary_size,
        })
    }

    /// Log-probability of `attribute` under `label`, falling back to the smoother
    pub fn attribute_log_prob(&self, label: &str, attribute: &str) -> f64 {
        self.attribute_log_prob
            .get(label)
            .and_then(|probs| probs.get(attribute))
            .or_else(|| self.smoother_log_prob.get(label))
            .copied()
            .unwrap_or(f64::NEG_INFINITY)
    }

    /// Unscaled log-space scores; unknown attributes contribute nothing
    pub fn log_scores(&self, attributes: &Attributes) -> Scores {
        let mut scores = self.prior_log_prob.clone();

        for (attribute, &weight) in attributes {
            if !self.known_attributes.contains(attribute) {
                continue;
            }

            for (label, score) in scores.iter_mut() {
                *score += self.attribute_log_prob(label, attribute) * f64::from(weight);
            }
        }

        scores
    }
}

/// Word frequency Naive Bayes model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrequencyModel {
    #[serde(default)]
    retention: Retention,
    #[serde(default)]
    accumulator: Accumulator,
    #[serde(default)]
    trained: Option<TrainedTables>,
}

impl FrequencyModel {
    /// Create an empty model
    pub fn new(retention: Retention) -> Self {
        Self {
            retention,
            accumulator: Accumulator::default(),
            trained: None,
        }
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    pub fn set_retention(&mut self, retention: Retention) {
        self.retention = retention;
    }

    /// Counts accumulated since creation or the last purge
    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Tables from the last `train`, if any
    pub fn trained(&self) -> Option<&TrainedTables> {
        self.trained.as_ref()
    }
}

impl Classifier for FrequencyModel {
    fn add_instance(&mut self, attributes: &Attributes, labels: &Labels) -> Result<()> {
        if labels.is_empty() {
            return Err(LogsiftError::InvalidInstance(
                "instance must carry at least one label".to_string(),
            ));
        }

        self.accumulator.add(attributes, labels);
        Ok(())
    }

    fn train(&mut self) -> Result<()> {
        let tables = TrainedTables::from_accumulator(&self.accumulator)?;

        debug!(
            "Trained frequency model: {} instances, {} labels, {} words",
            self.accumulator.instance_count,
            tables.prior_log_prob.len(),
            tables.vocabulary_size
        );

        self.trained = Some(tables);

        if self.retention == Retention::Purge {
            self.accumulator = Accumulator::default();
        }

        Ok(())
    }

    fn predict(&self, attributes: &Attributes) -> Result<Scores> {
        let tables = self.trained.as_ref().ok_or(LogsiftError::ModelNotTrained)?;
        Ok(rescale(tables.log_scores(attributes)))
    }

    fn is_trained(&self) -> bool {
        self.trained.is_some()
    }

    fn is_known(&self, attribute: &str) -> bool {
        self.trained
            .as_ref()
            .map(|t| t.known_attributes.contains(attribute))
            .unwrap_or(false)
    }

    fn instance_count(&self) -> u64 {
        self.accumulator.instance_count
    }

    fn vocabulary_size(&self) -> usize {
        self.trained.as_ref().map(|t| t.vocabulary_size).unwrap_or(0)
    }

    fn labels(&self) -> Vec<String> {
        self.trained
            .as_ref()
            .map(|t| t.prior_log_prob.keys().cloned().collect())
            .unwrap_or_default()
    }
}
