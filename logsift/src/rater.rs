//! Line rating
//!
//! A [`Rater`] owns the model and the tokenizer and turns one raw line into a
//! [`Classification`]: the best label, the per-label scores and the words
//! that pushed hardest towards that label.

use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use tracing::debug;

use crate::bayes::{best_label, labels, Attributes, Classifier, Labels, Model, Scores};
use crate::config::ExplainConfig;
use crate::error::{LogsiftError, Result};
use crate::tokenizer::Tokenizer;

/// A word singled out as evidence for the chosen label
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub word: String,
    /// Score of the chosen label when the word is rated alone
    pub contribution: f64,
}

/// Result of rating one line
#[derive(Debug, Clone)]
pub struct Classification {
    /// Winning label
    pub label: String,
    /// Original line text
    pub line: String,
    /// Rescaled scores for every label
    pub scores: Scores,
    /// Strongest words, best first
    pub highlights: Vec<Highlight>,
    /// Attribute set the line was rated on
    pub attributes: Attributes,
    /// Tokens in line order
    pub tokens: Vec<String>,
}

impl fmt::Display for Classification {
    /// `LABEL<TAB><TAB>line<TAB>{word} {word}`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<String> = self
            .highlights
            .iter()
            .map(|h| format!("{{{}}}", h.word))
            .collect();

        write!(
            f,
            "{}\t\t{}\t{}",
            self.label.to_uppercase(),
            self.line,
            words.join(" ")
        )
    }
}

/// Classifies lines with an owned model
pub struct Rater {
    model: Model,
    tokenizer: Tokenizer,
    top_words: usize,
    min_contribution: f64,
    dirty: bool,
}

impl Rater {
    pub fn new(model: Model, tokenizer: Tokenizer, explain: &ExplainConfig) -> Self {
        Self {
            model,
            tokenizer,
            top_words: explain.top_words,
            min_contribution: explain.min_contribution,
            dirty: false,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Whether the model changed since it was handed over
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag the model as needing to be saved
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Rate one line
    pub fn rate(&self, line: &str) -> Result<Classification> {
        let tokens = self.tokenizer.tokenize(line);
        let attributes: Attributes = tokens.iter().map(|t| (t.clone(), 1)).collect();

        let scores = self.model.predict(&attributes)?;
        let label = best_label(&scores)
            .map(|(label, _)| label.to_string())
            .ok_or(LogsiftError::ModelNotTrained)?;

        let highlights = self.highlights(&tokens, &label)?;

        Ok(Classification {
            label,
            line: line.to_string(),
            scores,
            highlights,
            attributes,
            tokens,
        })
    }

    /// Teach the model that `line` carries `labels`, then retrain
    pub fn learn(&mut self, line: &str, labels: &Labels) -> Result<()> {
        let attributes = self.tokenizer.attributes(line);
        self.learn_attributes(&attributes, labels)
    }

    /// Teach the model an already tokenized attribute set, then retrain
    pub fn learn_attributes(&mut self, attributes: &Attributes, labels: &Labels) -> Result<()> {
        self.model.add_instance(attributes, labels)?;
        self.model.train()?;
        self.dirty = true;

        debug!(
            "Learned {} words as {:?}, model now holds {} instances",
            attributes.len(),
            labels,
            self.model.instance_count()
        );

        Ok(())
    }

    /// Feed a classification back into the model under its own label
    pub fn reinforce(&mut self, classification: &Classification) -> Result<()> {
        self.learn_attributes(
            &classification.attributes,
            &labels([classification.label.as_str()]),
        )
    }

    /// Write a per-label and per-word score breakdown
    pub fn explain(&self, classification: &Classification, out: &mut dyn Write) -> Result<()> {
        let labels = self.model.labels();

        writeln!(out, "line: {}", classification.line)?;
        for label in &labels {
            let score = classification.scores.get(label).copied().unwrap_or(0.0);
            let marker = if *label == classification.label { "*" } else { " " };
            writeln!(out, "  {} {:<12} {:.6}", marker, label, score)?;
        }

        write!(out, "  {:<20}", "word")?;
        for label in &labels {
            write!(out, " {:>10}", label)?;
        }
        writeln!(out)?;

        let mut seen = BTreeSet::new();
        for token in &classification.tokens {
            if !seen.insert(token.as_str()) {
                continue;
            }

            write!(out, "  {:<20}", token)?;
            if self.model.is_known(token) {
                let scores = self.model.predict(&single(token))?;
                for label in &labels {
                    write!(out, " {:>10.4}", scores.get(label).copied().unwrap_or(0.0))?;
                }
            } else {
                write!(out, " {:>10}", "(unseen)")?;
            }
            writeln!(out)?;
        }

        Ok(())
    }

    /// Rate every distinct token alone and keep the strongest for `label`.
    ///
    /// A word the model has never seen scores the label's prior.
    fn highlights(&self, tokens: &[String], label: &str) -> Result<Vec<Highlight>> {
        let mut seen = BTreeSet::new();
        let mut scored = Vec::new();

        for token in tokens {
            if !seen.insert(token.as_str()) {
                continue;
            }

            let scores = self.model.predict(&single(token))?;
            scored.push(Highlight {
                word: token.clone(),
                contribution: scores.get(label).copied().unwrap_or(0.0),
            });
        }

        // stable: equal contributions keep line order
        scored.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
        scored.truncate(self.top_words);
        scored.retain(|h| h.contribution > self.min_contribution);

        Ok(scored)
    }
}

fn single(token: &str) -> Attributes {
    [(token.to_string(), 1)].into_iter().collect()
}
