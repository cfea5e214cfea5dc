//! Bootstrap vocabulary
//!
//! A fresh model is seeded with one single-word instance per entry below,
//! then trained, so the very first run already separates obvious failures
//! from routine chatter.

use tracing::info;

use super::{labels, Attributes, Classifier, Model, ModelKind, Retention};
use crate::error::Result;

pub const CRITICAL: &str = "critical";
pub const WARNING: &str = "warning";
pub const NOTICE: &str = "notice";
pub const IGNORE: &str = "ignore";

/// Seed instances: word and the label it is taught under.
///
/// Routine chatter is the largest group so lines with no known words fall
/// back to `ignore`; every other group stays large enough that a single
/// matching word outweighs the prior.
pub const SEED: &[(&str, &str)] = &[
    // Failure vocabulary
    ("critical", CRITICAL),
    ("error", CRITICAL),
    ("failed", CRITICAL),
    ("failure", CRITICAL),
    ("fatal", CRITICAL),
    ("panic", CRITICAL),
    ("crash", CRITICAL),
    ("segfault", CRITICAL),
    ("exception", CRITICAL),
    ("refused", CRITICAL),
    // Degraded but running
    ("warning", WARNING),
    ("warn", WARNING),
    ("deprecated", WARNING),
    ("retry", WARNING),
    ("timeout", WARNING),
    ("slow", WARNING),
    ("degraded", WARNING),
    ("unreachable", WARNING),
    // State changes worth a look
    ("notice", NOTICE),
    ("changed", NOTICE),
    ("reload", NOTICE),
    ("reloaded", NOTICE),
    ("restart", NOTICE),
    ("restarted", NOTICE),
    // Routine chatter
    ("info", IGNORE),
    ("debug", IGNORE),
    ("ok", IGNORE),
    ("success", IGNORE),
    ("succeeded", IGNORE),
    ("started", IGNORE),
    ("stopped", IGNORE),
    ("connected", IGNORE),
    ("disconnected", IGNORE),
    ("completed", IGNORE),
    ("accepted", IGNORE),
    ("session", IGNORE),
];

/// Feed every seed entry into `model` as an ordinary instance
pub fn seed<C: Classifier + ?Sized>(model: &mut C) -> Result<usize> {
    for (word, label) in SEED {
        let attributes: Attributes = [(word.to_string(), 1)].into_iter().collect();
        model.add_instance(&attributes, &labels([*label]))?;
    }

    Ok(SEED.len())
}

/// Create, seed and train a new model
pub fn bootstrap_model(kind: ModelKind, retention: Retention) -> Result<Model> {
    let mut model = Model::new(kind, retention);
    let seeded = seed(&mut model)?;
    model.train()?;

    info!("Bootstrapped new {} model with {} seed instances", kind, seeded);

    Ok(model)
}
