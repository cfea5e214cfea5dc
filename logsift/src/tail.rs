//! Tail mode
//!
//! One pass over the lines appended to a log since the last bookmark:
//! rate each line, print it, optionally learn from it, then persist the model
//! and finally the bookmark.
//!
//! Persistence order is model first, bookmark second. A crash between the two
//! writes leaves the bookmark behind the model, so the next run rates (and,
//! with autolearn, learns) the same lines again. Lines are never skipped.
//!
//! There is no locking: two concurrent passes over the same model or bookmark
//! race, and the last writer wins.

use std::io::Write;
use tracing::{debug, info};

use crate::cursor::LogCursor;
use crate::error::Result;
use crate::rater::Rater;
use crate::store::ModelStore;

/// Tail pass options
#[derive(Debug, Clone, Copy, Default)]
pub struct TailOptions {
    /// Feed every classification back into the model, retraining per line
    pub autolearn: bool,
}

/// Outcome of a tail pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailReport {
    /// Lines rated and printed
    pub classified: usize,
    /// Lines fed back into the model
    pub learned: usize,
    /// The pass only recorded the baseline offset
    pub baseline: bool,
    /// The log was shorter than the bookmark
    pub truncated: bool,
    /// Bookmark value written at the end of the pass
    pub offset: u64,
    /// The model file was rewritten
    pub model_saved: bool,
}

/// Run one tail pass.
///
/// Classifications go to `out`; with `explain` set, a score breakdown for
/// each line goes there too. Any error aborts the pass before the bookmark
/// is written.
pub fn run_tail(
    rater: &mut Rater,
    cursor: &LogCursor,
    store: &ModelStore,
    options: TailOptions,
    out: &mut dyn Write,
    mut explain: Option<&mut dyn Write>,
) -> Result<TailReport> {
    let batch = cursor.read_new()?;

    if batch.baseline {
        let model_saved = save_if_dirty(rater, store)?;
        cursor.commit(&batch)?;
        return Ok(TailReport {
            classified: 0,
            learned: 0,
            baseline: true,
            truncated: false,
            offset: batch.end,
            model_saved,
        });
    }

    let mut learned = 0;
    for line in &batch.lines {
        let classification = rater.rate(line)?;
        writeln!(out, "{}", classification)?;

        if let Some(diag) = explain.as_deref_mut() {
            rater.explain(&classification, diag)?;
        }

        if options.autolearn {
            rater.reinforce(&classification)?;
            learned += 1;
        }
    }
    out.flush()?;

    let model_saved = save_if_dirty(rater, store)?;
    cursor.commit(&batch)?;

    info!(
        "Classified {} lines from {} (offset {} -> {} in {}), learned {}",
        batch.lines.len(),
        cursor.log_path().display(),
        batch.start,
        batch.end,
        cursor.bookmark().path().display(),
        learned
    );

    Ok(TailReport {
        classified: batch.lines.len(),
        learned,
        baseline: false,
        truncated: batch.truncated,
        offset: batch.end,
        model_saved,
    })
}

fn save_if_dirty(rater: &Rater, store: &ModelStore) -> Result<bool> {
    if !rater.is_dirty() {
        debug!("Model unchanged, not saving");
        return Ok(false);
    }

    store.save(rater.model())?;
    Ok(true)
}
