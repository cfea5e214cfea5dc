//! logsift: rate log lines by severity
//!
//! # Usage
//!
//! ```bash
//! # Rate a line (default mode)
//! logsift --model model.json "kernel: disk I/O error on sda"
//!
//! # Teach the model a label for some text
//! logsift --model model.json --learn critical "raid array degraded"
//!
//! # Rate everything appended to a log since the last run
//! logsift --model model.json --bookmark syslog.offset --log /var/log/syslog
//!
//! # Same, feeding every result back into the model
//! logsift --model model.json --bookmark syslog.offset --log /var/log/syslog --autolearn
//! ```

use anyhow::Context;
use clap::Parser;
use logsift::bayes::bootstrap::bootstrap_model;
use logsift::bayes::{labels, Classifier};
use logsift::cursor::decode_line;
use logsift::{
    run_tail, Config, LogCursor, LogsiftError, ModelStore, Rater, TailOptions, Tokenizer,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "logsift", version)]
#[command(about = "Classify log lines by severity with a Naive Bayes model", long_about = None)]
struct Cli {
    /// Model file, created from the bootstrap vocabulary if absent
    #[arg(short, long)]
    model: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Learn the text under this label instead of rating it
    #[arg(short, long, value_name = "LABEL", conflicts_with_all = ["bookmark", "log"])]
    learn: Option<String>,

    /// Bookmark file for tail mode
    #[arg(short, long, requires = "log")]
    bookmark: Option<PathBuf>,

    /// Log file for tail mode
    #[arg(short = 'f', long, requires = "bookmark")]
    log: Option<PathBuf>,

    /// Print per-label and per-word scores to stderr
    #[arg(short, long)]
    explain: bool,

    /// Learn from every line classified in tail mode
    #[arg(short, long, requires = "bookmark")]
    autolearn: bool,

    /// Text to rate or learn; stdin lines are used when omitted
    #[arg(conflicts_with = "bookmark")]
    text: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("Starting logsift v{}", env!("CARGO_PKG_VERSION"));

    let store = ModelStore::new(&cli.model);
    let loaded = store
        .load()
        .with_context(|| format!("loading model {}", store.path().display()))?;

    let (model, fresh) = match loaded {
        Some(mut model) => {
            model.set_retention(config.model.retention);
            (model, false)
        }
        None => {
            info!("No model at {}, bootstrapping", store.path().display());
            (bootstrap_model(config.model.kind, config.model.retention)?, true)
        }
    };

    let mut rater = Rater::new(model, Tokenizer::new()?, &config.explain);
    if fresh {
        rater.mark_dirty();
    }

    if let (Some(bookmark), Some(log)) = (&cli.bookmark, &cli.log) {
        let cursor = LogCursor::new(log, bookmark, config.tail.truncation);
        let options = TailOptions {
            autolearn: cli.autolearn,
        };

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let stderr = std::io::stderr();
        let mut diag = stderr.lock();
        let explain: Option<&mut dyn Write> = if cli.explain { Some(&mut diag) } else { None };

        let report = run_tail(&mut rater, &cursor, &store, options, &mut out, explain)
            .with_context(|| format!("tailing {}", log.display()))?;

        if report.baseline {
            info!("Baseline recorded at offset {}", report.offset);
        }
        return Ok(());
    }

    let texts = input_texts(&cli.text)?;

    match &cli.learn {
        Some(label) => {
            let label = label.trim().to_lowercase();
            if label.is_empty() {
                return Err(
                    LogsiftError::Config("--learn needs a non-empty label".to_string()).into(),
                );
            }

            let labels = labels([label.as_str()]);
            for text in &texts {
                rater.learn(text, &labels)?;
            }

            store
                .save(rater.model())
                .with_context(|| format!("saving model {}", store.path().display()))?;
            println!("Learned {} line(s) as {}", texts.len(), label);
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let stderr = std::io::stderr();
            let mut diag = stderr.lock();

            for text in &texts {
                let classification = rater.rate(text)?;
                writeln!(out, "{}", classification)?;
                if cli.explain {
                    rater.explain(&classification, &mut diag)?;
                }
            }
            out.flush()?;

            if rater.is_dirty() {
                store
                    .save(rater.model())
                    .with_context(|| format!("saving model {}", store.path().display()))?;
            }
        }
    }

    debug!(
        "Done, model holds {} instances over {} words",
        rater.model().instance_count(),
        rater.model().vocabulary_size()
    );

    Ok(())
}

/// Positional text joined into one line, or every stdin line when none was given.
///
/// Stdin is decoded the same way as log lines, so invalid UTF-8 is replaced
/// rather than rejected.
fn input_texts(args: &[String]) -> anyhow::Result<Vec<String>> {
    if !args.is_empty() {
        return Ok(vec![args.join(" ")]);
    }

    let stdin = std::io::stdin();
    let mut reader = stdin.lock();
    let mut texts = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).context("reading stdin")? == 0 {
            break;
        }
        texts.push(decode_line(&buf));
    }
    Ok(texts)
}
