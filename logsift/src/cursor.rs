//! Log cursor
//!
//! Tracks how far a log file has been classified across invocations. The
//! position is a byte offset kept in a plain-text bookmark file.
//!
//! The first invocation only records the current end of file. Later
//! invocations read every complete line appended since the bookmark; an
//! unterminated last line is left for the next run. Nothing here writes the
//! bookmark implicitly: callers [`LogCursor::commit`] a [`Batch`] once it has
//! been fully processed, so a failed pass never advances the cursor.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{LogsiftError, Result};
use crate::store::write_atomic;

/// Where to restart when the log is shorter than the bookmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// Start over from offset 0, so a rotated file is read from its beginning
    #[default]
    Reset,
    /// Continue from the new, smaller end of file
    Clamp,
}

/// Bookmark state at the start of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No usable bookmark
    FirstRun,
    /// Bookmark holds a valid offset
    Resuming { offset: u64 },
}

/// Parse bookmark file content
pub fn parse_bookmark(content: &str) -> Result<u64> {
    let trimmed = content.trim();
    trimmed
        .parse::<u64>()
        .map_err(|_| LogsiftError::MalformedBookmark(format!("'{}' is not a byte offset", trimmed)))
}

/// Bookmark file holding a single byte offset
#[derive(Debug, Clone)]
pub struct Bookmark {
    path: PathBuf,
}

impl Bookmark {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored offset
    pub fn read(&self) -> Result<u64> {
        let content = fs::read_to_string(&self.path)?;
        parse_bookmark(&content)
    }

    /// Classify the bookmark; anything unreadable or malformed is a first run
    pub fn state(&self) -> CursorState {
        match self.read() {
            Ok(offset) => CursorState::Resuming { offset },
            Err(LogsiftError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No bookmark at {}", self.path.display());
                CursorState::FirstRun
            }
            Err(e) => {
                warn!("Ignoring bookmark {}: {}", self.path.display(), e);
                CursorState::FirstRun
            }
        }
    }

    /// Replace the stored offset
    pub fn write(&self, offset: u64) -> Result<()> {
        write_atomic(&self.path, format!("{}\n", offset).as_bytes())
    }
}

/// Lines read by one pass, with the offsets they span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Complete lines without their terminators
    pub lines: Vec<String>,
    /// Offset reading started from
    pub start: u64,
    /// Offset just past the last consumed line terminator
    pub end: u64,
    /// True when this pass only established the baseline
    pub baseline: bool,
    /// True when the log was found shorter than the bookmark
    pub truncated: bool,
}

impl Batch {
    fn baseline(size: u64) -> Self {
        Self {
            lines: Vec::new(),
            start: size,
            end: size,
            baseline: true,
            truncated: false,
        }
    }
}

/// Cursor over one log file
#[derive(Debug, Clone)]
pub struct LogCursor {
    log_path: PathBuf,
    bookmark: Bookmark,
    policy: TruncationPolicy,
}

impl LogCursor {
    pub fn new(
        log_path: impl Into<PathBuf>,
        bookmark_path: impl Into<PathBuf>,
        policy: TruncationPolicy,
    ) -> Self {
        Self {
            log_path: log_path.into(),
            bookmark: Bookmark::new(bookmark_path),
            policy,
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn bookmark(&self) -> &Bookmark {
        &self.bookmark
    }

    /// Read every complete line appended since the bookmark.
    ///
    /// The file size is sampled once when the file is opened; data appended
    /// while reading is left for the next pass.
    pub fn read_new(&self) -> Result<Batch> {
        let mut file = File::open(&self.log_path).map_err(|source| LogsiftError::LogUnavailable {
            path: self.log_path.clone(),
            source,
        })?;
        let size = file.metadata()?.len();

        let (start, truncated) = match self.bookmark.state() {
            CursorState::FirstRun => {
                info!(
                    "First run on {}: recording baseline at offset {}",
                    self.log_path.display(),
                    size
                );
                return Ok(Batch::baseline(size));
            }
            CursorState::Resuming { offset } if offset > size => {
                let start = match self.policy {
                    TruncationPolicy::Reset => 0,
                    TruncationPolicy::Clamp => size,
                };
                warn!(
                    "Log {} shrank from {} to {} bytes, restarting at {}",
                    self.log_path.display(),
                    offset,
                    size,
                    start
                );
                (start, true)
            }
            CursorState::Resuming { offset } => (offset, false),
        };

        file.seek(SeekFrom::Start(start))?;
        let mut reader = BufReader::new(file.take(size - start));

        let mut lines = Vec::new();
        let mut end = start;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            if read == 0 || buf.last() != Some(&b'\n') {
                break;
            }

            end += read as u64;
            lines.push(decode_line(&buf));
        }

        if end < size {
            debug!("Leaving {} bytes of partial line for the next run", size - end);
        }

        debug!(
            "Read {} lines from {} ({}..{})",
            lines.len(),
            self.log_path.display(),
            start,
            end
        );

        Ok(Batch {
            lines,
            start,
            end,
            baseline: false,
            truncated,
        })
    }

    /// Persist the end of a processed batch as the new bookmark
    pub fn commit(&self, batch: &Batch) -> Result<()> {
        self.bookmark.write(batch.end)?;
        debug!("Bookmark {} set to {}", self.bookmark.path().display(), batch.end);
        Ok(())
    }
}

/// Strip the line terminator (`\n` or `\r\n`) and decode, replacing invalid UTF-8
pub fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        log: PathBuf,
        bookmark: PathBuf,
    }

    fn fixture(content: &str) -> Fixture {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("app.log");
        let bookmark = dir.path().join("app.bookmark");
        fs::write(&log, content).unwrap();
        Fixture {
            _dir: dir,
            log,
            bookmark,
        }
    }

    fn append(path: &Path, content: &str) {
        let mut file = fs::OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_parse_bookmark() {
        assert_eq!(parse_bookmark("42\n").unwrap(), 42);
        assert_eq!(parse_bookmark("  7 ").unwrap(), 7);
        assert!(matches!(parse_bookmark("-1"), Err(LogsiftError::MalformedBookmark(_))));
        assert!(matches!(parse_bookmark("abc"), Err(LogsiftError::MalformedBookmark(_))));
        assert!(matches!(parse_bookmark(""), Err(LogsiftError::MalformedBookmark(_))));
    }

    #[test]
    fn test_bookmark_roundtrip() {
        let f = fixture("");
        let bookmark = Bookmark::new(&f.bookmark);
        assert_eq!(bookmark.state(), CursorState::FirstRun);

        bookmark.write(1234).unwrap();
        assert_eq!(fs::read_to_string(&f.bookmark).unwrap(), "1234\n");
        assert_eq!(bookmark.state(), CursorState::Resuming { offset: 1234 });
    }

    #[test]
    fn test_first_run_records_baseline() {
        let f = fixture("old line one\nold line two\n");
        let cursor = LogCursor::new(&f.log, &f.bookmark, TruncationPolicy::Reset);

        let batch = cursor.read_new().unwrap();
        assert!(batch.baseline);
        assert!(batch.lines.is_empty());
        assert_eq!(batch.end, 26);
        assert!(!f.bookmark.exists());

        cursor.commit(&batch).unwrap();
        assert_eq!(fs::read_to_string(&f.bookmark).unwrap(), "26\n");
    }

    #[test]
    fn test_malformed_bookmark_is_first_run() {
        let f = fixture("line\n");
        fs::write(&f.bookmark, "garbage").unwrap();
        let cursor = LogCursor::new(&f.log, &f.bookmark, TruncationPolicy::Reset);

        let batch = cursor.read_new().unwrap();
        assert!(batch.baseline);
        assert_eq!(batch.end, 5);
    }

    #[test]
    fn test_resume_reads_appended_lines() {
        let f = fixture("old\n");
        fs::write(&f.bookmark, "4\n").unwrap();
        append(&f.log, "disk error\nall good\n");
        let cursor = LogCursor::new(&f.log, &f.bookmark, TruncationPolicy::Reset);

        let batch = cursor.read_new().unwrap();
        assert!(!batch.baseline);
        assert_eq!(batch.lines, vec!["disk error", "all good"]);
        assert_eq!(batch.start, 4);
        assert_eq!(batch.end, 24);
    }

    #[test]
    fn test_partial_line_is_left_for_next_run() {
        let f = fixture("");
        fs::write(&f.bookmark, "0").unwrap();
        append(&f.log, "complete\nhalf writ");
        let cursor = LogCursor::new(&f.log, &f.bookmark, TruncationPolicy::Reset);

        let batch = cursor.read_new().unwrap();
        assert_eq!(batch.lines, vec!["complete"]);
        assert_eq!(batch.end, 9);
        cursor.commit(&batch).unwrap();

        append(&f.log, "ten\n");
        let batch = cursor.read_new().unwrap();
        assert_eq!(batch.lines, vec!["half written"]);
        assert_eq!(batch.start, 9);
    }

    #[test]
    fn test_crlf_and_invalid_utf8() {
        let f = fixture("");
        fs::write(&f.bookmark, "0").unwrap();
        fs::write(&f.log, b"windows line\r\nbad \xff byte\n").unwrap();
        let cursor = LogCursor::new(&f.log, &f.bookmark, TruncationPolicy::Reset);

        let batch = cursor.read_new().unwrap();
        assert_eq!(batch.lines[0], "windows line");
        assert_eq!(batch.lines[1], "bad \u{fffd} byte");
    }

    #[test]
    fn test_no_new_data() {
        let f = fixture("same\n");
        fs::write(&f.bookmark, "5").unwrap();
        let cursor = LogCursor::new(&f.log, &f.bookmark, TruncationPolicy::Reset);

        let batch = cursor.read_new().unwrap();
        assert!(batch.lines.is_empty());
        assert_eq!(batch.end, 5);
    }

    #[test]
    fn test_truncation_reset_rereads_from_start() {
        let f = fixture("rotated one\nrotated two\n");
        fs::write(&f.bookmark, "1000").unwrap();
        let cursor = LogCursor::new(&f.log, &f.bookmark, TruncationPolicy::Reset);

        let batch = cursor.read_new().unwrap();
        assert!(batch.truncated);
        assert_eq!(batch.start, 0);
        assert_eq!(batch.lines, vec!["rotated one", "rotated two"]);
        assert_eq!(batch.end, 24);
    }

    #[test]
    fn test_truncation_clamp_skips_to_end() {
        let f = fixture("rotated one\nrotated two\n");
        fs::write(&f.bookmark, "1000").unwrap();
        let cursor = LogCursor::new(&f.log, &f.bookmark, TruncationPolicy::Clamp);

        let batch = cursor.read_new().unwrap();
        assert!(batch.truncated);
        assert!(batch.lines.is_empty());
        assert_eq!(batch.start, 24);
        assert_eq!(batch.end, 24);
    }

    #[test]
    fn test_missing_log_is_unavailable() {
        let f = fixture("");
        fs::write(&f.bookmark, "3\n").unwrap();
        let cursor = LogCursor::new(f.log.with_extension("missing"), &f.bookmark, TruncationPolicy::Reset);

        let result = cursor.read_new();
        assert!(matches!(result, Err(LogsiftError::LogUnavailable { .. })));
        assert_eq!(fs::read_to_string(&f.bookmark).unwrap(), "3\n");
    }
}
