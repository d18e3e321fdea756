//! Bounded log tailing.
//!
//! Reads the most recent lines of each configured log file. Missing or
//! unreadable files are skipped -- a monitored program rotating or deleting
//! its log must never fail the monitoring loop.

use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Maximum lines retained per file per collection.
pub const TAIL_LINES: usize = 100;

/// Tail a single file, returning at most `max` trailing lines.
pub fn tail_lines(path: impl AsRef<Path>, max: usize) -> Vec<String> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "skipping unreadable log file");
            return Vec::new();
        }
    };

    let mut tail: VecDeque<String> = VecDeque::with_capacity(max);
    for line in BufReader::new(file).lines() {
        let Ok(line) = line else {
            // Torn or non-UTF8 line mid-rotation; skip it.
            continue;
        };
        if tail.len() == max {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into_iter().collect()
}

/// Collects recent lines across a fixed set of log files.
///
/// Remembers each file's size between collections and only re-reads files
/// that changed, so an idle log is not rescanned on every cadence. A file
/// that shrank (rotation) is treated as changed and re-read from the tail.
pub struct LogTailer {
    files: Vec<PathBuf>,
    sizes: HashMap<PathBuf, u64>,
}

impl LogTailer {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            sizes: HashMap::new(),
        }
    }

    /// Trailing lines of every configured file that changed since the last
    /// collection.
    pub fn collect(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        for path in &self.files {
            let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            if self.sizes.insert(path.clone(), size) == Some(size) {
                continue;
            }
            lines.extend(tail_lines(path, TAIL_LINES));
        }
        lines
    }
}
