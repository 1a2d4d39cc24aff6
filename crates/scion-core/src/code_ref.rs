//! Content-addressed pointers into a project tree
//!
//! A [`CodeRef`] remembers what a file looked like when it was captured: its
//! SHA-256 and its modification time. Checking a reference compares the mtime
//! first and only rehashes the file when the mtime moved, so a `touch` without
//! an edit is reported as [`Freshness::Touched`] rather than stale.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Files are hashed in chunks of this many bytes.
pub const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Inclusive, 1-based line span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRef {
    /// Project-relative, `/`-separated.
    pub path: String,
    /// Lowercase hex SHA-256 of the whole file.
    pub hash: String,
    pub mtime: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<LineRange>,
}

/// Result of comparing a reference with the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// mtime changed, content did not.
    Touched,
    Modified,
    Missing,
}

impl Freshness {
    pub fn is_stale(self) -> bool {
        matches!(self, Freshness::Modified | Freshness::Missing)
    }
}

impl CodeRef {
    /// Capture a reference to a whole file.
    pub fn capture(root: &Path, path: &str) -> Result<Self> {
        Self::capture_inner(root, path, None)
    }

    /// Capture a reference to a line span of a file.
    pub fn capture_lines(root: &Path, path: &str, lines: LineRange) -> Result<Self> {
        Self::capture_inner(root, path, Some(lines))
    }

    fn capture_inner(root: &Path, path: &str, lines: Option<LineRange>) -> Result<Self> {
        let absolute = root.join(path);
        let mtime = modified_time(&absolute).map_err(|e| not_found_or_io(e, path))?;
        let hash = hash_file(&absolute).map_err(|e| not_found_or_io(e, path))?;
        Ok(CodeRef {
            path: path.to_string(),
            hash,
            mtime,
            lines,
        })
    }

    pub fn absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.path)
    }

    /// Compare against disk: mtime first, content hash only on mismatch.
    pub fn check(&self, root: &Path) -> Freshness {
        let absolute = self.absolute(root);
        let mtime = match modified_time(&absolute) {
            Ok(mtime) => mtime,
            Err(_) => return Freshness::Missing,
        };
        if mtime == self.mtime {
            return Freshness::Fresh;
        }
        match hash_file(&absolute) {
            Ok(hash) if hash == self.hash => Freshness::Touched,
            Ok(_) => Freshness::Modified,
            Err(_) => Freshness::Missing,
        }
    }

    pub fn is_stale(&self, root: &Path) -> bool {
        self.check(root).is_stale()
    }

    /// A new reference to the same location, captured from current disk state.
    pub fn refreshed(&self, root: &Path) -> Result<Self> {
        Self::capture_inner(root, &self.path, self.lines)
    }

    /// Read the referenced content as it is now, limited to the line span if any.
    pub fn load(&self, root: &Path) -> Result<String> {
        let content = std::fs::read_to_string(self.absolute(root))
            .map_err(|e| not_found_or_io(e, &self.path))?;
        Ok(match self.lines {
            None => content,
            Some(range) => {
                let start = range.start.max(1) as usize - 1;
                let len = (range.end as usize + 1).saturating_sub(start + 1);
                let mut out = content
                    .lines()
                    .skip(start)
                    .take(len)
                    .collect::<Vec<_>>()
                    .join("\n");
                if !out.is_empty() {
                    out.push('\n');
                }
                out
            }
        })
    }
}

/// Stream a file through SHA-256 in fixed-size chunks.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn modified_time(path: &Path) -> io::Result<DateTime<Utc>> {
    let meta = std::fs::metadata(path)?;
    if !meta.is_file() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
    }
    Ok(DateTime::<Utc>::from(meta.modified()?))
}

fn not_found_or_io(err: io::Error, path: &str) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::not_found("file", path)
    } else {
        Error::Io(err)
    }
}
