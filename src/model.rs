use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A commit of the repository. Only the metadata needed to attribute lines
/// is kept here, the files it touched live in the [`History`](crate::History).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commit {
    /// The full commit hash
    pub hash: String,

    /// Short display label, typically an abbreviated author and date
    #[serde(default)]
    pub label: String,

    /// Commit time in seconds since the epoch
    #[serde(default)]
    pub date: i64,
}

impl Commit {
    pub fn new(hash: impl Into<String>, label: impl Into<String>, date: i64) -> Self {
        Self {
            hash: hash.into(),
            label: label.into(),
            date,
        }
    }
}

/// One contiguous replaced region of a unified diff. Positions are 1-based;
/// a zero length means a pure insertion (old side) or a pure deletion (new
/// side), in which case the start names the line after which it happens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hunk {
    pub old_start: u32,
    pub old_length: u32,
    pub new_start: u32,
    pub new_length: u32,
}

impl Hunk {
    pub const fn new(old_start: u32, old_length: u32, new_start: u32, new_length: u32) -> Self {
        Self {
            old_start,
            old_length,
            new_start,
            new_length,
        }
    }

    /// The hunk that undoes this one.
    pub const fn reversed(&self) -> Self {
        Self {
            old_start: self.new_start,
            old_length: self.new_length,
            new_start: self.old_start,
            new_length: self.old_length,
        }
    }

    /// Lines of the old version replaced by this hunk.
    pub fn old_lines(&self) -> Range<u32> {
        self.old_start..self.old_start + self.old_length
    }

    /// Lines of the new version written by this hunk.
    pub fn new_lines(&self) -> Range<u32> {
        self.new_start..self.new_start + self.new_length
    }
}

/// The change a single commit made to a single file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diff {
    /// The commit this diff belongs to
    pub commit: Arc<Commit>,

    pub path: String,

    /// Content checksum before the commit, empty if the file was created
    pub checksum_before: String,

    /// Content checksum after the commit, empty if the file was deleted
    pub checksum_after: String,

    /// Hunks ordered by increasing old position
    pub hunks: Vec<Hunk>,

    /// Number of lines in the file once this diff is applied
    pub line_count_after: u32,
}

impl Diff {
    pub fn is_creation(&self) -> bool {
        self.checksum_before.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        self.checksum_after.is_empty()
    }
}

/// A file change as handed over by a history provider, before it is tied to
/// its commit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    #[serde(default)]
    pub checksum_before: String,
    #[serde(default)]
    pub checksum_after: String,
    #[serde(default)]
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    pub fn new(path: impl Into<String>, hunks: Vec<Hunk>) -> Self {
        Self {
            path: path.into(),
            hunks,
            ..Default::default()
        }
    }

    pub fn checksums(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.checksum_before = before.into();
        self.checksum_after = after.into();
        self
    }
}

/// A commit together with the files it touched, the unit a provider feeds
/// into a [`HistoryBuilder`](crate::HistoryBuilder).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    #[serde(flatten)]
    pub commit: Commit,
    #[serde(default)]
    pub diffs: Vec<FileDiff>,
}
