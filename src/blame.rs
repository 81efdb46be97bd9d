use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::{BlameSegments, Commit, Diff, Error, History, Hunk, Result};

/// Who a line belongs to, looking either back or forward in history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attribution {
    /// The line is `line` in the version of the file `commit` produced.
    Known { commit: Arc<Commit>, line: u32 },

    /// Nothing is known about who wrote the line.
    Unattributed,

    /// No later commit touches the line.
    StillExists,
}

impl Attribution {
    pub fn commit(&self) -> Option<&Arc<Commit>> {
        match self {
            Attribution::Known { commit, .. } => Some(commit),
            _ => None,
        }
    }

    pub fn line(&self) -> Option<u32> {
        match self {
            Attribution::Known { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Whether this is line `line` of commit `hash`.
    pub fn is(&self, hash: &str, line: u32) -> bool {
        matches!(self, Attribution::Known { commit, line: l } if commit.hash == hash && *l == line)
    }
}

/// One [`Attribution`] per line of a file version.
pub type BlameVector = Vec<Attribution>;

/// Blame and future of one file version, with navigation hints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BlameResult {
    /// Last commit to write each line
    pub blame: BlameVector,

    /// Next commit to change or remove each line
    pub future: BlameVector,

    /// Previous commit in the file's history
    pub previous: Option<String>,

    /// Next commit in the file's history
    pub next: Option<String>,

    /// The examined commit's hunks, only filled in by a diff blame
    pub hunks: Vec<Hunk>,
}

impl History {
    /// Blame and future of `path` as `commit` left it, including the
    /// commit's own edits. `commit` need not have touched the file.
    pub fn file_blame(&self, commit: &str, path: &str) -> Result<BlameResult> {
        let start = Instant::now();
        let (history, position) = self.find_commit(commit, path)?;

        let (blame, future) = replay(history, position, position)?;

        let index = position - 1;
        let (previous, next) = if history[index].commit.hash == commit {
            (index.checked_sub(1), index + 1)
        } else {
            (Some(index), index + 1)
        };

        debug!(commit, path, lines = blame.len(), elapsed = ?start.elapsed(), "file blame");

        Ok(BlameResult {
            blame,
            future,
            previous: hash_at(history, previous),
            next: hash_at(history, Some(next)),
            hunks: vec![],
        })
    }

    /// Blame of `path` just before `commit` edited it, and future of the
    /// version the edit produced: the two sides of the commit's diff.
    ///
    /// Lines the commit inserted only appear in the future, and are
    /// attributed to whichever later commit touches them, not to `commit`.
    pub fn diff_blame(&self, commit: &str, path: &str) -> Result<BlameResult> {
        let start = Instant::now();
        let history = self
            .file_history(path)
            .ok_or_else(|| Error::NoSuchFile(path.to_owned()))?;

        if self.commit(commit).is_none() {
            return Err(Error::NoSuchCommit(commit.to_owned()));
        }

        let index = history
            .iter()
            .position(|d| d.commit.hash == commit)
            .ok_or_else(|| Error::NotChanged {
                path: path.to_owned(),
                commit: commit.to_owned(),
            })?;

        let (blame, future) = replay(history, index, index + 1)?;

        debug!(commit, path, elapsed = ?start.elapsed(), "diff blame");

        Ok(BlameResult {
            blame,
            future,
            previous: hash_at(history, index.checked_sub(1)),
            next: hash_at(history, Some(index + 1)),
            hunks: history[index].hunks.clone(),
        })
    }

    /// Blame of `path` at `target`, pretending the file was created at
    /// `start` with the content it had there. Lines untouched since `start`
    /// are attributed to `start` with their line number at `start`.
    pub fn file_blame_with_start(
        &self,
        start: &str,
        target: &str,
        path: &str,
    ) -> Result<BlameVector> {
        let (history, positions) = self.find_commits(&[start, target], path)?;
        let (from, to) = (positions[0], positions[1]);

        if from > to || self.position(start)? > self.position(target)? {
            return Err(Error::StartAfterTarget {
                start: start.to_owned(),
                target: target.to_owned(),
            });
        }

        let base = &history[from - 1];
        let anchor = Arc::new(Commit {
            hash: start.to_owned(),
            ..Commit::clone(&base.commit)
        });

        let mut segments = BlameSegments::anchored(base.line_count_after, anchor);
        for diff in &history[from..to] {
            segments = diff.step(&segments)?;
        }

        Ok(segments.flatten(Attribution::Unattributed))
    }
}

/// Replays the whole history of a file: forward from nothing, recording the
/// blame once `blame_at` diffs are applied, then backward from the final
/// version, recording the future once every diff from `future_at` on has
/// been undone.
fn replay(
    history: &[Arc<Diff>],
    blame_at: usize,
    future_at: usize,
) -> Result<(BlameVector, BlameVector)> {
    let mut segments = BlameSegments::new();
    for diff in &history[..blame_at] {
        segments = diff.step(&segments)?;
    }

    let blame = segments.flatten(Attribution::Unattributed);

    for diff in &history[blame_at..] {
        segments = diff.step(&segments)?;
    }

    let mut segments = segments.wipe();
    for diff in history[future_at..].iter().rev() {
        segments = diff.step_back(&segments)?;
    }

    Ok((blame, segments.flatten(Attribution::StillExists)))
}

fn hash_at(history: &[Arc<Diff>], i: Option<usize>) -> Option<String> {
    i.and_then(|i| history.get(i)).map(|d| d.commit.hash.clone())
}
