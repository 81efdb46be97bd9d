use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rangemap::RangeMap;
use serde::Serialize;
use tracing::debug;

use crate::blobs::read_lines;
use crate::{Aligner, BlobSource, Error, History, Hunk, Result};

/// A line of a file at a commit. Lines are 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LinePosition {
    pub commit: String,
    pub line: u32,
}

impl LinePosition {
    pub fn new(commit: impl Into<String>, line: u32) -> Self {
        Self {
            commit: commit.into(),
            line,
        }
    }
}

/// What a single propagation attempt came up with.
#[derive(Debug)]
enum Step {
    /// The line is `line` at the goal commit.
    Reached(u32),
    /// Too many commits in between; go via this one first.
    Bisect(String),
    /// The goal commit deleted the line.
    Deleted,
}

/// Carries a line number from one commit to a later one.
///
/// Lines left alone by every commit in between are found directly through
/// [`History::file_blame_with_start`]. Otherwise the span is halved until a
/// single diff separates the two commits, and the hunk holding the line is
/// aligned character by character against what replaced it. Propagation
/// stops early at the last commit where the line still existed if some
/// commit deleted it outright.
///
/// ```no_run
/// # use lineage::*;
/// # fn propagate(history: &History, blobs: &dyn BlobSource) -> Result<()> {
/// let at = FastForward::new(history, blobs)
///     .aligner(Aligner::new().max_context(20))
///     .run("src/lib.rs", "c1", "c9", 42)?;
/// println!("{}:{}", at.commit, at.line);
/// # Ok(())
/// # }
/// ```
pub struct FastForward<'a, B: BlobSource + ?Sized> {
    history: &'a History,
    blobs: &'a B,
    aligner: Aligner,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, B: BlobSource + ?Sized> FastForward<'a, B> {
    pub fn new(history: &'a History, blobs: &'a B) -> Self {
        Self {
            history,
            blobs,
            aligner: Aligner::default(),
            cancel: None,
        }
    }

    pub fn aligner(mut self, aligner: Aligner) -> Self {
        self.aligner = aligner;
        self
    }

    /// Give up with [`Error::Cancelled`] once `flag` is set. Checked before
    /// every propagation step.
    pub fn cancel_on(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Where line `line` of `path` at `source` ended up at `target`.
    ///
    /// The returned commit is `target`, unless the line was deleted on the
    /// way, in which case it is the last commit the line was seen at.
    pub fn run(&self, path: &str, source: &str, target: &str, line: u32) -> Result<LinePosition> {
        let start = Instant::now();

        let (file, position) = self.history.find_commit(source, path)?;
        if line < 1 || line > file[position - 1].line_count_after {
            return Err(Error::LineOutOfRange(line));
        }

        let mut current = LinePosition::new(source, line);
        let mut pending = vec![target.to_owned()];
        let mut steps = 0usize;

        while let Some(goal) = pending.last().cloned() {
            if self.cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                return Err(Error::Cancelled);
            }
            steps += 1;

            match self.step(path, &current, &goal)? {
                Step::Reached(line) => {
                    tracing::trace!(from = %current.commit, to = %goal, line, "propagated");
                    current = LinePosition::new(goal, line);
                    pending.pop();
                }
                Step::Bisect(middle) => pending.push(middle),
                Step::Deleted => {
                    debug!(path, commit = %current.commit, line = current.line, "line deleted");
                    break;
                }
            }
        }

        debug!(
            path,
            source,
            target,
            reached = %current.commit,
            line = current.line,
            steps,
            elapsed = ?start.elapsed(),
            "fast forward"
        );

        Ok(current)
    }

    fn step(&self, path: &str, from: &LinePosition, goal: &str) -> Result<Step> {
        let blame = self
            .history
            .file_blame_with_start(&from.commit, goal, path)?;
        if let Some(i) = blame.iter().position(|a| a.is(&from.commit, from.line)) {
            return Ok(Step::Reached(i as u32 + 1));
        }

        let (file, positions) = self.history.find_commits(&[from.commit.as_str(), goal], path)?;
        let (source_index, target_index) = (positions[0] - 1, positions[1] - 1);

        if source_index + 1 < target_index {
            let middle = &file[(source_index + target_index) / 2].commit.hash;
            return Ok(Step::Bisect(middle.clone()));
        }
        if target_index <= source_index {
            return Err(Error::corrupt(format!(
                "line {} of {path} at {} is not attributed at {goal}",
                from.line, from.commit
            )));
        }

        let diff = &file[target_index];
        let hunk = containing_hunk(&diff.hunks, from.line).ok_or_else(|| {
            Error::corrupt(format!(
                "no hunk of {path} in {} covers line {}",
                diff.commit.hash, from.line
            ))
        })?;

        if hunk.new_length == 0 {
            return Ok(Step::Deleted);
        }

        let source_lines = read_lines(
            self.blobs,
            &from.commit,
            path,
            hunk.old_start,
            hunk.old_length,
        )?;
        let target_lines = read_lines(self.blobs, goal, path, hunk.new_start, hunk.new_length)?;

        let mapped = self
            .aligner
            .map_line(&source_lines, &target_lines, from.line - hunk.old_start + 1)?;

        Ok(Step::Reached(mapped + hunk.new_start - 1))
    }
}

/// The hunk whose old side covers `line`.
fn containing_hunk(hunks: &[Hunk], line: u32) -> Option<Hunk> {
    let ranges: RangeMap<u32, Hunk> = hunks
        .iter()
        .filter(|h| h.old_length > 0)
        .map(|h| (h.old_lines(), *h))
        .collect();

    ranges.get(&line).copied()
}
