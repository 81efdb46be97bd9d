use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use smallvec::SmallVec;

use crate::{Commit, CommitRecord, Diff, Error, FileDiff, Hunk, Result};

/// The parsed history of one repository: the global commit order, every
/// commit's diffs and, per path, the chronological list of diffs touching it.
///
/// A `History` is built once through a [`HistoryBuilder`] and is read-only
/// afterwards, so any number of requests may share it.
#[derive(Debug, Default)]
pub struct History {
    hashes: Vec<String>,
    positions: HashMap<String, usize>,
    commits: HashMap<String, Arc<Commit>>,
    commit_diffs: HashMap<String, Vec<Arc<Diff>>>,
    files: HashMap<String, Vec<Arc<Diff>>>,
}

impl History {
    pub fn builder() -> HistoryBuilder {
        HistoryBuilder::new()
    }

    /// All commit hashes, oldest first.
    pub fn hashes(&self) -> &[String] {
        &self.hashes
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn commit(&self, hash: &str) -> Option<&Arc<Commit>> {
        self.commits.get(hash)
    }

    /// The diffs of a commit, in the order the provider listed them.
    pub fn diffs(&self, hash: &str) -> Option<&[Arc<Diff>]> {
        self.commit_diffs.get(hash).map(Vec::as_slice)
    }

    /// Every diff that touched `path`, oldest first.
    pub fn file_history(&self, path: &str) -> Option<&[Arc<Diff>]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Position of a commit in the global order.
    pub(crate) fn position(&self, hash: &str) -> Result<usize> {
        self.positions
            .get(hash)
            .copied()
            .ok_or_else(|| Error::NoSuchCommit(hash.to_owned()))
    }

    /// Locate several commits in the history of `path` in a single pass over
    /// the global order.
    ///
    /// The returned positions are 1-based: position `p` means the file looks
    /// the way `file_history[p - 1]` left it. A commit that did not touch
    /// the file resolves to the last diff before it.
    pub fn find_commits(
        &self,
        hashes: &[&str],
        path: &str,
    ) -> Result<(&[Arc<Diff>], SmallVec<[usize; 2]>)> {
        let file = self
            .file_history(path)
            .ok_or_else(|| Error::NoSuchFile(path.to_owned()))?;

        let mut wanted: HashMap<&str, Option<usize>> =
            hashes.iter().map(|hash| (*hash, None)).collect();
        let mut missing = wanted.len();
        let mut cursor = 0;

        for hash in &self.hashes {
            if missing == 0 {
                break;
            }

            if file.get(cursor).is_some_and(|d| d.commit.hash == *hash) {
                cursor += 1;
            }

            if let Some(slot) = wanted.get_mut(hash.as_str()) {
                if slot.is_none() {
                    missing -= 1;
                }
                *slot = Some(cursor);
            }
        }

        let positions = hashes
            .iter()
            .map(|hash| match wanted.get(*hash).copied().flatten() {
                None => Err(Error::NoSuchCommit((*hash).to_owned())),
                Some(0) => Err(Error::FileAbsent {
                    path: path.to_owned(),
                    commit: (*hash).to_owned(),
                }),
                Some(p) => Ok(p),
            })
            .collect::<Result<SmallVec<_>>>()?;

        Ok((file, positions))
    }

    /// Single commit version of [`find_commits`](Self::find_commits).
    pub fn find_commit(&self, hash: &str, path: &str) -> Result<(&[Arc<Diff>], usize)> {
        let (file, positions) = self.find_commits(&[hash], path)?;
        Ok((file, positions[0]))
    }

    /// The last commit of the repository, or the last commit touching `path`
    /// if it has any history. Useful to resolve a symbolic head that may
    /// have moved past the loaded log.
    pub fn head(&self, path: Option<&str>) -> Option<&str> {
        path.and_then(|p| self.files.get(p))
            .and_then(|diffs| diffs.last())
            .map(|d| d.commit.hash.as_str())
            .or_else(|| self.hashes.last().map(String::as_str))
    }

    /// The commits before and after `hash` in the global order.
    pub fn neighbors(&self, hash: &str) -> Result<(Option<&str>, Option<&str>)> {
        let i = self.position(hash)?;
        let previous = i
            .checked_sub(1)
            .and_then(|p| self.hashes.get(p))
            .map(String::as_str);
        let next = self.hashes.get(i + 1).map(String::as_str);

        Ok((previous, next))
    }

    /// The file changes of a commit with renames and copies recognised.
    ///
    /// A created file whose content equals the old content of another file
    /// in the same commit was copied from it, or renamed if that other file
    /// was deleted. The deletion half of a rename is not listed.
    pub fn changes(&self, hash: &str) -> Result<Vec<FileChange>> {
        let diffs = self
            .diffs(hash)
            .ok_or_else(|| Error::NoSuchCommit(hash.to_owned()))?;

        let mut befores: HashMap<&str, &Arc<Diff>> = HashMap::new();
        let mut afters: HashMap<&str, &Arc<Diff>> = HashMap::new();
        for diff in diffs {
            if !diff.checksum_before.is_empty() {
                befores.insert(&diff.checksum_before, diff);
            }
            if !diff.checksum_after.is_empty() {
                afters.insert(&diff.checksum_after, diff);
            }
        }

        let mut changes = Vec::with_capacity(diffs.len());
        for diff in diffs {
            if diff.is_creation() {
                if let Some(source) = befores.get(diff.checksum_after.as_str()) {
                    let from = source.path.clone();
                    let diff = Arc::clone(diff);
                    changes.push(if source.is_deletion() {
                        FileChange::Renamed { from, diff }
                    } else {
                        FileChange::Copied { from, diff }
                    });
                    continue;
                }
            }

            if diff.is_deletion() && afters.contains_key(diff.checksum_before.as_str()) {
                continue;
            }

            changes.push(FileChange::Edited(Arc::clone(diff)));
        }

        Ok(changes)
    }

    /// A page of the commits touching `path`, newest first, skipping the
    /// `offset` newest ones.
    pub fn file_log(&self, path: &str, offset: usize, limit: usize) -> Result<LogPage> {
        let diffs = self
            .file_history(path)
            .ok_or_else(|| Error::NoSuchFile(path.to_owned()))?;

        let entries = diffs
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .map(|diff| {
                let all = self.diffs(&diff.commit.hash).unwrap_or_default();
                let (lines_added, lines_removed) = all
                    .iter()
                    .flat_map(|d| d.hunks.iter())
                    .fold((0, 0), |(added, removed), h| {
                        (added + h.new_length, removed + h.old_length)
                    });

                LogEntry {
                    commit: Arc::clone(&diff.commit),
                    lines_added,
                    lines_removed,
                    files_modified: all.len(),
                }
            })
            .collect();

        let previous_offset = (offset > 0).then(|| offset.saturating_sub(limit));
        let next_offset = offset.checked_add(limit).filter(|&n| n < diffs.len());

        Ok(LogPage {
            entries,
            previous_offset,
            next_offset,
        })
    }
}

/// How a commit changed one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileChange {
    Edited(Arc<Diff>),
    Renamed { from: String, diff: Arc<Diff> },
    Copied { from: String, diff: Arc<Diff> },
}

impl FileChange {
    pub fn diff(&self) -> &Arc<Diff> {
        match self {
            FileChange::Edited(diff)
            | FileChange::Renamed { diff, .. }
            | FileChange::Copied { diff, .. } => diff,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub commit: Arc<Commit>,
    /// Lines added across every file of the commit
    pub lines_added: u32,
    /// Lines removed across every file of the commit
    pub lines_removed: u32,
    pub files_modified: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogPage {
    pub entries: Vec<LogEntry>,
    /// Offset of the newer page, `None` on the first page
    pub previous_offset: Option<usize>,
    /// Offset of the older page, `None` on the last page
    pub next_offset: Option<usize>,
}

/// Builder for [`History`]. Commits must be pushed oldest first.
#[derive(Debug, Default)]
pub struct HistoryBuilder {
    history: History,
    line_counts: HashMap<String, u32>,
}

impl HistoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from provider records, oldest first.
    pub fn from_records(records: impl IntoIterator<Item = CommitRecord>) -> Result<Self> {
        records
            .into_iter()
            .try_fold(Self::new(), |builder, r| builder.commit(r.commit, r.diffs))
    }

    /// Append the next commit and the files it touched.
    pub fn commit(mut self, commit: Commit, diffs: Vec<FileDiff>) -> Result<Self> {
        if self.history.positions.contains_key(&commit.hash) {
            return Err(Error::corrupt(format!("duplicate commit {}", commit.hash)));
        }

        let commit = Arc::new(commit);
        let mut commit_diffs = Vec::with_capacity(diffs.len());
        let mut paths = HashSet::with_capacity(diffs.len());

        for d in diffs {
            if !paths.insert(d.path.clone()) {
                return Err(Error::corrupt(format!(
                    "{} touched twice in commit {}",
                    d.path, commit.hash
                )));
            }

            let prior = self.line_counts.get(&d.path).copied().unwrap_or(0);
            let line_count_after = count_after(prior, &d)
                .map_err(|msg| Error::corrupt(format!("{} in {}: {msg}", d.path, commit.hash)))?;

            self.line_counts.insert(d.path.clone(), line_count_after);

            let diff = Arc::new(Diff {
                commit: Arc::clone(&commit),
                path: d.path,
                checksum_before: d.checksum_before,
                checksum_after: d.checksum_after,
                hunks: d.hunks,
                line_count_after,
            });

            self.history
                .files
                .entry(diff.path.clone())
                .or_default()
                .push(Arc::clone(&diff));
            commit_diffs.push(diff);
        }

        let h = &mut self.history;
        h.positions.insert(commit.hash.clone(), h.hashes.len());
        h.hashes.push(commit.hash.clone());
        h.commit_diffs.insert(commit.hash.clone(), commit_diffs);
        h.commits.insert(commit.hash.clone(), commit);

        Ok(self)
    }

    pub fn build(self) -> History {
        self.history
    }
}

/// Checks that the hunks fit a file of `prior` lines and returns the length
/// of the file afterwards.
fn count_after(prior: u32, diff: &FileDiff) -> std::result::Result<u32, String> {
    let overflow = |h: &Hunk| format!("hunk {h:?} overflows line numbers");

    // First old line the next hunk may touch
    let mut next_free = 1;
    let mut removed = 0u32;
    let mut added = 0u32;

    for h in &diff.hunks {
        h.new_start.checked_add(h.new_length).ok_or_else(|| overflow(h))?;

        if h.old_length > 0 {
            if h.old_start < next_free {
                return Err(format!("hunk at old line {} overlaps or is out of order", h.old_start));
            }
            let last = h
                .old_start
                .checked_add(h.old_length - 1)
                .ok_or_else(|| overflow(h))?;
            if last > prior {
                return Err(format!("hunk ends at line {last} of a {prior} line file"));
            }
            next_free = last.saturating_add(1);
        } else {
            if h.old_start > prior {
                return Err(format!("insertion after line {} of a {prior} line file", h.old_start));
            }
            if h.old_start.saturating_add(1) < next_free {
                return Err(format!("insertion after old line {} is out of order", h.old_start));
            }
            next_free = h.old_start.saturating_add(1);
        }

        removed = removed.checked_add(h.old_length).ok_or_else(|| overflow(h))?;
        added = added.checked_add(h.new_length).ok_or_else(|| overflow(h))?;
    }

    prior
        .checked_sub(removed)
        .and_then(|kept| kept.checked_add(added))
        .ok_or_else(|| format!("{removed} lines removed and {added} added overflow a {prior} line file"))
}
