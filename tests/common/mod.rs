#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};

use lineage::*;

/// File contents at every commit, the way a repository would serve them.
#[derive(Debug, Default)]
pub struct MemoryBlobs {
    blobs: HashMap<(String, String), String>,
}

impl BlobSource for MemoryBlobs {
    fn read(&self, commit: &str, path: &str) -> std::result::Result<String, BoxError> {
        self.blobs
            .get(&(commit.to_owned(), path.to_owned()))
            .cloned()
            .ok_or_else(|| format!("{commit}:{path} not found").into())
    }
}

/// Builds a history and its blobs from whole file contents. Each edit
/// becomes a single hunk spanning everything between the common prefix
/// and the common suffix of the two versions.
#[derive(Debug, Default)]
pub struct Fixture {
    records: Vec<CommitRecord>,
    files: BTreeMap<String, String>,
    blobs: MemoryBlobs,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit `hash`, setting each listed file to the given content or
    /// deleting it on `None`.
    pub fn commit(mut self, hash: &str, changes: &[(&str, Option<&str>)]) -> Self {
        let mut diffs = vec![];

        for (path, content) in changes {
            let before = self.files.get(*path).cloned().unwrap_or_default();
            let after = content.unwrap_or_default().to_owned();

            if let Some(hunk) = hunk(&before, &after) {
                diffs.push(FileDiff::new(*path, vec![hunk]).checksums(&before, &after));
            }

            match content {
                Some(c) => self.files.insert(path.to_string(), c.to_string()),
                None => self.files.remove(*path),
            };
        }

        for (path, content) in &self.files {
            self.blobs
                .blobs
                .insert((hash.to_owned(), path.clone()), content.clone());
        }

        self.records.push(CommitRecord {
            commit: Commit::new(hash, format!("author {hash}"), self.records.len() as i64),
            diffs,
        });
        self
    }

    pub fn build(self) -> (History, MemoryBlobs) {
        let history = HistoryBuilder::from_records(self.records)
            .expect("valid history")
            .build();
        (history, self.blobs)
    }
}

fn lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        vec![]
    } else {
        split_lines(text)
    }
}

fn hunk(before: &str, after: &str) -> Option<Hunk> {
    let (old, new) = (lines(before), lines(after));

    let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_length = (old.len() - prefix - suffix) as u32;
    let new_length = (new.len() - prefix - suffix) as u32;
    if old_length == 0 && new_length == 0 {
        return None;
    }

    let start = |length: u32| prefix as u32 + (length > 0) as u32;
    Some(Hunk::new(start(old_length), old_length, start(new_length), new_length))
}

/// Render attributions as "hash:line", "?" or "-" for compact assertions.
pub fn short(v: &[Attribution]) -> Vec<String> {
    v.iter()
        .map(|a| match a {
            Attribution::Known { commit, line } => format!("{}:{line}", commit.hash),
            Attribution::Unattributed => "?".into(),
            Attribution::StillExists => "-".into(),
        })
        .collect()
}

