use std::sync::Arc;

use serde::Serialize;

use crate::{Attribution, Commit, Diff, Error, Hunk, Result};

#[cfg(feature = "trace")]
use ::trace::trace;
#[cfg(feature = "trace")]
trace::init_depth_var!();

/// A run of consecutive lines owned by one commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlameSegment {
    /// Number of lines in the run, never zero
    pub line_count: u32,

    /// Line number of the first line in the owner's version of the file
    pub line_start: u32,

    /// The owning commit, `None` for lines nothing is known about
    pub owner: Option<Arc<Commit>>,
}

impl BlameSegment {
    fn continues(&self, next: &BlameSegment) -> bool {
        let same_owner = match (&self.owner, &next.owner) {
            (Some(a), Some(b)) => a.hash == b.hash,
            (None, None) => true,
            _ => false,
        };

        same_owner && self.line_start + self.line_count == next.line_start
    }
}

/// Line ownership of one version of a file, as contiguous runs covering
/// every line in order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BlameSegments(Vec<BlameSegment>);

impl BlameSegments {
    /// Ownership of a file that does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A file of `line_count` lines entirely owned by `owner`.
    pub fn anchored(line_count: u32, owner: Arc<Commit>) -> Self {
        Self::single(line_count, Some(owner))
    }

    fn single(line_count: u32, owner: Option<Arc<Commit>>) -> Self {
        if line_count == 0 {
            return Self::new();
        }

        Self(vec![BlameSegment {
            line_count,
            line_start: 1,
            owner,
        }])
    }

    pub fn as_slice(&self) -> &[BlameSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of lines covered.
    pub fn line_count(&self) -> u32 {
        self.0.iter().map(|s| s.line_count).sum()
    }

    /// Forget all ownership, keeping only the number of lines.
    pub fn wipe(&self) -> Self {
        Self::single(self.line_count(), None)
    }

    /// Transform ownership across one diff. `self` describes the version
    /// before the hunks, the result the version after them; new lines are
    /// owned by `commit`.
    pub fn apply(
        &self,
        hunks: impl IntoIterator<Item = Hunk>,
        commit: &Arc<Commit>,
    ) -> Result<Self> {
        let mut stepper = Stepper::new(&self.0);

        for h in hunks {
            if h.old_length > 0 {
                let gap = distance(h.old_start, stepper.old_line, "old")?;
                stepper.carry_forward(gap)?;
                stepper.skip(h.old_length)?;
            }
            if h.new_length > 0 {
                let gap = distance(h.new_start, stepper.new_line, "new")?;
                stepper.carry_forward(gap)?;
                stepper.append(h.new_length, commit);
            }
        }

        stepper.finish()
    }

    /// One entry per line, `unowned` standing in for lines without owner.
    pub fn flatten(&self, unowned: Attribution) -> Vec<Attribution> {
        self.0
            .iter()
            .flat_map(|s| {
                let unowned = &unowned;
                (s.line_start..s.line_start + s.line_count).map(move |line| match &s.owner {
                    Some(commit) => Attribution::Known {
                        commit: Arc::clone(commit),
                        line,
                    },
                    None => unowned.clone(),
                })
            })
            .collect()
    }
}

fn distance(start: u32, cursor: u32, side: &str) -> Result<u32> {
    start.checked_sub(cursor).ok_or_else(|| {
        Error::corrupt(format!(
            "hunk starts at {side} line {start} but line {cursor} was already reached"
        ))
    })
}

impl Diff {
    /// Ownership after this diff, given the ownership before it.
    pub fn step(&self, before: &BlameSegments) -> Result<BlameSegments> {
        before.apply(self.hunks.iter().copied(), &self.commit)
    }

    /// Ownership before this diff, given the ownership after it. Lines the
    /// diff removed come back owned by this diff's commit.
    pub fn step_back(&self, after: &BlameSegments) -> Result<BlameSegments> {
        after.apply(self.hunks.iter().map(Hunk::reversed), &self.commit)
    }
}

/// Read cursor into the old segments and write cursor into the new ones.
#[derive(Debug)]
struct Stepper<'a> {
    prior: &'a [BlameSegment],
    index: usize,
    remaining: u32,
    old_line: u32,
    new_line: u32,
    out: Vec<BlameSegment>,
}

#[cfg_attr(
    feature = "trace",
    trace(disable(new, advance, push, finish), prefix_enter = "", prefix_exit = "")
)]
impl<'a> Stepper<'a> {
    fn new(prior: &'a [BlameSegment]) -> Self {
        Self {
            prior,
            index: 0,
            remaining: prior.first().map_or(0, |s| s.line_count),
            old_line: 1,
            new_line: 1,
            out: Vec::with_capacity(prior.len() + 2),
        }
    }

    fn advance(&mut self) {
        self.index += 1;
        self.remaining = self.prior.get(self.index).map_or(0, |s| s.line_count);
    }

    fn push(&mut self, segment: BlameSegment) {
        match self.out.last_mut() {
            Some(last) if last.continues(&segment) => last.line_count += segment.line_count,
            _ => self.out.push(segment),
        }
    }

    /// Copy `count` lines from the old version, keeping their owners.
    fn carry_forward(&mut self, mut count: u32) -> Result<()> {
        while count > 0 {
            let segment = self.prior.get(self.index).ok_or_else(|| {
                Error::corrupt(format!("{count} lines carried past the end of the file"))
            })?;

            let taken = count.min(self.remaining);
            let progress = segment.line_count - self.remaining;

            self.push(BlameSegment {
                line_count: taken,
                line_start: segment.line_start + progress,
                owner: segment.owner.clone(),
            });

            self.old_line += taken;
            self.new_line += taken;
            self.remaining -= taken;
            count -= taken;

            if self.remaining == 0 {
                self.advance();
            }
        }

        Ok(())
    }

    /// Drop `count` lines of the old version.
    fn skip(&mut self, mut count: u32) -> Result<()> {
        while count > 0 {
            if self.index >= self.prior.len() {
                return Err(Error::corrupt(format!(
                    "{count} lines removed past the end of the file"
                )));
            }

            let taken = count.min(self.remaining);

            self.old_line += taken;
            self.remaining -= taken;
            count -= taken;

            if self.remaining == 0 {
                self.advance();
            }
        }

        Ok(())
    }

    /// Emit `count` new lines owned by `owner`.
    fn append(&mut self, count: u32, owner: &Arc<Commit>) {
        self.push(BlameSegment {
            line_count: count,
            line_start: self.new_line,
            owner: Some(Arc::clone(owner)),
        });

        self.new_line += count;
    }

    fn finish(mut self) -> Result<BlameSegments> {
        let rest = self.remaining
            + self
                .prior
                .get(self.index + 1..)
                .unwrap_or_default()
                .iter()
                .map(|s| s.line_count)
                .sum::<u32>();

        self.carry_forward(rest)?;

        Ok(BlameSegments(self.out))
    }
}

#[cfg(test)]
impl BlameSegments {
    /// Rebuild maximal runs from per-line owners and line numbers.
    fn from_lines<'a>(lines: impl IntoIterator<Item = (Option<&'a Arc<Commit>>, u32)>) -> Self {
        let mut out: Vec<BlameSegment> = vec![];

        for (owner, line) in lines {
            let segment = BlameSegment {
                line_count: 1,
                line_start: line,
                owner: owner.cloned(),
            };
            match out.last_mut() {
                Some(last) if last.continues(&segment) => last.line_count += 1,
                _ => out.push(segment),
            }
        }

        Self(out)
    }
}
