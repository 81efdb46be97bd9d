use serde::Serialize;

use crate::{Attribution, BlameResult, Error, Result};

/// Unchanged runs longer than this are shortened in the diff rows.
const MAX_CONTEXT_RUN: u32 = 9;
/// Lines kept on either side of a shortened run.
const CONTEXT_LINES: u32 = 3;

/// One row of a side-by-side diff. Line numbers are 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffRow {
    Context {
        old_line: u32,
        new_line: u32,
        blame: Attribution,
        future: Attribution,
    },
    Removed {
        old_line: u32,
        blame: Attribution,
    },
    Added {
        new_line: u32,
        future: Attribution,
    },
    /// A run of unchanged lines left out
    Elided { count: u32 },
}

impl BlameResult {
    /// Lay out a [`diff_blame`](crate::History::diff_blame) result as
    /// side-by-side rows, shortening long unchanged stretches.
    pub fn rows(&self) -> Result<Vec<DiffRow>> {
        let mut rows = RowWriter {
            blame: &self.blame,
            future: &self.future,
            old: 0,
            new: 0,
            rows: Vec::with_capacity(self.future.len() + self.blame.len()),
        };

        for h in &self.hunks {
            if h.old_length > 0 {
                rows.context(gap(h.old_start, rows.old)?)?;
                for _ in 0..h.old_length {
                    rows.removed()?;
                }
            }
            if h.new_length > 0 {
                rows.context(gap(h.new_start, rows.new)?)?;
                for _ in 0..h.new_length {
                    rows.added()?;
                }
            }
        }

        let end = self.blame.len() as u32;
        rows.context(gap(end + 1, rows.old)?)?;

        Ok(rows.rows)
    }
}

fn gap(start: u32, done: u32) -> Result<u32> {
    start
        .checked_sub(done + 1)
        .ok_or_else(|| Error::corrupt(format!("hunk at line {start} overlaps line {done}")))
}

struct RowWriter<'a> {
    blame: &'a [Attribution],
    future: &'a [Attribution],
    /// Old lines written so far
    old: u32,
    /// New lines written so far
    new: u32,
    rows: Vec<DiffRow>,
}

impl RowWriter<'_> {
    fn blame_at(&self) -> Result<Attribution> {
        self.blame
            .get(self.old as usize)
            .cloned()
            .ok_or_else(|| Error::corrupt(format!("no old line {}", self.old + 1)))
    }

    fn future_at(&self) -> Result<Attribution> {
        self.future
            .get(self.new as usize)
            .cloned()
            .ok_or_else(|| Error::corrupt(format!("no new line {}", self.new + 1)))
    }

    fn both(&mut self) -> Result<()> {
        let row = DiffRow::Context {
            old_line: self.old + 1,
            new_line: self.new + 1,
            blame: self.blame_at()?,
            future: self.future_at()?,
        };
        self.rows.push(row);
        self.old += 1;
        self.new += 1;
        Ok(())
    }

    fn removed(&mut self) -> Result<()> {
        let row = DiffRow::Removed {
            old_line: self.old + 1,
            blame: self.blame_at()?,
        };
        self.rows.push(row);
        self.old += 1;
        Ok(())
    }

    fn added(&mut self) -> Result<()> {
        let row = DiffRow::Added {
            new_line: self.new + 1,
            future: self.future_at()?,
        };
        self.rows.push(row);
        self.new += 1;
        Ok(())
    }

    fn context(&mut self, mut distance: u32) -> Result<()> {
        if distance > MAX_CONTEXT_RUN {
            for _ in 0..CONTEXT_LINES {
                self.both()?;
            }

            let count = distance - 2 * CONTEXT_LINES;
            self.old += count;
            self.new += count;
            self.rows.push(DiffRow::Elided { count });

            distance = CONTEXT_LINES;
        }

        for _ in 0..distance {
            self.both()?;
        }

        Ok(())
    }
}
