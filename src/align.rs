use crate::{Error, Result};

/// Penalty for mapping consecutive source characters `distance` apart in
/// the target. Must stay 0, 1, 2: the inner loop of the alignment reuses its
/// best predecessor across target positions and corrects it by at most one.
fn distance_penalty(distance: usize) -> u32 {
    match distance {
        0 => 0,
        1 => 1,
        _ => 2,
    }
}

/// Maps a line of an old chunk of text to the line of a new chunk it most
/// likely became.
///
/// Each source character is mapped to a target character by a weakly
/// monotonic function that may only land on an equal character or stay
/// where the previous character landed. The cheapest such mapping is found
/// by dynamic programming, and the tracked line then votes, character by
/// character, for the target line its characters ended up on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aligner {
    max_context: usize,
    skip_penalty: u32,
}

impl Default for Aligner {
    fn default() -> Self {
        Self {
            max_context: 10,
            skip_penalty: 2,
        }
    }
}

impl Aligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest number of source lines aligned at once. Bigger chunks are cut
    /// down to a window around the tracked line, which bounds the quadratic
    /// cost at the price of exactness on very large hunks.
    pub fn max_context(mut self, lines: usize) -> Self {
        self.max_context = lines.max(1);
        self
    }

    /// Penalty for a source character that finds no match and stays put.
    pub fn skip_penalty(mut self, penalty: u32) -> Self {
        self.skip_penalty = penalty;
        self
    }

    /// Returns the 1-based line of `target` that 1-based line `line` of
    /// `source` most likely became.
    pub fn map_line<S, T>(&self, source: &[S], target: &[T], line: u32) -> Result<u32>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let l = line as usize;
        if l < 1 || l > source.len() {
            return Err(Error::LineOutOfRange(line));
        }
        if target.is_empty() {
            return Err(Error::EmptyTarget);
        }

        let (source, l) = self.window(source, l);

        let source_text = join(source);
        let target_text = join(target);
        let mapping = self.align(source_text.as_bytes(), target_text.as_bytes());

        let begin: usize = source[..l - 1].iter().map(|s| s.as_ref().len() + 1).sum();
        let end = begin + source[l - 1].as_ref().len();

        Ok(vote(&mapping[begin..end], target))
    }

    fn window<'s, S>(&self, source: &'s [S], line: usize) -> (&'s [S], usize) {
        if source.len() <= self.max_context {
            return (source, line);
        }

        // Half-open, 1-based
        let mut start = line.saturating_sub(self.max_context / 2).max(1);
        let mut end = start + self.max_context;
        if end > source.len() {
            end = source.len() + 1;
            start = end.saturating_sub(self.max_context).max(1);
        }

        (&source[start - 1..end - 1], line - start + 1)
    }

    /// For each source byte, the target byte it maps to, if any.
    fn align(&self, source: &[u8], target: &[u8]) -> Vec<Option<usize>> {
        let n = source.len();
        let m = target.len();

        // score[i][j]: cheapest mapping of source[..=i] with source[i] on
        // target[j]. track[i][j]: where source[i - 1] went in that mapping.
        let mut score = vec![vec![None::<u32>; m]; n];
        let mut track = vec![vec![None::<usize>; m]; n];

        for (i, &ch) in source.iter().enumerate() {
            if i == 0 {
                for j in 0..m {
                    if ch == target[j] {
                        score[0][j] = Some(distance_penalty(j));
                    } else if j == 0 {
                        score[0][j] = Some(self.skip_penalty);
                    }
                }
                continue;
            }

            let mut best: Option<(u32, usize)> = None;
            let mut last_match = 0;

            for j in 0..m {
                if ch == target[j] {
                    for k in last_match..j {
                        let Some(previous) = score[i - 1][k] else {
                            continue;
                        };
                        let candidate = previous + distance_penalty(j - k);
                        if best.map_or(true, |(s, _)| candidate <= s) {
                            best = Some((candidate, k));
                        }
                    }

                    // The best predecessor carried over from an earlier match
                    // was scored for that match; move its distance term here.
                    if let Some((s, k)) = best {
                        if k < last_match {
                            let s = (s + distance_penalty(j - k))
                                .saturating_sub(distance_penalty(last_match - k));
                            best = Some((s, k));
                        }
                    }

                    score[i][j] = best.map(|(s, _)| s);
                    track[i][j] = best.map(|(_, k)| k);
                    last_match = j;
                } else if let Some(previous) = score[i - 1][j] {
                    score[i][j] = Some(previous + self.skip_penalty);
                    track[i][j] = Some(j);
                }
            }
        }

        let mut mapping = vec![None; n];
        let mut cursor: Option<usize> = None;

        for i in (0..n).rev() {
            if i == n - 1 {
                let mut best: Option<u32> = None;
                for j in 0..m {
                    if let Some(s) = score[i][j] {
                        let candidate = s + distance_penalty(m - 1 - j);
                        if best.map_or(true, |b| b > candidate) {
                            best = Some(candidate);
                            cursor = Some(j);
                        }
                    }
                }
            } else if let Some(c) = cursor {
                cursor = track[i + 1][c];
            }
            mapping[i] = cursor;
        }

        mapping
    }
}

fn join<S: AsRef<str>>(lines: &[S]) -> String {
    lines.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\n")
}

/// The target line receiving most of the mapped characters, 1-based. A run
/// of characters mapped onto the same target character counts once.
fn vote<T: AsRef<str>>(mapped: &[Option<usize>], target: &[T]) -> u32 {
    let mut beginnings = Vec::with_capacity(target.len() + 1);
    beginnings.push(0);
    for t in target {
        let last = beginnings[beginnings.len() - 1];
        beginnings.push(last + t.as_ref().len() + 1);
    }

    let mut histogram = vec![0u32; target.len()];
    let mut j = 0;
    let mut previous = None;

    for &m in mapped {
        while j + 1 < histogram.len() {
            if m.is_some_and(|m| beginnings[j] <= m && m < beginnings[j + 1]) {
                break;
            }
            j += 1;
        }

        if previous != m {
            histogram[j] += 1;
        }
        previous = m;
    }

    let mut best = (0, 0);
    for (i, &votes) in histogram.iter().enumerate() {
        if votes > best.0 {
            best = (votes, i);
        }
    }

    best.1 as u32 + 1
}
