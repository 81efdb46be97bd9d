use crate::{BoxError, Error, Result};

/// Reads file contents at a given commit. Implemented by whatever owns the
/// repository; the index itself never touches it.
pub trait BlobSource {
    /// The full text of `path` as of `commit`.
    fn read(&self, commit: &str, path: &str) -> std::result::Result<String, BoxError>;
}

impl<F> BlobSource for F
where
    F: Fn(&str, &str) -> std::result::Result<String, BoxError>,
{
    fn read(&self, commit: &str, path: &str) -> std::result::Result<String, BoxError> {
        self(commit, path)
    }
}

/// Split a file into lines. A single trailing newline terminates the last
/// line rather than starting an empty one.
pub fn split_lines(text: &str) -> Vec<&str> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.split('\n').collect()
}

/// Lines `start..start + length` (1-based) of `lines`, or `None` if that
/// range does not fit. An empty range right after the last line fits.
pub fn slice_lines<'a, S>(lines: &'a [S], start: u32, length: u32) -> Option<&'a [S]> {
    let first = (start as usize).checked_sub(1)?;
    lines.get(first..first + length as usize)
}

/// Read `length` lines of `path` at `commit` starting at line `start`.
pub(crate) fn read_lines<B>(
    blobs: &B,
    commit: &str,
    path: &str,
    start: u32,
    length: u32,
) -> Result<Vec<String>>
where
    B: BlobSource + ?Sized,
{
    let text = blobs.read(commit, path).map_err(|source| Error::Blob {
        commit: commit.to_owned(),
        path: path.to_owned(),
        source,
    })?;

    let lines = split_lines(&text);
    let slice = slice_lines(&lines, start, length).ok_or_else(|| Error::Slice {
        commit: commit.to_owned(),
        path: path.to_owned(),
        start,
        length,
    })?;

    Ok(slice.iter().map(|l| (*l).to_owned()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("a\nb\nc\n", &["a", "b", "c"] ; "trailing newline")]
    #[test_case("a\nb\nc", &["a", "b", "c"] ; "no trailing newline")]
    #[test_case("a\n\n", &["a", ""] ; "blank last line")]
    #[test_case("", &[""] ; "empty")]
    fn splitting(text: &str, expected: &[&str]) {
        assert_eq!(split_lines(text), expected);
    }

    #[test_case(1, 3, Some(&["a", "b", "c"][..]))]
    #[test_case(2, 1, Some(&["b"][..]))]
    #[test_case(4, 0, Some(&[][..]) ; "empty after the end")]
    #[test_case(0, 1, None ; "line zero")]
    #[test_case(3, 2, None ; "past the end")]
    fn slicing(start: u32, length: u32, expected: Option<&[&str]>) {
        assert_eq!(slice_lines(&["a", "b", "c"], start, length), expected);
    }

    #[test]
    fn reading_through_a_closure() {
        let blobs = |commit: &str, path: &str| -> std::result::Result<String, BoxError> {
            match (commit, path) {
                ("c1", "f") => Ok("one\ntwo\nthree\n".into()),
                _ => Err("missing".into()),
            }
        };

        assert_eq!(read_lines(&blobs, "c1", "f", 2, 2).unwrap(), vec!["two", "three"]);
        assert!(matches!(
            read_lines(&blobs, "c1", "f", 3, 2),
            Err(Error::Slice { start: 3, length: 2, .. })
        ));
        assert!(matches!(read_lines(&blobs, "c2", "f", 1, 1), Err(Error::Blob { .. })));
    }
}
