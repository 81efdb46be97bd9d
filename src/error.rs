/// Boxed error returned by a [`BlobSource`](crate::BlobSource).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error produced when a blame or a line propagation cannot be computed.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no such file: {0}")]
    NoSuchFile(String),
    #[error("no such commit: {0}")]
    NoSuchCommit(String),
    #[error("file {path} does not exist at commit {commit}")]
    FileAbsent { path: String, commit: String },
    #[error("commit {commit} did not change file {path}")]
    NotChanged { path: String, commit: String },
    #[error("repository {0} is not configured for blame")]
    UnknownRepository(String),
    #[error("{start} is later than {target}")]
    StartAfterTarget { start: String, target: String },
    #[error("line number {0} is out of range")]
    LineOutOfRange(u32),
    #[error("cannot propagate line number in a deletion")]
    EmptyTarget,
    #[error("unable to slice lines {start}+{length} out of {path} at {commit}")]
    Slice {
        commit: String,
        path: String,
        start: u32,
        length: u32,
    },
    #[error("corrupt history: {0}")]
    CorruptHistory(String),
    #[error("error reading {path} at {commit}: {source}")]
    Blob {
        commit: String,
        path: String,
        #[source]
        source: BoxError,
    },
    #[error("line propagation was cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptHistory(msg.into())
    }

    /// Whether the error means something asked for does not exist, as
    /// opposed to a malformed history or a failing collaborator.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NoSuchFile(_)
                | Error::NoSuchCommit(_)
                | Error::FileAbsent { .. }
                | Error::NotChanged { .. }
                | Error::UnknownRepository(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn messages() {
        let e = Error::FileAbsent {
            path: "a.txt".into(),
            commit: "c1".into(),
        };
        assert_eq!(e.to_string(), "file a.txt does not exist at commit c1");
        assert!(e.is_not_found());

        let e = Error::StartAfterTarget {
            start: "c3".into(),
            target: "c1".into(),
        };
        assert_eq!(e.to_string(), "c3 is later than c1");
        assert!(!e.is_not_found());
    }
}
