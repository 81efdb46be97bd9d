//! A history-wide, bidirectional blame index.
//!
//! Given a parsed commit history this crate answers two questions for any
//! line of any file at any commit: which commit last wrote it (the *blame*)
//! and which commit will next change or remove it (the *future*). It can
//! also carry a single line number from one commit to another across an
//! arbitrary span of edits, falling back to a character level alignment
//! when the line itself was modified along the way.
//!
//! The crate does not read repositories. A history provider hands over
//! commits, diffs and hunks through [`HistoryBuilder`], and file contents
//! are fetched on demand through the [`BlobSource`] trait. The main entry
//! points are [`History::file_blame`], [`History::diff_blame`] and
//! [`FastForward`].

mod align;
pub use align::*;

mod blame;
pub use blame::*;

mod blobs;
pub use blobs::*;

mod diff_rows;
pub use diff_rows::*;

mod error;
pub use error::*;

mod fast_forward;
pub use fast_forward::*;

mod history;
pub use history::*;

mod model;
pub use model::*;

mod registry;
pub use registry::*;

mod segments;
pub use segments::*;
