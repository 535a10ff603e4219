//! Physical output writing and write-once arbitration.
//!
//! Generation phases run in a fixed order (per-document pages, then listing
//! pages, then taxonomy pages, then drafts), and more than one phase can
//! legitimately compute the same output path — a document may pre-claim a
//! path a later generic phase would also produce. [`OutputGuard`] arbitrates:
//! each path is physically written at most once per run, with `override`
//! as the controlled escape hatch for producers that know they outrank an
//! earlier write.
//!
//! ## Per-path state machine
//!
//! ```text
//! UNWRITTEN --normal--> WRITTEN --override--> OVERRIDDEN
//!     \------override-------------^               |
//!                                        override = fatal
//! ```
//!
//! - Normal write to an already-written path: skipped and logged, not an
//!   error — later phases produce overlapping paths routinely.
//! - Override write to a WRITTEN path: performed, with an "overwriting"
//!   notice.
//! - Override write to an already-OVERRIDDEN path: fatal. Two independent
//!   producers both claim exclusive ownership of one path; that is a
//!   structural configuration bug, never silently resolved.
//!
//! The ledger is created fresh per run and discarded at the end.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: io::Error,
    },
    #[error("two producers claim exclusive ownership of {0}")]
    DoubleOverride(PathBuf),
}

/// Raw byte sink for rendered output. [`OutputGuard`] decides *whether* a
/// write happens; implementations decide *how*.
pub trait Writer {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// Writes files under an output root, creating parent directories.
#[derive(Debug)]
pub struct FsWriter {
    root: PathBuf,
}

impl FsWriter {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl Writer for FsWriter {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteState {
    Written,
    Overridden,
}

/// What the guard did with a requested write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Skipped,
}

/// Per-run ledger enforcing "one physical write per path".
#[derive(Debug)]
pub struct OutputGuard<W> {
    writer: W,
    ledger: HashMap<PathBuf, WriteState>,
}

impl<W: Writer> OutputGuard<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            ledger: HashMap::new(),
        }
    }

    /// Write `bytes` to `path` unless the ledger says another phase already
    /// owns it. See the module docs for the full state machine.
    pub fn write(
        &mut self,
        path: &Path,
        bytes: &[u8],
        override_existing: bool,
    ) -> Result<WriteOutcome, WriteError> {
        match (self.ledger.get(path), override_existing) {
            (None, false) => {
                self.perform(path, bytes, WriteState::Written)?;
                Ok(WriteOutcome::Written)
            }
            (None, true) => {
                self.perform(path, bytes, WriteState::Overridden)?;
                Ok(WriteOutcome::Written)
            }
            (Some(_), false) => {
                debug!(path = %path.display(), "already written this run, skipping");
                Ok(WriteOutcome::Skipped)
            }
            (Some(WriteState::Written), true) => {
                info!(path = %path.display(), "overwriting earlier output");
                self.perform(path, bytes, WriteState::Overridden)?;
                Ok(WriteOutcome::Written)
            }
            (Some(WriteState::Overridden), true) => {
                Err(WriteError::DoubleOverride(path.to_path_buf()))
            }
        }
    }

    fn perform(
        &mut self,
        path: &Path,
        bytes: &[u8],
        state: WriteState,
    ) -> Result<(), WriteError> {
        self.writer
            .write(path, bytes)
            .map_err(|source| WriteError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        self.ledger.insert(path.to_path_buf(), state);
        Ok(())
    }

    /// Number of paths physically written this run.
    pub fn written_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingWriter;
    use super::*;
    use tempfile::TempDir;

    fn guard() -> OutputGuard<RecordingWriter> {
        OutputGuard::new(RecordingWriter::default())
    }

    // =========================================================================
    // State machine
    // =========================================================================

    #[test]
    fn first_normal_write_is_performed() {
        let mut g = guard();
        let outcome = g.write(Path::new("a.html"), b"one", false).unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(g.written_count(), 1);
    }

    #[test]
    fn second_normal_write_is_skipped() {
        let mut g = guard();
        g.write(Path::new("a.html"), b"one", false).unwrap();
        let outcome = g.write(Path::new("a.html"), b"two", false).unwrap();
        assert_eq!(outcome, WriteOutcome::Skipped);

        let writer = g.into_writer();
        assert_eq!(writer.writes.len(), 1);
        assert_eq!(writer.writes[0].1, b"one");
    }

    #[test]
    fn override_of_written_path_performs_second_write() {
        let mut g = guard();
        g.write(Path::new("a.html"), b"one", false).unwrap();
        let outcome = g.write(Path::new("a.html"), b"two", true).unwrap();
        assert_eq!(outcome, WriteOutcome::Written);

        let writer = g.into_writer();
        assert_eq!(writer.writes.len(), 2);
        assert_eq!(writer.writes[1].1, b"two");
    }

    #[test]
    fn override_of_unwritten_path_is_performed() {
        let mut g = guard();
        let outcome = g.write(Path::new("a.html"), b"one", true).unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
    }

    #[test]
    fn double_override_is_fatal() {
        let mut g = guard();
        g.write(Path::new("a.html"), b"one", true).unwrap();
        let err = g.write(Path::new("a.html"), b"two", true).unwrap_err();
        assert!(matches!(err, WriteError::DoubleOverride(p) if p == Path::new("a.html")));
    }

    #[test]
    fn normal_write_after_override_is_skipped() {
        let mut g = guard();
        g.write(Path::new("a.html"), b"one", true).unwrap();
        let outcome = g.write(Path::new("a.html"), b"two", false).unwrap();
        assert_eq!(outcome, WriteOutcome::Skipped);
        assert_eq!(g.into_writer().writes.len(), 1);
    }

    #[test]
    fn full_sequence_from_write_to_fatal() {
        // normal, normal (skip), override (second physical write), override
        // (fatal) - the whole lifecycle of one contested path
        let mut g = guard();
        let path = Path::new("a.html");
        assert_eq!(g.write(path, b"1", false).unwrap(), WriteOutcome::Written);
        assert_eq!(g.write(path, b"2", false).unwrap(), WriteOutcome::Skipped);
        assert_eq!(g.write(path, b"3", true).unwrap(), WriteOutcome::Written);
        assert!(g.write(path, b"4", true).is_err());

        let writer = g.into_writer();
        assert_eq!(writer.writes.len(), 2);
    }

    #[test]
    fn distinct_paths_do_not_interact() {
        let mut g = guard();
        g.write(Path::new("a.html"), b"a", false).unwrap();
        g.write(Path::new("b.html"), b"b", false).unwrap();
        assert_eq!(g.written_count(), 2);
        assert_eq!(g.into_writer().writes.len(), 2);
    }

    // =========================================================================
    // FsWriter
    // =========================================================================

    #[test]
    fn fs_writer_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let mut writer = FsWriter::new(tmp.path());
        writer
            .write(Path::new("tags/rust/index.html"), b"<html>")
            .unwrap();
        let written = std::fs::read(tmp.path().join("tags/rust/index.html")).unwrap();
        assert_eq!(written, b"<html>");
    }
}
