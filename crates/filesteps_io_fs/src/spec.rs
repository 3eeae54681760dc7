//! Operation requests, options, and top-level error types.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// The three supported filesystem steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFsOperation {
    /// Replicate source under the destination directory.
    Copy,
    /// Relocate source under the destination directory.
    Move,
    /// Remove source including all contents.
    Delete,
}

impl EnumFsOperation {
    /// Lowercase name used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Delete => "delete",
        }
    }

    /// Report prefix, e.g. `[COPY]`.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Copy => "[COPY]",
            Self::Move => "[MOVE]",
            Self::Delete => "[DELETE]",
        }
    }

    /// Fixed confirmation message emitted after a successful run.
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::Copy => "Copying successful",
            Self::Move => "Moving successful",
            Self::Delete => "Deletion successful",
        }
    }
}

/// Symlink handling policy for copy and move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSymlinkStrategy {
    /// Follow the link and copy the target bytes/entries.
    Dereference,
    /// Create a symbolic link at destination (do not copy target bytes).
    CopySymlinks,
}

/// How a move transfers entries into the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumMoveStrategy {
    /// Try an in-volume rename first, fall back to copy then delete.
    RenameWhenPossible,
    /// Always copy into destination, then delete the source tree.
    CopyThenDelete,
}

/// Which permission the source entry must grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSourceAccess {
    /// Copy and move read the source.
    Read,
    /// Delete needs write access on the entry itself.
    Write,
}

/// Phase of a move that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumMovePhase {
    /// Nothing was removed from source yet; source is intact.
    Transfer,
    /// Destination is complete; source may be partially left behind.
    Cleanup,
}

/// Stable failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFsErrorKind {
    SourceMissing,
    SourceUnreadable,
    SourceNotWritable,
    DestinationIsFile,
    DestinationNotWritable,
    DestinationCreateFailed,
    CopyFailed,
    MoveFailed,
    DeleteFailed,
    InvalidRequest,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndRequests

/// Input options for copy and move.
#[derive(Debug, Clone)]
pub struct SpecTransferOptions {
    /// Symlink handling behavior.
    pub rule_symlink: EnumSymlinkStrategy,
    /// Transfer behavior for move (ignored by copy).
    pub rule_move: EnumMoveStrategy,
    /// Carry permissions, timestamps and xattrs over to copied files.
    pub if_preserve_metadata: bool,
}

impl Default for SpecTransferOptions {
    fn default() -> Self {
        Self {
            rule_symlink: EnumSymlinkStrategy::Dereference,
            rule_move: EnumMoveStrategy::RenameWhenPossible,
            if_preserve_metadata: true,
        }
    }
}

/// Copy or move request: `source` ends up inside directory `into`.
#[derive(Debug, Clone)]
pub struct SpecTransferRequest {
    source: PathBuf,
    into: PathBuf,
    options: SpecTransferOptions,
}

impl SpecTransferRequest {
    /// Build a request with default options.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpError::InvalidRequest`] when either path is empty.
    pub fn new(source: impl Into<PathBuf>, into: impl Into<PathBuf>) -> Result<Self, FsOpError> {
        let source = source.into();
        let into = into.into();
        ensure_non_empty("file", &source)?;
        ensure_non_empty("into", &into)?;
        Ok(Self {
            source,
            into,
            options: SpecTransferOptions::default(),
        })
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: SpecTransferOptions) -> Self {
        self.options = options;
        self
    }

    /// File or directory to transfer.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Container directory the source lands in.
    pub fn into_dir(&self) -> &Path {
        &self.into
    }

    /// Active transfer options.
    pub fn options(&self) -> &SpecTransferOptions {
        &self.options
    }
}

/// Delete request.
#[derive(Debug, Clone)]
pub struct SpecDeleteRequest {
    source: PathBuf,
}

impl SpecDeleteRequest {
    /// # Errors
    ///
    /// Returns [`FsOpError::InvalidRequest`] when the path is empty.
    pub fn new(source: impl Into<PathBuf>) -> Result<Self, FsOpError> {
        let source = source.into();
        ensure_non_empty("file", &source)?;
        Ok(Self { source })
    }

    /// File or directory to remove.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

fn ensure_non_empty(field: &'static str, path: &Path) -> Result<(), FsOpError> {
    if path.as_os_str().is_empty() {
        return Err(FsOpError::InvalidRequest {
            field,
            reason: "path must not be empty",
        });
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Result type for filesystem steps.
pub type FsOpResult<T> = Result<T, FsOpError>;

/// Failure of a check or execution phase.
///
/// Display text is constant per kind; paths and causes live in the fields.
#[derive(Debug, Error)]
pub enum FsOpError {
    /// Source path does not exist.
    #[error("file does not exist")]
    SourceMissing {
        /// Offending source path.
        path: PathBuf,
    },
    /// Source exists but cannot be read (copy/move).
    #[error("file not readable")]
    SourceUnreadable {
        /// Offending source path.
        path: PathBuf,
    },
    /// Source exists but cannot be written (delete).
    #[error("file not writable")]
    SourceNotWritable {
        /// Offending source path.
        path: PathBuf,
    },
    /// Destination exists and is not a directory.
    #[error("into is a file")]
    DestinationIsFile {
        /// Offending destination path.
        path: PathBuf,
    },
    /// Destination directory exists but cannot be written.
    #[error("into not writable")]
    DestinationNotWritable {
        /// Offending destination path.
        path: PathBuf,
    },
    /// Destination directory was missing and could not be created.
    #[error("Directories could not be created")]
    DestinationCreateFailed {
        /// Destination path that failed creation.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// IO failure while copying.
    #[error("Copying failed")]
    CopyFailed {
        /// Entry being processed when the failure occurred.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// IO failure while moving.
    #[error("Moving failed")]
    MoveFailed {
        /// Whether the source was still intact.
        phase: EnumMovePhase,
        /// Entry being processed when the failure occurred.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// IO failure while deleting.
    #[error("Deleting failed")]
    DeleteFailed {
        /// Entry that could not be removed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Request could not be constructed.
    #[error("invalid request")]
    InvalidRequest {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
    },
}

impl FsOpError {
    /// Stable kind for matching without destructuring.
    pub const fn kind(&self) -> EnumFsErrorKind {
        match self {
            Self::SourceMissing { .. } => EnumFsErrorKind::SourceMissing,
            Self::SourceUnreadable { .. } => EnumFsErrorKind::SourceUnreadable,
            Self::SourceNotWritable { .. } => EnumFsErrorKind::SourceNotWritable,
            Self::DestinationIsFile { .. } => EnumFsErrorKind::DestinationIsFile,
            Self::DestinationNotWritable { .. } => EnumFsErrorKind::DestinationNotWritable,
            Self::DestinationCreateFailed { .. } => EnumFsErrorKind::DestinationCreateFailed,
            Self::CopyFailed { .. } => EnumFsErrorKind::CopyFailed,
            Self::MoveFailed { .. } => EnumFsErrorKind::MoveFailed,
            Self::DeleteFailed { .. } => EnumFsErrorKind::DeleteFailed,
            Self::InvalidRequest { .. } => EnumFsErrorKind::InvalidRequest,
        }
    }

    /// `true` for failures raised before any mutation was attempted.
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self.kind(),
            EnumFsErrorKind::SourceMissing
                | EnumFsErrorKind::SourceUnreadable
                | EnumFsErrorKind::SourceNotWritable
                | EnumFsErrorKind::DestinationIsFile
                | EnumFsErrorKind::DestinationNotWritable
                | EnumFsErrorKind::DestinationCreateFailed
        )
    }

    /// Path the failure refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::SourceMissing { path }
            | Self::SourceUnreadable { path }
            | Self::SourceNotWritable { path }
            | Self::DestinationIsFile { path }
            | Self::DestinationNotWritable { path }
            | Self::DestinationCreateFailed { path, .. }
            | Self::CopyFailed { path, .. }
            | Self::MoveFailed { path, .. }
            | Self::DeleteFailed { path, .. } => Some(path),
            Self::InvalidRequest { .. } => None,
        }
    }

    pub(crate) fn copy(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::CopyFailed {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn moving(phase: EnumMovePhase, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::MoveFailed {
            phase,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn delete(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::DeleteFailed {
            path: path.into(),
            source,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
