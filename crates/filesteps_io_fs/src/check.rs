//! Precondition checks run before any mutation.
//!
//! Order per path: existence, permission, type. Each failure is reported to
//! the [`Reporter`] and returned as the matching [`FsOpError`] kind.

use std::fs;
use std::path::Path;

use crate::report::Reporter;
use crate::spec::{EnumSourceAccess, FsOpError, FsOpResult};
use crate::util::{is_readable, is_writable};

/// Validate the source entry of an operation.
///
/// # Errors
///
/// [`FsOpError::SourceMissing`] when nothing exists at `path`,
/// [`FsOpError::SourceUnreadable`] / [`FsOpError::SourceNotWritable`] when the
/// entry lacks the permission `access` asks for.
pub fn check_source(
    path: &Path,
    access: EnumSourceAccess,
    reporter: &dyn Reporter,
) -> FsOpResult<()> {
    let res_check = if !path.exists() {
        Err(FsOpError::SourceMissing {
            path: path.to_path_buf(),
        })
    } else {
        match access {
            EnumSourceAccess::Read if !is_readable(path) => Err(FsOpError::SourceUnreadable {
                path: path.to_path_buf(),
            }),
            EnumSourceAccess::Write if !is_writable(path) => Err(FsOpError::SourceNotWritable {
                path: path.to_path_buf(),
            }),
            _ => Ok(()),
        }
    };
    report_failure(res_check, reporter)
}

/// Validate, and create when missing, the destination directory.
///
/// Creating the directory (and missing ancestors) is the one mutation allowed
/// during checking.
///
/// # Errors
///
/// [`FsOpError::DestinationIsFile`], [`FsOpError::DestinationNotWritable`] or
/// [`FsOpError::DestinationCreateFailed`].
pub fn check_destination(path: &Path, reporter: &dyn Reporter) -> FsOpResult<()> {
    let res_check = if path.exists() {
        if !path.is_dir() {
            Err(FsOpError::DestinationIsFile {
                path: path.to_path_buf(),
            })
        } else if !is_writable(path) {
            Err(FsOpError::DestinationNotWritable {
                path: path.to_path_buf(),
            })
        } else {
            Ok(())
        }
    } else {
        match fs::create_dir_all(path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "created destination directory");
                Ok(())
            }
            Err(source) => Err(FsOpError::DestinationCreateFailed {
                path: path.to_path_buf(),
                source,
            }),
        }
    };
    report_failure(res_check, reporter)
}

/// Source then destination, for copy and move.
///
/// # Errors
///
/// First failing check of [`check_source`] or [`check_destination`].
pub fn check_transfer(source: &Path, into: &Path, reporter: &dyn Reporter) -> FsOpResult<()> {
    check_source(source, EnumSourceAccess::Read, reporter)?;
    check_destination(into, reporter)
}

fn report_failure(res_check: FsOpResult<()>, reporter: &dyn Reporter) -> FsOpResult<()> {
    if let Err(e) = &res_check {
        reporter.error(&e.to_string());
    }
    res_check
}
