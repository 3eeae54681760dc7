//! Move executor: copy into the destination, then remove the source.
//!
//! # Design
//!
//! - A transfer failure leaves the source untouched.
//! - A cleanup failure leaves a correct destination and a (partly) duplicated
//!   source; nothing is repaired.
//! - Only file sources are ever renamed. The destination directory already
//!   exists when execution starts, so a directory rename would replace it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::check::check_transfer;
use crate::copy::{EnumSourceKind, classify_source, copy_into, guard_overlap};
use crate::delete::remove_tree;
use crate::report::{ReportFsOp, ReportFsOpBuilder, Reporter};
use crate::spec::{
    EnumFsOperation, EnumMovePhase, EnumMoveStrategy, EnumSymlinkStrategy, FsOpError,
    FsOpResult, SpecTransferOptions, SpecTransferRequest,
};
use crate::util::{derive_file_destination, display_absolute};

type MoveResult<T> = Result<T, (EnumMovePhase, PathBuf, io::Error)>;

fn in_phase(phase: EnumMovePhase) -> impl Fn((PathBuf, io::Error)) -> (EnumMovePhase, PathBuf, io::Error) {
    move |(path, source)| (phase, path, source)
}

/// Move `request.source()` into the directory `request.into_dir()`.
///
/// Destination content afterwards equals what [`crate::copy`] would have
/// produced, and the source no longer exists.
///
/// # Errors
///
/// Any precondition failure of [`check_transfer`], or
/// [`FsOpError::MoveFailed`] tagged with the [`EnumMovePhase`] it happened in.
pub fn move_into(request: &SpecTransferRequest, reporter: &dyn Reporter) -> FsOpResult<ReportFsOp> {
    let path_src = request.source();
    let path_dst = request.into_dir();
    check_transfer(path_src, path_dst, reporter)?;

    reporter.info(&format!(
        "Move {} into {}",
        display_absolute(path_src),
        display_absolute(path_dst)
    ));
    tracing::info!(
        operation = "move",
        source = %path_src.display(),
        into = %path_dst.display(),
        "starting"
    );

    let mut builder_report = ReportFsOpBuilder::new(EnumFsOperation::Move);
    match relocate(path_src, path_dst, request.options(), &mut builder_report) {
        Ok(()) => {
            let report = builder_report.build();
            tracing::info!(operation = "move", summary = %report, "finished");
            reporter.info(report.message());
            Ok(report)
        }
        Err((phase, path, source)) => {
            tracing::error!(
                operation = "move",
                phase = ?phase,
                path = %path.display(),
                error = %source,
                "failed"
            );
            let err = FsOpError::moving(phase, path, source);
            reporter.error(&err.to_string());
            Err(err)
        }
    }
}

fn relocate(
    path_src: &Path,
    path_dir_dst: &Path,
    spec_options: &SpecTransferOptions,
    builder_report: &mut ReportFsOpBuilder,
) -> MoveResult<()> {
    let enum_kind =
        classify_source(path_src, spec_options.rule_symlink).map_err(in_phase(EnumMovePhase::Transfer))?;
    guard_overlap(path_src, path_dir_dst, enum_kind).map_err(in_phase(EnumMovePhase::Transfer))?;

    if spec_options.rule_move == EnumMoveStrategy::RenameWhenPossible
        && try_rename(path_src, path_dir_dst, enum_kind, spec_options, builder_report)
    {
        return Ok(());
    }

    let mut builder_copy = ReportFsOpBuilder::new(EnumFsOperation::Copy);
    copy_into(path_src, path_dir_dst, spec_options, &mut builder_copy)
        .map_err(in_phase(EnumMovePhase::Transfer))?;
    builder_report.absorb(builder_copy.build());

    let mut builder_cleanup = ReportFsOpBuilder::new(EnumFsOperation::Delete);
    let res_cleanup = remove_tree(path_src, &mut builder_cleanup);
    let report_cleanup = builder_cleanup.build();
    builder_report.absorb_removed(&report_cleanup);
    res_cleanup.map_err(in_phase(EnumMovePhase::Cleanup))
}

/// Attempt the whole move as one rename of a file or link. `false` means
/// "fall back".
fn try_rename(
    path_src: &Path,
    path_dir_dst: &Path,
    enum_kind: EnumSourceKind,
    spec_options: &SpecTransferOptions,
    builder_report: &mut ReportFsOpBuilder,
) -> bool {
    if !is_rename_equivalent(path_src, enum_kind, spec_options) {
        return false;
    }
    let Ok(path_target) = derive_file_destination(path_src, path_dir_dst) else {
        return false;
    };

    match fs::rename(path_src, &path_target) {
        Ok(()) => {
            tracing::debug!(src = %path_src.display(), dst = %path_target.display(), "renamed");
            builder_report.add_scanned();
            builder_report.add_copied();
            builder_report.add_removed();
            true
        }
        Err(e) => {
            tracing::warn!(
                src = %path_src.display(),
                dst = %path_target.display(),
                error = %e,
                "rename failed, falling back to copy then delete"
            );
            false
        }
    }
}

/// A rename never dereferences links and always keeps metadata, so it is only
/// used for a file (or kept link) when neither would show.
fn is_rename_equivalent(
    path_src: &Path,
    enum_kind: EnumSourceKind,
    spec_options: &SpecTransferOptions,
) -> bool {
    if enum_kind == EnumSourceKind::Directory || !spec_options.if_preserve_metadata {
        return false;
    }
    let b_root_is_link = fs::symlink_metadata(path_src)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(true);
    !(spec_options.rule_symlink == EnumSymlinkStrategy::Dereference && b_root_is_link)
}
