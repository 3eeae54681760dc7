//! Copy executor: replicate a file or a directory's contents under a
//! destination directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::check::check_transfer;
use crate::report::{ReportFsOp, ReportFsOpBuilder, Reporter};
use crate::spec::{
    EnumFsOperation, EnumSymlinkStrategy, FsOpError, FsOpResult, SpecTransferOptions,
    SpecTransferRequest,
};
use crate::util::{
    EntryResult, at, copy_file_with_metadata, create_symbolic_link, derive_destination_path,
    derive_file_destination, display_absolute, ensure_directory, is_inside, is_same_location,
    walk_error,
};

/// Kind of the source root as seen under the active symlink policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnumSourceKind {
    File,
    Directory,
    Symlink,
}

#[derive(Debug)]
struct SpecCopyContext<'a> {
    path_dir_src: &'a Path,
    path_dir_dst: &'a Path,
    spec_options: &'a SpecTransferOptions,
    builder_report: &'a mut ReportFsOpBuilder,
}

/// Copy `request.source()` into the directory `request.into_dir()`.
///
/// A file lands at `into/<file name>`. A directory has its contents merged
/// into `into`: existing directories are reused, colliding files are
/// overwritten. The source is never modified.
///
/// # Errors
///
/// Any precondition failure of [`check_transfer`], or
/// [`FsOpError::CopyFailed`] for the first IO error while copying. The
/// destination may then hold a partial copy.
pub fn copy(request: &SpecTransferRequest, reporter: &dyn Reporter) -> FsOpResult<ReportFsOp> {
    let path_src = request.source();
    let path_dst = request.into_dir();
    check_transfer(path_src, path_dst, reporter)?;

    reporter.info(&format!(
        "Copy {} into {}",
        display_absolute(path_src),
        display_absolute(path_dst)
    ));
    tracing::info!(
        operation = "copy",
        source = %path_src.display(),
        into = %path_dst.display(),
        "starting"
    );

    let mut builder_report = ReportFsOpBuilder::new(EnumFsOperation::Copy);
    match copy_into(path_src, path_dst, request.options(), &mut builder_report) {
        Ok(()) => {
            let report = builder_report.build();
            tracing::info!(operation = "copy", summary = %report, "finished");
            reporter.info(report.message());
            Ok(report)
        }
        Err((path, source)) => {
            tracing::error!(operation = "copy", path = %path.display(), error = %source, "failed");
            let err = FsOpError::copy(path, source);
            reporter.error(&err.to_string());
            Err(err)
        }
    }
}

/// Classify the source root; `Dereference` looks through a root symlink.
pub(crate) fn classify_source(
    path_src: &Path,
    rule_symlink: EnumSymlinkStrategy,
) -> EntryResult<EnumSourceKind> {
    let meta_src = match rule_symlink {
        EnumSymlinkStrategy::Dereference => at(path_src, fs::metadata(path_src))?,
        EnumSymlinkStrategy::CopySymlinks => at(path_src, fs::symlink_metadata(path_src))?,
    };
    let file_type = meta_src.file_type();
    if file_type.is_symlink() {
        Ok(EnumSourceKind::Symlink)
    } else if file_type.is_dir() {
        Ok(EnumSourceKind::Directory)
    } else {
        Ok(EnumSourceKind::File)
    }
}

/// Refuse transfers whose output would land on or inside their own input.
pub(crate) fn guard_overlap(
    path_src: &Path,
    path_dir_dst: &Path,
    enum_kind: EnumSourceKind,
) -> EntryResult<()> {
    let b_is_overlap = match enum_kind {
        EnumSourceKind::Directory => is_inside(path_dir_dst, path_src),
        EnumSourceKind::File | EnumSourceKind::Symlink => {
            let path_dst = at(path_src, derive_file_destination(path_src, path_dir_dst))?;
            is_same_location(path_src, &path_dst)
        }
    };
    if b_is_overlap {
        return Err((
            path_src.to_path_buf(),
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Source and destination overlap: {} <-> {}",
                    path_src.display(),
                    path_dir_dst.display()
                ),
            ),
        ));
    }
    Ok(())
}

/// Execution phase of copy, shared with move.
pub(crate) fn copy_into(
    path_src: &Path,
    path_dir_dst: &Path,
    spec_options: &SpecTransferOptions,
    builder_report: &mut ReportFsOpBuilder,
) -> EntryResult<()> {
    let enum_kind = classify_source(path_src, spec_options.rule_symlink)?;
    guard_overlap(path_src, path_dir_dst, enum_kind)?;

    match enum_kind {
        EnumSourceKind::File => {
            builder_report.add_scanned();
            let path_file_dst = at(path_src, derive_file_destination(path_src, path_dir_dst))?;
            tracing::debug!(src = %path_src.display(), dst = %path_file_dst.display(), "copy file");
            at(
                &path_file_dst,
                copy_file_with_metadata(path_src, &path_file_dst, spec_options.if_preserve_metadata),
            )?;
            builder_report.add_copied();
            Ok(())
        }
        EnumSourceKind::Symlink => {
            builder_report.add_scanned();
            let path_link_dst = at(path_src, derive_file_destination(path_src, path_dir_dst))?;
            at(&path_link_dst, create_symbolic_link(path_src, &path_link_dst))?;
            builder_report.add_copied();
            Ok(())
        }
        EnumSourceKind::Directory => {
            let mut spec_ctx = SpecCopyContext {
                path_dir_src: path_src,
                path_dir_dst,
                spec_options,
                builder_report,
            };
            walk_directory(&mut spec_ctx)
        }
    }
}

fn walk_directory(spec_ctx: &mut SpecCopyContext<'_>) -> EntryResult<()> {
    let b_follow = spec_ctx.spec_options.rule_symlink == EnumSymlinkStrategy::Dereference;
    // Listed up front: `path_dir_dst` may be an ancestor of the source.
    let l_entries = WalkDir::new(spec_ctx.path_dir_src)
        .min_depth(1)
        .follow_links(b_follow)
        .sort_by_file_name()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| walk_error(spec_ctx.path_dir_src, e))?;

    for entry in l_entries {
        spec_ctx.builder_report.add_scanned();

        let path_dst = derive_destination_path(
            entry.path(),
            spec_ctx.path_dir_src,
            spec_ctx.path_dir_dst,
        );
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            handle_symlink_entry(entry.path(), path_dst, spec_ctx)?;
        } else if file_type.is_dir() {
            handle_dir_entry(path_dst, spec_ctx)?;
        } else if file_type.is_file() {
            handle_file_entry(entry.path(), path_dst, spec_ctx)?;
        } else {
            spec_ctx
                .builder_report
                .add_warning(format!("Special file skipped: {}", entry.path().display()));
            spec_ctx.builder_report.add_skipped();
        }
    }
    Ok(())
}

fn handle_dir_entry(path_dir_dst_sub: PathBuf, spec_ctx: &mut SpecCopyContext<'_>) -> EntryResult<()> {
    if at(&path_dir_dst_sub, ensure_directory(&path_dir_dst_sub))? {
        spec_ctx.builder_report.add_copied();
    } else {
        // Already present: merged, not replaced.
        spec_ctx.builder_report.add_skipped();
    }
    Ok(())
}

fn handle_file_entry(
    path_file_src: &Path,
    path_file_dst: PathBuf,
    spec_ctx: &mut SpecCopyContext<'_>,
) -> EntryResult<()> {
    tracing::debug!(src = %path_file_src.display(), dst = %path_file_dst.display(), "copy file");
    at(
        &path_file_dst,
        copy_file_with_metadata(
            path_file_src,
            &path_file_dst,
            spec_ctx.spec_options.if_preserve_metadata,
        ),
    )?;
    spec_ctx.builder_report.add_copied();
    Ok(())
}

fn handle_symlink_entry(
    path_link_src: &Path,
    path_link_dst: PathBuf,
    spec_ctx: &mut SpecCopyContext<'_>,
) -> EntryResult<()> {
    tracing::debug!(src = %path_link_src.display(), dst = %path_link_dst.display(), "copy symlink");
    at(&path_link_dst, create_symbolic_link(path_link_src, &path_link_dst))?;
    spec_ctx.builder_report.add_copied();
    Ok(())
}
