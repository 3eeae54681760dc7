//! Delete executor.

use std::fs;
use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::check::check_source;
use crate::report::{ReportFsOp, ReportFsOpBuilder, Reporter};
use crate::spec::{EnumFsOperation, EnumSourceAccess, FsOpError, FsOpResult, SpecDeleteRequest};
use crate::util::{EntryResult, at, display_absolute, remove_entry, walk_error};

/// Remove `request.source()` including everything below it.
///
/// Deleting is guarded by the source check, so a second call on the same
/// path fails with [`FsOpError::SourceMissing`] rather than succeeding
/// silently.
///
/// # Errors
///
/// Source check failures, or [`FsOpError::DeleteFailed`] for the first entry
/// that could not be removed. Entries removed before that stay removed.
pub fn delete(request: &SpecDeleteRequest, reporter: &dyn Reporter) -> FsOpResult<ReportFsOp> {
    let path_src = request.source();
    check_source(path_src, EnumSourceAccess::Write, reporter)?;

    reporter.info(&format!("Deleting {}", display_absolute(path_src)));
    tracing::info!(operation = "delete", source = %path_src.display(), "starting");

    let mut builder_report = ReportFsOpBuilder::new(EnumFsOperation::Delete);
    match remove_tree(path_src, &mut builder_report) {
        Ok(()) => {
            let report = builder_report.build();
            tracing::info!(operation = "delete", summary = %report, "finished");
            reporter.info(report.message());
            Ok(report)
        }
        Err((path, source)) => {
            tracing::error!(operation = "delete", path = %path.display(), error = %source, "failed");
            let err = FsOpError::delete(path, source);
            reporter.error(&err.to_string());
            Err(err)
        }
    }
}

/// Collect the subtree rooted at `path_root`, deepest entries first.
///
/// Links are never followed, not even at the root, so only the link itself is
/// ever removed.
pub(crate) fn collect_post_order(path_root: &Path) -> EntryResult<Vec<DirEntry>> {
    let mut l_entries = Vec::new();
    for entry_res in WalkDir::new(path_root)
        .follow_links(false)
        .follow_root_links(false)
        .sort_by_file_name()
    {
        l_entries.push(entry_res.map_err(|e| walk_error(path_root, e))?);
    }
    // Stable: siblings keep walk order.
    l_entries.sort_by_key(|entry| std::cmp::Reverse(entry.depth()));
    Ok(l_entries)
}

/// Execution phase of delete, shared with the cleanup phase of move.
pub(crate) fn remove_tree(path_root: &Path, builder_report: &mut ReportFsOpBuilder) -> EntryResult<()> {
    let meta_root = at(path_root, fs::symlink_metadata(path_root))?;
    if !meta_root.is_dir() {
        builder_report.add_scanned();
        at(path_root, remove_entry(path_root, meta_root.file_type()))?;
        builder_report.add_removed();
        return Ok(());
    }

    let l_entries = collect_post_order(path_root)?;
    for entry in l_entries {
        builder_report.add_scanned();
        tracing::debug!(path = %entry.path().display(), depth = entry.depth(), "remove");
        at(entry.path(), remove_entry(entry.path(), entry.file_type()))?;
        builder_report.add_removed();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::{collect_post_order, delete};
    use crate::report::{EnumReportLevel, MemoryReporter};
    use crate::spec::{EnumFsErrorKind, SpecDeleteRequest};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, txt).expect("write text");
    }

    #[test]
    fn delete_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("delete/fileToDelete.txt");
        write_text(&path_file, "bye");

        let reporter = MemoryReporter::new();
        let report = delete(&SpecDeleteRequest::new(&path_file).expect("request"), &reporter)
            .expect("delete");
        assert!(!path_file.exists());
        assert!(tmp.path().join("delete").is_dir());
        assert_eq!(report.cnt_removed, 1);
        assert_eq!(
            reporter.messages(EnumReportLevel::Info).last().map(String::as_str),
            Some("Deletion successful")
        );
    }

    #[test]
    fn delete_dir_removes_every_descendant() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_dir = tmp.path().join("dirToDelete");
        write_text(&path_dir.join("a.txt"), "a");
        write_text(&path_dir.join("sub/b.txt"), "b");
        write_text(&path_dir.join("sub/deeper/c.txt"), "c");
        fs::create_dir_all(path_dir.join("empty")).expect("mkdir empty");

        let report = delete(
            &SpecDeleteRequest::new(&path_dir).expect("request"),
            &MemoryReporter::new(),
        )
        .expect("delete");
        assert!(!path_dir.exists());
        // root, a.txt, sub, b.txt, deeper, c.txt, empty
        assert_eq!(report.cnt_removed, 7);
    }

    #[test]
    fn delete_twice_reports_source_missing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("once.txt");
        write_text(&path_file, "x");
        let request = SpecDeleteRequest::new(&path_file).expect("request");

        delete(&request, &MemoryReporter::new()).expect("first delete");
        let reporter = MemoryReporter::new();
        let err = delete(&request, &reporter).expect_err("second delete");
        assert_eq!(err.kind(), EnumFsErrorKind::SourceMissing);
        assert_eq!(
            reporter.messages(EnumReportLevel::Error),
            vec!["file does not exist".to_string()]
        );
    }

    #[test]
    fn post_order_lists_children_before_parents() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("root");
        write_text(&root.join("x/y/z.txt"), "z");

        let l_entries = collect_post_order(&root).expect("walk");
        let l_depths: Vec<usize> = l_entries.iter().map(|e| e.depth()).collect();
        assert_eq!(l_depths, vec![3, 2, 1, 0]);
        assert_eq!(l_entries.last().map(|e| e.path()), Some(root.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn delete_removes_links_without_touching_targets() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().expect("tempdir");
        let outside = tmp.path().join("outside");
        let path_dir = tmp.path().join("victim");
        write_text(&outside.join("keep.txt"), "keep");
        fs::create_dir_all(&path_dir).expect("mkdir");
        symlink(&outside, path_dir.join("link_dir")).expect("dir link");

        delete(
            &SpecDeleteRequest::new(&path_dir).expect("request"),
            &MemoryReporter::new(),
        )
        .expect("delete");
        assert!(!path_dir.exists());
        assert!(outside.join("keep.txt").exists());

        let path_root_link = tmp.path().join("root_link");
        symlink(&outside, &path_root_link).expect("root link");
        delete(
            &SpecDeleteRequest::new(&path_root_link).expect("request"),
            &MemoryReporter::new(),
        )
        .expect("delete root link");
        assert!(fs::symlink_metadata(&path_root_link).is_err());
        assert!(outside.join("keep.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn delete_failure_keeps_already_removed_entries_removed() {
        use std::os::unix::fs::PermissionsExt;

        if nix::unistd::geteuid().is_root() {
            return;
        }
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_dir = tmp.path().join("tree");
        write_text(&path_dir.join("a_free/gone.txt"), "x");
        write_text(&path_dir.join("b_locked/stuck.txt"), "x");
        let path_locked = path_dir.join("b_locked");
        fs::set_permissions(&path_locked, fs::Permissions::from_mode(0o500)).expect("lock");

        let err = delete(
            &SpecDeleteRequest::new(&path_dir).expect("request"),
            &MemoryReporter::new(),
        )
        .expect_err("locked dir");
        assert_eq!(err.kind(), EnumFsErrorKind::DeleteFailed);
        assert_eq!(err.to_string(), "Deleting failed");
        assert!(path_locked.join("stuck.txt").exists());
        assert!(!path_dir.join("a_free/gone.txt").exists());

        fs::set_permissions(&path_locked, fs::Permissions::from_mode(0o700)).expect("unlock");
    }
}
