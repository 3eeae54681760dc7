use std::fs;
use std::io;
use std::path::{Path, PathBuf};

////////////////////////////////////////////////////////////////////////////////
// #region AccessProbes

/// `access(2)`-style read check on the entry itself.
#[cfg(unix)]
pub(crate) fn is_readable(path: &Path) -> bool {
    use nix::unistd::{AccessFlags, access};
    access(path, AccessFlags::R_OK).is_ok()
}

#[cfg(not(unix))]
pub(crate) fn is_readable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => fs::read_dir(path).is_ok(),
        Ok(_) => fs::File::open(path).is_ok(),
        Err(_) => false,
    }
}

/// `access(2)`-style write check on the entry itself.
#[cfg(unix)]
pub(crate) fn is_writable(path: &Path) -> bool {
    use nix::unistd::{AccessFlags, access};
    access(path, AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
pub(crate) fn is_writable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| !meta.permissions().readonly())
        .unwrap_or(false)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Failing entry plus the IO error it raised.
pub(crate) type EntryResult<T> = Result<T, (PathBuf, io::Error)>;

pub(crate) fn at<T>(path: &Path, res: io::Result<T>) -> EntryResult<T> {
    res.map_err(|e| (path.to_path_buf(), e))
}

pub(crate) fn walk_error(path_root: &Path, err: walkdir::Error) -> (PathBuf, io::Error) {
    let path = err.path().unwrap_or(path_root).to_path_buf();
    let message = err.to_string();
    let source = err.into_io_error().unwrap_or_else(|| io::Error::other(message));
    (path, source)
}

/// Absolute form for messages; falls back to the path as given.
pub(crate) fn display_absolute(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn _normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// `true` when `dst` is `src` or lies below it after resolution. An ancestor
/// `dst` is fine.
pub(crate) fn is_inside(dst: &Path, src: &Path) -> bool {
    _normalize_path(dst).starts_with(_normalize_path(src))
}

/// `true` when both paths resolve to the same location.
pub(crate) fn is_same_location(a: &Path, b: &Path) -> bool {
    _normalize_path(a) == _normalize_path(b)
}

/// Map an entry below `path_dir_src` to the same relative place below
/// `path_dir_dst`.
pub(crate) fn derive_destination_path(
    path_src: &Path,
    path_dir_src: &Path,
    path_dir_dst: &Path,
) -> PathBuf {
    match path_src.strip_prefix(path_dir_src) {
        Ok(path_rel) => path_dir_dst.join(path_rel),
        Err(_) => path_dir_dst.join(path_src.file_name().unwrap_or_default()),
    }
}

/// `destination/<file name of source>`.
pub(crate) fn derive_file_destination(path_file_src: &Path, path_dir_dst: &Path) -> io::Result<PathBuf> {
    let name = path_file_src.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("source has no file name: {}", path_file_src.display()),
        )
    })?;
    Ok(path_dir_dst.join(name))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region EntryOperations

/// Remove one entry that is known to have no children left.
///
/// Symlinks are removed as links, never followed.
pub(crate) fn remove_entry(path: &Path, file_type: fs::FileType) -> io::Result<()> {
    if file_type.is_dir() {
        return fs::remove_dir(path);
    }
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        #[cfg(windows)]
        Err(_) if file_type.is_symlink() => fs::remove_dir(path),
        Err(e) => Err(e),
    }
}

/// Make sure a directory exists at `path_dir_dst`; an existing directory is
/// merged into, anything else is an error.
///
/// Returns `true` when the directory was created.
pub(crate) fn ensure_directory(path_dir_dst: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path_dir_dst) {
        Ok(meta) if meta.is_dir() => Ok(false),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "Destination is a file, expected directory: {}",
                path_dir_dst.display()
            ),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path_dir_dst)?;
            Ok(true)
        }
        Err(e) => Err(e),
    }
}

/// Remove whatever non-directory entry sits at `path_dst` so a file or link
/// can take its place. Existing directories are refused.
/// Read-only targets are replaced, never written through.
pub(crate) fn prepare_file_slot(path_dst: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path_dst) {
        Ok(meta) if meta.is_dir() => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Destination is a directory: {}", path_dst.display()),
        )),
        Ok(meta) => remove_entry(path_dst, meta.file_type()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

pub(crate) fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    let target = fs::read_link(path_src)?;
    prepare_file_slot(path_dst)?;

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if path_src.is_dir() {
            symlink_dir(&target, path_dst)
        } else {
            symlink_file(&target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = target;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

/// Copy bytes, then carry metadata over when asked to.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_preserve_metadata: bool,
) -> Result<(), io::Error> {
    prepare_file_slot(path_file_dst)?;
    fs::copy(path_file_src, path_file_dst)?;
    if if_preserve_metadata {
        apply_metadata(path_file_src, path_file_dst)?;
    }
    Ok(())
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);

    fs::set_permissions(path_file_dst, stat_src.permissions())?;
    Ok(())
}

/// Best-effort: filesystems without xattr support, or attributes the
/// caller may not set (`security.*`, `trusted.*`), never fail the copy.
#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let l_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(path = %path_file_src.display(), error = %e, "xattrs not listed");
            return;
        }
    };

    for name in l_names {
        let raw_value = match xattr::get(path_file_src, &name) {
            Ok(Some(v)) => v,
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!(path = %path_file_src.display(), attr = ?name, error = %e, "xattr not read");
                continue;
            }
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            tracing::debug!(path = %path_file_dst.display(), attr = ?name, error = %e, "xattr not set");
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
