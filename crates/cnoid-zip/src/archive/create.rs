//! Packing a directory tree into a zip file

use crate::config::ArchiverConfig;
use crate::error::{Result, ZipError};
use crate::utils::{path_label, relative_path, zip_entry_name, zip_top_dir_name};
use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::ZipWriter;

/// Pack `source_dir` into a new zip file at `zip_path`
///
/// Every entry is placed under a top directory named after the zip file's
/// stem, so extracting `robot.zip` yields a single `robot/` folder. An
/// existing file at `zip_path` is replaced. On failure no zip file is left
/// at `zip_path`.
pub fn create_zip_file<P: AsRef<Path>, Q: AsRef<Path>>(zip_path: P, source_dir: Q) -> Result<()> {
    create_zip_file_with_config(zip_path, source_dir, &ArchiverConfig::default())
}

/// Pack `source_dir` into `zip_path` using the given configuration
///
/// An invalid `config` fails with `ZipFileCreation` before anything on
/// disk changes.
pub fn create_zip_file_with_config<P: AsRef<Path>, Q: AsRef<Path>>(
    zip_path: P,
    source_dir: Q,
    config: &ArchiverConfig,
) -> Result<()> {
    let zip_path = zip_path.as_ref();
    let source_dir = source_dir.as_ref();
    let zip_label = path_label(zip_path);

    info!("Packing {:?} into ZIP {:?}", source_dir, zip_path);

    config.validate().map_err(|e| {
        warn!(zip = %zip_label, error = %e, "Rejected archiver configuration");
        ZipError::zip_creation(&zip_label, e)
    })?;

    if fs::symlink_metadata(zip_path).is_ok() {
        if let Err(e) = fs::remove_file(zip_path) {
            warn!(zip = %zip_label, error = %e, "Cannot remove existing zip file");
            return Err(ZipError::existing_zip_removal(&zip_label, e));
        }
        debug!("Removed existing zip file {:?}", zip_path);
    }

    // The archive is staged next to its destination and only moved into
    // place once it is complete.
    let parent = match zip_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = staging_file(parent).map_err(|e| {
        warn!(zip = %zip_label, error = %e, "Cannot create zip file");
        ZipError::zip_creation(&zip_label, e)
    })?;
    let staging_path = staging
        .path()
        .canonicalize()
        .unwrap_or_else(|_| staging.path().to_path_buf());
    let file = staging
        .reopen()
        .map_err(|e| ZipError::zip_creation(&zip_label, e))?;

    let mut zip = ZipWriter::new(file);
    let top_dir = zip_top_dir_name(zip_path);
    if let Err(e) = pack_directory(&mut zip, source_dir, &top_dir, &staging_path, config) {
        // Dropping the writer closes the archive, dropping the staging
        // file deletes it.
        drop(zip);
        drop(staging);
        warn!(zip = %zip_label, error = %e, "Packing failed, zip file discarded");
        return Err(e);
    }

    zip.finish().map_err(|e| {
        warn!(zip = %zip_label, error = %e, "Cannot finish zip file");
        ZipError::zip_creation(&zip_label, e)
    })?;
    staging.persist(zip_path).map_err(|e| {
        warn!(zip = %zip_label, error = %e.error, "Cannot move zip file into place");
        ZipError::zip_creation(&zip_label, e.error)
    })?;

    info!("Successfully packed ZIP archive: {:?}", zip_path);
    Ok(())
}

/// Add `source_dir` and everything below it, depth first
fn pack_directory<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    source_dir: &Path,
    top_dir: &str,
    staging_path: &Path,
    config: &ArchiverConfig,
) -> Result<()> {
    for entry in WalkDir::new(source_dir).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => return Err(walk_error(source_dir, top_dir, e)),
        };
        let path = entry.path();
        let relative = relative_path(path, source_dir).unwrap_or_default();

        if entry.file_type().is_dir() {
            let name = zip_entry_name(top_dir, &relative, true);
            debug!("Adding directory to ZIP: {}", name);
            zip.add_directory(name.as_str(), config.directory_options())
                .map_err(|e| ZipError::directory_addition(&name, e))?;
        } else {
            if is_staging_file(path, staging_path) {
                continue;
            }
            let name = zip_entry_name(top_dir, &relative, false);
            debug!("Adding file to ZIP: {:?} as {}", path, name);
            pack_file(zip, path, &name, config).map_err(|e| ZipError::file_addition(&name, e))?;
        }
    }

    Ok(())
}

/// Stream one file into the archive
fn pack_file<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    path: &Path,
    name: &str,
    config: &ArchiverConfig,
) -> io::Result<()> {
    let mut file = File::open(path)?;
    zip.start_file(name, config.file_options())?;
    io::copy(&mut file, zip)?;
    Ok(())
}

/// Failures of the walk itself: an unreadable directory is a directory
/// addition failure, anything else a file addition failure
fn walk_error(source_dir: &Path, top_dir: &str, err: walkdir::Error) -> ZipError {
    let path: PathBuf = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| source_dir.to_path_buf());
    let relative = relative_path(&path, source_dir).unwrap_or_default();
    if err.depth() == 0 || path.is_dir() {
        ZipError::directory_addition(&zip_entry_name(top_dir, &relative, true), err)
    } else {
        ZipError::file_addition(&zip_entry_name(top_dir, &relative, false), err)
    }
}

fn staging_file(parent: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".cnoid-zip").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }
    builder.tempfile_in(parent)
}

fn is_staging_file(path: &Path, staging_path: &Path) -> bool {
    if path.file_name() != staging_path.file_name() {
        return false;
    }
    path.canonicalize()
        .map(|p| p == staging_path)
        .unwrap_or(false)
}
