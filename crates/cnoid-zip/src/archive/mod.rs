//! Archive operations module

pub mod create;
pub mod extract;

use crate::error::{Result, ZipError};
use crate::utils::{is_directory_entry, path_label};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::warn;
use zip::ZipArchive;

pub use create::{create_zip_file, create_zip_file_with_config};
pub use extract::{
    extract_single_file, extract_zip_file, extract_zip_file_into, extract_zip_file_with_config,
    extract_zip_files, extract_zip_files_into,
};

/// Entry name to decompressed content
pub type ZipFileMap = HashMap<String, Vec<u8>>;

/// Label used in messages for archives read from memory
pub const BUFFER_LABEL: &str = "<data>";

/// Where an archive is read from
#[derive(Debug, Clone, Copy)]
pub enum ZipSource<'a> {
    /// A zip file on disk
    Path(&'a Path),
    /// A complete zip archive held in memory
    Bytes(&'a [u8]),
}

impl<'a> ZipSource<'a> {
    /// Name used in messages and logs
    pub fn label(&self) -> String {
        match self {
            ZipSource::Path(path) => path_label(path),
            ZipSource::Bytes(_) => BUFFER_LABEL.to_string(),
        }
    }

    /// Open the archive for reading
    pub(crate) fn open(&self) -> Result<ZipArchive<Box<dyn ReadSeek + 'a>>> {
        let label = self.label();
        let reader: Box<dyn ReadSeek + 'a> = match *self {
            ZipSource::Path(path) => match File::open(path) {
                Ok(file) => Box::new(file),
                Err(e) => {
                    warn!(zip = %label, error = %e, "Cannot open zip file");
                    return Err(ZipError::zip_open(&label, false, e));
                }
            },
            ZipSource::Bytes(bytes) => Box::new(Cursor::new(bytes)),
        };
        ZipArchive::new(reader).map_err(|e| {
            warn!(zip = %label, error = %e, "Cannot read zip archive");
            ZipError::zip_open(&label, self.is_buffer(), e)
        })
    }

    fn is_buffer(&self) -> bool {
        matches!(self, ZipSource::Bytes(_))
    }
}

impl<'a> From<&'a Path> for ZipSource<'a> {
    fn from(path: &'a Path) -> Self {
        ZipSource::Path(path)
    }
}

impl<'a> From<&'a PathBuf> for ZipSource<'a> {
    fn from(path: &'a PathBuf) -> Self {
        ZipSource::Path(path.as_path())
    }
}

impl<'a> From<&'a str> for ZipSource<'a> {
    fn from(path: &'a str) -> Self {
        ZipSource::Path(Path::new(path))
    }
}

impl<'a> From<&'a [u8]> for ZipSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        ZipSource::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for ZipSource<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        ZipSource::Bytes(bytes.as_slice())
    }
}

/// Reader over either a file or an in-memory buffer
pub(crate) trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Result of extracting an archive into a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Files written, in archive order
    pub files: Vec<PathBuf>,
    /// Name of entry 0 when it is a directory marker (with its trailing `/`)
    pub top_dir: Option<String>,
}

/// Result of extracting every file of an archive into memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFiles {
    /// Entry name to content, directory markers excluded
    pub files: ZipFileMap,
    /// Name of entry 0 when it is a directory marker (with its trailing `/`)
    pub top_dir: Option<String>,
}

/// Top directory convention: entry 0, if it is a directory marker, names
/// the folder the archive was packed from
pub(crate) fn detect_top_dir<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
    if archive.is_empty() {
        return None;
    }
    let entry = archive.by_index_raw(0).ok()?;
    let name = entry.name();
    is_directory_entry(name).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_labels() {
        let path = PathBuf::from("models/robot.zip");
        assert_eq!(ZipSource::from(&path).label(), "models/robot.zip");
        assert_eq!(ZipSource::from(&b"PK"[..]).label(), "<data>");
    }

    #[test]
    fn test_open_garbage_buffer() {
        let data = b"definitely not a zip archive".to_vec();
        let err = ZipSource::from(&data).open().err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::ZipFileOpen);
        assert!(err.message().starts_with("Failed to open the zip data: "));
        assert!(!err.system_message().is_empty());
    }

    #[test]
    fn test_open_missing_file() {
        let err = ZipSource::from("/nonexistent/robot.zip").open().err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::ZipFileOpen);
        assert!(err.message().contains("\"/nonexistent/robot.zip\""));
    }
}
