//! Stateful archiver that records the outcome of its last operation
//!
//! Each method returns `true` on success and `false` on failure; the error
//! of a failed call stays available through the accessors until the next
//! successful call. Code that does not need to poll state afterwards should
//! use the functions in [`crate::archive`] directly.

use crate::archive::{self, ExtractedFiles, Extraction, ZipFileMap, ZipSource};
use crate::config::ArchiverConfig;
use crate::error::{ErrorKind, Result, ZipError};
use std::mem;
use std::path::{Path, PathBuf};

/// Zip archiver with last-error state
#[derive(Debug, Default)]
pub struct ZipArchiver {
    config: ArchiverConfig,
    error: Option<ZipError>,
    extraction: Extraction,
    top_dir: String,
}

impl ZipArchiver {
    /// Create an archiver with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an archiver with the given configuration
    pub fn with_config(config: ArchiverConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Configuration used by every operation
    pub fn config(&self) -> &ArchiverConfig {
        &self.config
    }

    /// Pack `directory` into `zip_path` under a top folder named after the zip file
    pub fn create_zip_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        zip_path: P,
        directory: Q,
    ) -> bool {
        let result = archive::create_zip_file_with_config(zip_path, directory, &self.config);
        self.record(result).is_some()
    }

    /// Extract `zip_path` below `directory`
    ///
    /// [`extracted_files`](Self::extracted_files) and
    /// [`top_dir`](Self::top_dir) are rebuilt by this call, including when
    /// it fails part way.
    pub fn extract_zip_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        zip_path: P,
        directory: Q,
    ) -> bool {
        let result = archive::extract_zip_file_into(
            zip_path,
            directory,
            &self.config,
            &mut self.extraction,
        );
        self.top_dir = self.extraction.top_dir.clone().unwrap_or_default();
        self.record(result).is_some()
    }

    /// Read the first file of a zip file or zip buffer into `data`
    ///
    /// `data` is only replaced on success.
    pub fn extract_single_file<'a, S: Into<ZipSource<'a>>>(
        &mut self,
        source: S,
        data: &mut Vec<u8>,
    ) -> bool {
        let result = archive::extract_single_file(source);
        match self.record(result) {
            Some(content) => {
                *data = content;
                true
            }
            None => false,
        }
    }

    /// Read every file of a zip file or zip buffer into `files`
    ///
    /// Entries read before a failure stay in `files`.
    pub fn extract_zip_files<'a, S: Into<ZipSource<'a>>>(
        &mut self,
        source: S,
        files: &mut ZipFileMap,
    ) -> bool {
        let mut extracted = ExtractedFiles {
            files: mem::take(files),
            top_dir: None,
        };
        let result = archive::extract_zip_files_into(source, &mut extracted);
        *files = extracted.files;
        self.top_dir = extracted.top_dir.unwrap_or_default();
        self.record(result).is_some()
    }

    /// Kind of the last failure, `None` after a successful call
    pub fn error_type(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(ZipError::kind)
    }

    /// Diagnostic of the layer that failed, empty after a successful call
    pub fn system_error_message(&self) -> &str {
        self.error
            .as_ref()
            .map(ZipError::system_message)
            .unwrap_or_default()
    }

    /// Human-readable description of the last failure, empty after a successful call
    pub fn error_message(&self) -> &str {
        self.error
            .as_ref()
            .map(ZipError::message)
            .unwrap_or_default()
    }

    /// The last failure
    pub fn error(&self) -> Option<&ZipError> {
        self.error.as_ref()
    }

    /// Files written by the last [`extract_zip_file`](Self::extract_zip_file) call
    pub fn extracted_files(&self) -> &[PathBuf] {
        &self.extraction.files
    }

    /// Name of the leading directory entry found by the last extraction to a
    /// directory or to a map, empty if there was none
    pub fn top_dir(&self) -> &str {
        &self.top_dir
    }

    fn record<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.error = None;
                Some(value)
            }
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }
}
