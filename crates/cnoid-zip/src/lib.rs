//! cnoid-zip - zip archive engine
//!
//! Packs a directory tree into a zip file under a single top-level folder
//! named after the archive, and extracts zip archives read from disk or
//! from memory back into a directory, a single buffer, or a map of buffers.
//!
//! ```no_run
//! use cnoid_zip::archive::{create_zip_file, extract_zip_file};
//!
//! create_zip_file("project.zip", "work/project")?;
//! let extraction = extract_zip_file("project.zip", "restore")?;
//! assert_eq!(extraction.top_dir.as_deref(), Some("project/"));
//! # Ok::<(), cnoid_zip::ZipError>(())
//! ```

pub mod archive;
pub mod archiver;
pub mod config;
pub mod error;
pub mod utils;

pub use error::{ErrorKind, Result, ZipError};

// Re-export commonly used types
pub use archive::{
    create_zip_file, extract_single_file, extract_zip_file, extract_zip_files, ExtractedFiles,
    Extraction, ZipFileMap, ZipSource,
};
pub use archiver::ZipArchiver;
pub use config::{ArchiverConfig, Compression, ConfigError};
