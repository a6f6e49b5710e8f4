//! Error types for cnoid-zip

use std::fmt;
use thiserror::Error;

/// The phase of an archive operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A file already existed at the zip path and could not be deleted
    ExistingZipFileRemoval,
    /// The zip file could not be created or finalized
    ZipFileCreation,
    /// A directory entry could not be added while packing
    DirectoryAddition,
    /// A file entry could not be added while packing
    FileAddition,
    /// The zip file or zip data could not be opened
    ZipFileOpen,
    /// An entry header could not be read
    EntryExtraction,
    /// A destination directory could not be removed or created
    DirectoryCreation,
    /// A file entry could not be read or written
    FileExtraction,
    /// The archive holds directory entries only
    NoFileEntry,
}

impl ErrorKind {
    /// Name of the variant as exposed to scripting and log output
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ExistingZipFileRemoval => "ExistingZipFileRemovalError",
            ErrorKind::ZipFileCreation => "ZipFileCreationError",
            ErrorKind::DirectoryAddition => "DirectoryAdditionError",
            ErrorKind::FileAddition => "FileAdditionError",
            ErrorKind::ZipFileOpen => "ZipFileOpenError",
            ErrorKind::EntryExtraction => "EntryExtractionError",
            ErrorKind::DirectoryCreation => "DirectoryCreationError",
            ErrorKind::FileExtraction => "FileExtractionError",
            ErrorKind::NoFileEntry => "NoFileEntryError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of an archive operation
///
/// `system_message` carries the diagnostic of the layer that failed (the
/// filesystem or the zip library) and may be empty. `message` is the
/// sentence meant for display, naming the zip file or entry involved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ZipError {
    kind: ErrorKind,
    system_message: String,
    message: String,
}

impl ZipError {
    fn new(kind: ErrorKind, system_message: String, message: String) -> Self {
        Self {
            kind,
            system_message,
            message,
        }
    }

    /// Which phase failed
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Raw diagnostic from the filesystem or the zip library
    pub fn system_message(&self) -> &str {
        &self.system_message
    }

    /// Human-readable description
    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn existing_zip_removal(zip: &str, cause: impl fmt::Display) -> Self {
        let sys = cause.to_string();
        let message = format!(
            "The zip file \"{}\" already exists and cannot be removed: {}",
            zip, sys
        );
        Self::new(ErrorKind::ExistingZipFileRemoval, sys, message)
    }

    pub(crate) fn zip_creation(zip: &str, cause: impl fmt::Display) -> Self {
        let sys = cause.to_string();
        let message = format!("Failed to create the zip file \"{}\": {}", zip, sys);
        Self::new(ErrorKind::ZipFileCreation, sys, message)
    }

    pub(crate) fn directory_addition(entry: &str, cause: impl fmt::Display) -> Self {
        let sys = cause.to_string();
        let message = format!(
            "Failed to add directory \"{}\" to the zip file: {}",
            entry, sys
        );
        Self::new(ErrorKind::DirectoryAddition, sys, message)
    }

    pub(crate) fn file_addition(entry: &str, cause: impl fmt::Display) -> Self {
        let sys = cause.to_string();
        let message = format!("Failed to add file \"{}\" to the zip file: {}", entry, sys);
        Self::new(ErrorKind::FileAddition, sys, message)
    }

    pub(crate) fn zip_open(label: &str, from_buffer: bool, cause: impl fmt::Display) -> Self {
        let sys = cause.to_string();
        let message = if from_buffer {
            format!("Failed to open the zip data: {}", sys)
        } else {
            format!("Failed to open the zip file \"{}\": {}", label, sys)
        };
        Self::new(ErrorKind::ZipFileOpen, sys, message)
    }

    pub(crate) fn entry_extraction(index: usize, zip: &str, cause: impl fmt::Display) -> Self {
        let message = format!(
            "Entry {} in the zip file \"{}\" cannot be extracted.",
            index, zip
        );
        Self::new(ErrorKind::EntryExtraction, cause.to_string(), message)
    }

    pub(crate) fn directory_creation(entry: &str, zip: &str, cause: impl fmt::Display) -> Self {
        let sys = cause.to_string();
        let message = format!(
            "Directory \"{}\" in the zip file \"{}\" cannot be created: {}",
            entry, zip, sys
        );
        Self::new(ErrorKind::DirectoryCreation, sys, message)
    }

    pub(crate) fn file_extraction(entry: &str, zip: &str, cause: impl fmt::Display) -> Self {
        let sys = cause.to_string();
        let mut message = format!(
            "File \"{}\" in the zip file \"{}\" cannot be extracted.",
            entry, zip
        );
        if !sys.is_empty() {
            message.push(' ');
            message.push_str(&sys);
        }
        Self::new(ErrorKind::FileExtraction, sys, message)
    }

    pub(crate) fn no_file_entry(zip: &str) -> Self {
        let message = format!("The zip file \"{}\" does not contain any file.", zip);
        Self::new(ErrorKind::NoFileEntry, String::new(), message)
    }
}

/// Result alias used by every archive operation
pub type Result<T> = std::result::Result<T, ZipError>;
