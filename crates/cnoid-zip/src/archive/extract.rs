//! Extracting zip archives to a directory or into memory

use super::{detect_top_dir, ExtractedFiles, Extraction, ZipSource};
use crate::config::ArchiverConfig;
use crate::error::{Result, ZipError};
use crate::utils::is_directory_entry;
use std::fs::{self, File};
use std::io::{self, Read, Seek, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Extract every entry of the zip file at `zip_path` below `destination`
///
/// Directory entries replace whatever already exists at their destination.
/// Extraction stops at the first failure; files written up to that point
/// stay on disk.
pub fn extract_zip_file<P: AsRef<Path>, Q: AsRef<Path>>(
    zip_path: P,
    destination: Q,
) -> Result<Extraction> {
    extract_zip_file_with_config(zip_path, destination, &ArchiverConfig::default())
}

/// Extract `zip_path` below `destination` using the given configuration
pub fn extract_zip_file_with_config<P: AsRef<Path>, Q: AsRef<Path>>(
    zip_path: P,
    destination: Q,
    config: &ArchiverConfig,
) -> Result<Extraction> {
    let mut extraction = Extraction::default();
    extract_zip_file_into(zip_path, destination, config, &mut extraction)?;
    Ok(extraction)
}

/// Extract `zip_path` below `destination`, recording progress in `extraction`
///
/// `extraction` is reset first. When the call fails it still lists the
/// files written before the failure.
pub fn extract_zip_file_into<P: AsRef<Path>, Q: AsRef<Path>>(
    zip_path: P,
    destination: Q,
    config: &ArchiverConfig,
    extraction: &mut Extraction,
) -> Result<()> {
    let zip_path = zip_path.as_ref();
    let destination = destination.as_ref();
    extraction.files.clear();
    extraction.top_dir = None;

    info!("Extracting ZIP {:?} to {:?}", zip_path, destination);

    let source = ZipSource::Path(zip_path);
    let mut archive = source.open()?;
    extraction.top_dir = detect_top_dir(&mut archive);

    let zip_label = source.label();
    let mut buffer = vec![0u8; config.chunk_size.max(1)];

    for index in 0..archive.len() {
        let (name, size, enclosed) = match archive.by_index_raw(index) {
            Ok(entry) => (entry.name().to_string(), entry.size(), entry.enclosed_name()),
            Err(e) => {
                warn!(zip = %zip_label, index, error = %e, "Cannot read entry header");
                return Err(ZipError::entry_extraction(index, &zip_label, e));
            }
        };

        if is_directory_entry(&name) {
            let dir_path = match enclosed {
                Some(relative) => destination.join(relative),
                None => {
                    return Err(ZipError::directory_creation(
                        &name,
                        &zip_label,
                        "entry path escapes the destination directory",
                    ))
                }
            };
            debug!("Creating directory: {:?}", dir_path);
            replace_directory(&dir_path).map_err(|e| {
                warn!(entry = %name, error = %e, "Cannot create directory");
                ZipError::directory_creation(&name, &zip_label, e)
            })?;
        } else {
            let file_path = match enclosed {
                Some(relative) => destination.join(relative),
                None => {
                    return Err(ZipError::file_extraction(
                        &name,
                        &zip_label,
                        "entry path escapes the destination directory",
                    ))
                }
            };
            debug!("Extracting: {} -> {:?}", name, file_path);
            write_entry(&mut archive, index, size, &file_path, &mut buffer).map_err(|e| {
                warn!(entry = %name, error = %e, "Cannot extract file");
                ZipError::file_extraction(&name, &zip_label, e)
            })?;
            extraction.files.push(file_path);
        }
    }

    info!(
        "Successfully extracted ZIP archive ({} files)",
        extraction.files.len()
    );
    Ok(())
}

/// Remove anything at `path`, then create it as a directory
fn replace_directory(path: &Path) -> io::Result<()> {
    if let Ok(metadata) = fs::symlink_metadata(path) {
        warn!("Replacing existing {:?}", path);
        if metadata.is_dir() {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_file(path)?;
        }
    }
    fs::create_dir_all(path)
}

/// Largest buffer reserved up front for an in-memory entry (16 MiB)
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// Copy entry `index` to `path` chunk by chunk until `size` bytes are written
///
/// The entry must end exactly at `size` bytes; the trailing read is what
/// lets the zip reader verify the CRC.
fn write_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    size: u64,
    path: &Path,
    buffer: &mut [u8],
) -> io::Result<()> {
    let mut entry = archive.by_index(index)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut output = File::create(path)?;

    let mut written: u64 = 0;
    while written < size {
        let len = entry.read(buffer)?;
        if len == 0 {
            return Err(short_read(written, size));
        }
        output.write_all(&buffer[..len])?;
        written += len as u64;
    }
    expect_end(&mut entry, size)?;
    output.flush()
}

/// Require `entry` to be exhausted after its declared `size`
fn expect_end<R: Read>(entry: &mut R, size: u64) -> io::Result<()> {
    let mut extra = [0u8; 1];
    match entry.read(&mut extra)? {
        0 => Ok(()),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("entry holds more than the declared {} bytes", size),
        )),
    }
}

fn short_read(read: u64, declared: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("read {} of {} bytes", read, declared),
    )
}

/// Read the first file entry of an archive into memory
///
/// Directory entries are skipped. Archives holding only directories fail
/// with [`ErrorKind::NoFileEntry`](crate::ErrorKind::NoFileEntry).
pub fn extract_single_file<'a, S: Into<ZipSource<'a>>>(source: S) -> Result<Vec<u8>> {
    let source = source.into();
    let zip_label = source.label();
    info!("Extracting single file from ZIP {}", zip_label);

    let mut archive = source.open()?;
    for index in 0..archive.len() {
        let (name, size) = entry_header(&mut archive, index, &zip_label)?;
        if is_directory_entry(&name) {
            continue;
        }
        debug!("Reading {} ({} bytes)", name, size);
        return read_entry(&mut archive, index, size).map_err(|e| {
            warn!(entry = %name, error = %e, "Cannot extract file");
            ZipError::file_extraction(&name, &zip_label, e)
        });
    }

    warn!(zip = %zip_label, "No file entry found");
    Err(ZipError::no_file_entry(&zip_label))
}

/// Read every file entry of an archive into memory
pub fn extract_zip_files<'a, S: Into<ZipSource<'a>>>(source: S) -> Result<ExtractedFiles> {
    let mut extracted = ExtractedFiles::default();
    extract_zip_files_into(source, &mut extracted)?;
    Ok(extracted)
}

/// Read every file entry into `extracted.files`
///
/// `extracted.top_dir` is reset first; entries already in the map are
/// kept unless the archive holds an entry of the same name, which
/// overwrites it. Entries read before a failure remain in the map.
pub fn extract_zip_files_into<'a, S: Into<ZipSource<'a>>>(
    source: S,
    extracted: &mut ExtractedFiles,
) -> Result<()> {
    let source = source.into();
    let zip_label = source.label();
    extracted.top_dir = None;
    info!("Extracting files from ZIP {} into memory", zip_label);

    let mut archive = source.open()?;
    extracted.top_dir = detect_top_dir(&mut archive);

    for index in 0..archive.len() {
        let (name, size) = entry_header(&mut archive, index, &zip_label)?;
        if is_directory_entry(&name) {
            continue;
        }
        debug!("Reading {} ({} bytes)", name, size);
        let data = read_entry(&mut archive, index, size).map_err(|e| {
            warn!(entry = %name, error = %e, "Cannot extract file");
            ZipError::file_extraction(&name, &zip_label, e)
        })?;
        extracted.files.insert(name, data);
    }

    info!(
        "Successfully read {} files from ZIP {}",
        extracted.files.len(),
        zip_label
    );
    Ok(())
}

/// Name and declared size of entry `index`
fn entry_header<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    zip_label: &str,
) -> Result<(String, u64)> {
    match archive.by_index_raw(index) {
        Ok(entry) => Ok((entry.name().to_string(), entry.size())),
        Err(e) => {
            warn!(zip = %zip_label, index, error = %e, "Cannot read entry header");
            Err(ZipError::entry_extraction(index, zip_label, e))
        }
    }
}

/// Read entry `index` completely, requiring exactly `size` bytes
fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    size: u64,
) -> io::Result<Vec<u8>> {
    let mut entry = archive.by_index(index)?;
    let mut data = Vec::new();
    // The declared size comes from the archive and is not trusted.
    let reserve = usize::try_from(size.min(MAX_PREALLOCATION)).unwrap_or(0);
    data.try_reserve(reserve)
        .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
    (&mut entry).take(size).read_to_end(&mut data)?;
    if data.len() as u64 != size {
        return Err(short_read(data.len() as u64, size));
    }
    expect_end(&mut entry, size)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use cnoid_zip_testing::{build_zip, ZipEntrySpec};
    use tempfile::TempDir;

    #[test]
    fn test_small_chunks_copy_whole_entry() {
        let temp_dir = TempDir::new().unwrap();
        let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let zip_path = temp_dir.path().join("chunks.zip");
        let data = build_zip(&[ZipEntrySpec::File("data.bin", &content)]).unwrap();
        fs::write(&zip_path, data).unwrap();
        let config = ArchiverConfig {
            chunk_size: 7,
            ..Default::default()
        };

        let extraction =
            extract_zip_file_with_config(&zip_path, temp_dir.path().join("out"), &config).unwrap();

        assert_eq!(extraction.files.len(), 1);
        assert_eq!(fs::read(&extraction.files[0]).unwrap(), content);
        assert_eq!(extraction.top_dir, None);
    }

    #[test]
    fn test_file_without_directory_entry_gets_parents() {
        let temp_dir = TempDir::new().unwrap();
        let zip_path = temp_dir.path().join("flat.zip");
        let data = build_zip(&[ZipEntrySpec::File("a/b/c.txt", b"deep")]).unwrap();
        fs::write(&zip_path, data).unwrap();

        let out = temp_dir.path().join("out");
        extract_zip_file(&zip_path, &out).unwrap();

        assert_eq!(fs::read(out.join("a/b/c.txt")).unwrap(), b"deep");
    }

    #[test]
    fn test_escaping_entry_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let zip_path = temp_dir.path().join("evil.zip");
        let data = build_zip(&[ZipEntrySpec::File("../evil.txt", b"x")]).unwrap();
        fs::write(&zip_path, data).unwrap();

        let out = temp_dir.path().join("out");
        let err = extract_zip_file(&zip_path, &out).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::FileExtraction);
        assert!(!temp_dir.path().join("evil.txt").exists());
    }

    #[test]
    fn test_single_file_skips_directories() {
        let data = build_zip(&[
            ZipEntrySpec::Dir("top/"),
            ZipEntrySpec::File("top/first.txt", b"first"),
            ZipEntrySpec::File("top/second.txt", b"second"),
        ])
        .unwrap();
        assert_eq!(extract_single_file(&data).unwrap(), b"first");
    }

    #[test]
    fn test_single_file_empty_archive() {
        let data = build_zip(&[]).unwrap();
        let err = extract_single_file(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoFileEntry);
        assert_eq!(
            err.message(),
            "The zip file \"<data>\" does not contain any file."
        );
    }

    #[test]
    fn test_zip_files_keeps_existing_map_entries() {
        let data = build_zip(&[ZipEntrySpec::File("new.txt", b"new")]).unwrap();
        let mut extracted = ExtractedFiles::default();
        extracted
            .files
            .insert("old.txt".to_string(), b"old".to_vec());
        extracted.top_dir = Some("stale/".to_string());

        extract_zip_files_into(&data, &mut extracted).unwrap();

        assert_eq!(extracted.files.len(), 2);
        assert_eq!(extracted.files["new.txt"], b"new");
        assert_eq!(extracted.top_dir, None);
    }

    /// A stored `a.txt` holding "hello" whose central record claims, through
    /// a zip64 extra field, an uncompressed size of 2^63 + 5 bytes
    fn oversized_zip64_archive() -> Vec<u8> {
        const CRC_HELLO: u32 = 0x3610_a686;
        const DOS_DATE: u16 = (40 << 9) | (1 << 5) | 1;
        let name = b"a.txt";
        let mut out = Vec::new();

        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&DOS_DATE.to_le_bytes());
        out.extend_from_slice(&CRC_HELLO.to_le_bytes());
        out.extend_from_slice(&5u32.to_le_bytes());
        out.extend_from_slice(&5u32.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(b"hello");

        let central_offset = out.len() as u32;
        out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&DOS_DATE.to_le_bytes());
        out.extend_from_slice(&CRC_HELLO.to_le_bytes());
        out.extend_from_slice(&5u32.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&12u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(&0x0001u16.to_le_bytes());
        out.extend_from_slice(&8u16.to_le_bytes());
        out.extend_from_slice(&((1u64 << 63) + 5).to_le_bytes());
        let central_size = out.len() as u32 - central_offset;

        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&central_size.to_le_bytes());
        out.extend_from_slice(&central_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    #[test]
    fn test_oversized_declared_size_is_an_error() {
        let data = oversized_zip64_archive();

        let err = extract_single_file(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileExtraction);

        let err = extract_zip_files(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileExtraction);
    }

    /// A stored archive with one content byte flipped after writing
    fn corrupted_stored_archive() -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        zip.start_file("a.txt", options).unwrap();
        zip.write_all(b"hello world").unwrap();
        let mut data = zip.finish().unwrap().into_inner();

        let pos = data
            .windows(11)
            .position(|w| w == b"hello world")
            .unwrap();
        data[pos] = b'J';
        data
    }

    #[test]
    fn test_checksum_mismatch_fails_extraction_to_disk() {
        let temp_dir = TempDir::new().unwrap();
        let zip_path = temp_dir.path().join("corrupt.zip");
        fs::write(&zip_path, corrupted_stored_archive()).unwrap();

        let mut extraction = Extraction::default();
        let err = extract_zip_file_into(
            &zip_path,
            temp_dir.path().join("out"),
            &ArchiverConfig::default(),
            &mut extraction,
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::FileExtraction);
        assert!(extraction.files.is_empty());
    }

    #[test]
    fn test_checksum_mismatch_fails_in_memory() {
        let data = corrupted_stored_archive();
        assert_eq!(
            extract_single_file(&data).unwrap_err().kind(),
            ErrorKind::FileExtraction
        );
        assert_eq!(
            extract_zip_files(&data).unwrap_err().kind(),
            ErrorKind::FileExtraction
        );
    }

    #[test]
    fn test_zip_files_overwrites_same_named_entries() {
        let data = build_zip(&[ZipEntrySpec::File("shared.txt", b"from zip")]).unwrap();
        let mut extracted = ExtractedFiles::default();
        extracted
            .files
            .insert("shared.txt".to_string(), b"from caller".to_vec());

        extract_zip_files_into(&data, &mut extracted).unwrap();

        assert_eq!(extracted.files.len(), 1);
        assert_eq!(extracted.files["shared.txt"], b"from zip");
    }

    #[test]
    fn test_empty_file_entry() {
        let data = build_zip(&[ZipEntrySpec::File("empty.txt", b"")]).unwrap();
        assert_eq!(extract_single_file(&data).unwrap(), Vec::<u8>::new());
    }
}
