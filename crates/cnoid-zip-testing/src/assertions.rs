//! Common assertions for cnoid-zip testing

use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Asserts that two directory structures are identical
///
/// Compares relative paths, entry types and file contents.
pub fn assert_dirs_equal(dir1: &Path, dir2: &Path) -> Result<()> {
    let entries1 = collect_entries(dir1)?;
    let entries2 = collect_entries(dir2)?;

    let names1: Vec<_> = entries1.iter().map(|(rel, _)| rel).collect();
    let names2: Vec<_> = entries2.iter().map(|(rel, _)| rel).collect();
    assert_eq!(names1, names2, "Different entries in {:?} and {:?}", dir1, dir2);

    for ((rel, path1), (_, path2)) in entries1.iter().zip(entries2.iter()) {
        let meta1 = std::fs::metadata(path1)?;
        let meta2 = std::fs::metadata(path2)?;

        assert_eq!(
            meta1.is_file(),
            meta2.is_file(),
            "File type mismatch for {:?}",
            rel
        );

        if meta1.is_file() {
            let content1 = std::fs::read(path1)?;
            let content2 = std::fs::read(path2)?;
            assert!(content1 == content2, "Content mismatch for {:?}", rel);
        }
    }

    Ok(())
}

/// Relative paths of all regular files below `dir`, sorted
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(collect_entries(dir)?
        .into_iter()
        .filter(|(_, path)| path.is_file())
        .map(|(rel, _)| rel)
        .collect())
}

fn collect_entries(dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(dir)?.to_path_buf();
        entries.push((rel, entry.path().to_path_buf()));
    }

    entries.sort();
    Ok(entries)
}
