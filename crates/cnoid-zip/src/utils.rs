//! Path helpers for mapping between the filesystem and zip entry names

use std::path::{Component, Path, PathBuf};

/// Returns true when the entry name marks a directory
///
/// Zip directory entries are named with a trailing `/`; no other entry
/// type information is consulted.
pub fn is_directory_entry(name: &str) -> bool {
    name.ends_with('/')
}

/// Name of the single top-level folder an archive is packed under:
/// the zip file's name without its extension
pub fn zip_top_dir_name(zip_path: &Path) -> String {
    zip_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Relative path of `path` below `base`, normalized lexically
///
/// Returns None when `path` is not located under `base`.
pub fn relative_path(path: &Path, base: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(base).ok()?;
    let mut normalized = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => normalized.push(name),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(normalized)
}

/// Builds a zip entry name from the top directory and a relative path
///
/// Components are joined with `/` regardless of platform. Directory names
/// get the trailing `/` marker; an empty relative path names the top
/// directory itself.
pub fn zip_entry_name(top_dir: &str, relative: &Path, is_dir: bool) -> String {
    let mut name = String::from(top_dir);
    for component in relative.components() {
        if let Component::Normal(part) = component {
            if !name.is_empty() {
                name.push('/');
            }
            name.push_str(&part.to_string_lossy());
        }
    }
    if is_dir {
        name.push('/');
    }
    name
}

/// UTF-8 rendering of a path for messages and logs
pub fn path_label(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_directory_entry() {
        assert!(is_directory_entry("model/"));
        assert!(is_directory_entry("model/meshes/"));
        assert!(!is_directory_entry("model/body.yaml"));
        assert!(!is_directory_entry(""));
    }

    #[test]
    fn test_zip_top_dir_name() {
        assert_eq!(zip_top_dir_name(Path::new("/tmp/project.zip")), "project");
        assert_eq!(zip_top_dir_name(Path::new("archive.v2.zip")), "archive.v2");
        assert_eq!(zip_top_dir_name(Path::new("noext")), "noext");
    }

    #[test]
    fn test_relative_path() {
        let base = Path::new("/data/src");
        assert_eq!(
            relative_path(Path::new("/data/src/a/b.txt"), base),
            Some(PathBuf::from("a/b.txt"))
        );
        assert_eq!(relative_path(base, base), Some(PathBuf::new()));
        assert_eq!(
            relative_path(Path::new("/data/src/./a/../c"), base),
            Some(PathBuf::from("c"))
        );
        assert_eq!(relative_path(Path::new("/data/other"), base), None);
    }

    #[test]
    fn test_zip_entry_name() {
        assert_eq!(zip_entry_name("proj", Path::new(""), true), "proj/");
        assert_eq!(zip_entry_name("proj", Path::new("a/b"), true), "proj/a/b/");
        assert_eq!(
            zip_entry_name("proj", Path::new("a/file.txt"), false),
            "proj/a/file.txt"
        );
        assert_eq!(zip_entry_name("", Path::new("file.txt"), false), "file.txt");
    }
}
