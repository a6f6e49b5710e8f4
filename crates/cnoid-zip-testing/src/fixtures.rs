//! Common directory-tree fixtures for cnoid-zip testing

use crate::TestDir;
use anyhow::Result;

/// Bytes covering every octet value, repeated to `len` bytes
pub fn binary_content(len: usize) -> Vec<u8> {
    (0..=255u8).cycle().take(len).collect()
}

/// Creates a project-like tree below `root` (relative to the test directory)
///
/// Layout:
/// ```text
/// root/
///   body.yaml
///   empty/
///   meshes/
///     link.stl      (binary)
///     textures/
///       skin.png    (binary)
///   scripts/
///     run.py
/// ```
pub fn create_test_tree(test_dir: &TestDir, root: &str) -> Result<()> {
    test_dir.create_file(
        &format!("{}/body.yaml", root),
        b"format: ChoreonoidBody\nname: Robot\n",
    )?;
    test_dir.create_dir(&format!("{}/empty", root))?;
    test_dir.create_file(&format!("{}/meshes/link.stl", root), &binary_content(4096))?;
    test_dir.create_file(
        &format!("{}/meshes/textures/skin.png", root),
        &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0xFF],
    )?;
    test_dir.create_file(&format!("{}/scripts/run.py", root), b"print('run')\n")?;
    Ok(())
}

/// Relative paths of the regular files [`create_test_tree`] creates
pub const TEST_TREE_FILES: &[&str] = &[
    "body.yaml",
    "meshes/link.stl",
    "meshes/textures/skin.png",
    "scripts/run.py",
];

/// Creates a tree holding a file larger than the default 1 MiB copy buffer
pub fn create_large_file_tree(test_dir: &TestDir, root: &str) -> Result<()> {
    let large = binary_content(3 * 1024 * 1024 + 17);
    test_dir.create_file(&format!("{}/large.bin", root), &large)?;
    Ok(())
}
