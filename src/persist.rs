//! Writing chosen images into the output tree.

use std::path::{Path, PathBuf};

use crate::error::ThemegenError;

/// Final location of an asset under `root`.
pub fn asset_path(root: &Path, subdirectory: &str, filename: &str) -> PathBuf {
    root.join(subdirectory).join(filename)
}

/// Writes `bytes` to `<root>/<subdirectory>/<filename>`, creating the
/// subdirectory as needed. An existing file is replaced.
pub fn save_asset(
    root: &Path,
    subdirectory: &str,
    filename: &str,
    bytes: &[u8],
) -> Result<PathBuf, ThemegenError> {
    let dir = root.join(subdirectory);
    std::fs::create_dir_all(&dir).map_err(|source| ThemegenError::WriteFailure {
        path: dir.clone(),
        source,
    })?;
    let path = dir.join(filename);
    std::fs::write(&path, bytes).map_err(|source| ThemegenError::WriteFailure {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
