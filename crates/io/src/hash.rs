use std::path::Path;

use crate::error::IoError;

/// BLAKE3 hex digest of a file's bytes.
pub fn hash_file(path: &Path) -> Result<String, IoError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::read(path, e))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
