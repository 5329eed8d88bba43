pub mod classify;
pub mod info;
pub mod language;
pub mod symbols;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read a file the native library should inspect
pub(crate) fn read_content(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
}
