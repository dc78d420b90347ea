//! Service discovery: directory scan, config reading, secret lookup

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::SecretValue;
use crate::infrastructure::traits::FileSystem;

/// List the immediate subdirectories of `root`, sorted by name.
pub fn discover_service_dirs(fs: &dyn FileSystem, root: &Path) -> ApplicationResult<Vec<PathBuf>> {
    let dirs = fs
        .subdirectories(root)
        .with_path_context("scan directory", root)?;
    debug!("discover_service_dirs: {} candidates in {}", dirs.len(), root.display());
    Ok(dirs)
}

/// Parse a service config file into a YAML value.
///
/// Empty files parse to `Value::Null`.
pub fn read_service_config(fs: &dyn FileSystem, path: &Path) -> ApplicationResult<Value> {
    let content = fs
        .read_to_string(path)
        .with_path_context("read service config", path)?;
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(&content).map_err(|source| ApplicationError::InvalidConfig {
        path: path.to_path_buf(),
        source,
    })
}

/// Look up `key` in a key-value secrets file.
///
/// Returns `None` if the file does not exist or has no `KEY=` line.
pub fn read_secret(
    fs: &dyn FileSystem,
    path: &Path,
    key: &str,
) -> ApplicationResult<Option<SecretValue>> {
    if !fs.exists(path) {
        debug!("read_secret: {} does not exist", path.display());
        return Ok(None);
    }
    let content = fs
        .read_to_string(path)
        .with_path_context("read secrets file", path)?;
    Ok(SecretValue::find(&content, key))
}
