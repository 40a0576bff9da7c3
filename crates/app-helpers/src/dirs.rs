use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::anyhow;
use app_logger::{debug, trace};
use resolve_path::PathResolveExt;

/// Expands `~` and relative segments in `dir`, creating the directory if it
/// is missing.
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> anyhow::Result<PathBuf> {
    let dir = dir.as_ref();

    if dir.as_os_str().is_empty() {
        return Err(anyhow!("Directory path is empty"));
    }

    let resolved: PathBuf = dir
        .try_resolve()
        .map_err(|e| anyhow!("Failed to resolve {dir:?}: {e:?}"))?
        .into();
    trace!("Resolved {dir:?} to {resolved:?}");

    if !resolved.exists() {
        debug!("Directory {resolved:?} does not exist. Creating...");
        fs::create_dir_all(&resolved)?;
    }

    if !resolved.is_dir() {
        return Err(anyhow!("{resolved:?} exists but is not a directory"));
    }

    Ok(resolved)
}
