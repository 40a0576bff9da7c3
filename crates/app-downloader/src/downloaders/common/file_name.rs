use std::{
    fmt,
    fs::{self, OpenOptions},
    io::ErrorKind,
    path::PathBuf,
    sync::Arc,
};

use app_logger::{debug, trace};
use sanitize_filename::sanitize_with_options;

use crate::error::DownloadError;

pub const MAX_FILENAME_LENGTH: usize = 120;
const FALLBACK_STEM: &str = "audio";

/// Host facility handing out collision-free names in its media directory.
pub trait MediaNamer {
    /// Reserves a free path for `base_name` + `extension` (with leading dot).
    fn free_media_name(&self, base_name: &str, extension: &str) -> Result<PathBuf, DownloadError>;
}

/// Where downloaded audio gets written.
#[derive(Clone)]
pub enum OutputTarget {
    /// Fresh files in the OS temp directory.
    TempFiles,
    /// Files named after the word inside a managed media directory.
    Media(Arc<dyn MediaNamer + Send + Sync>),
}

impl fmt::Debug for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TempFiles => f.write_str("TempFiles"),
            Self::Media(_) => f.write_str("Media(..)"),
        }
    }
}

impl OutputTarget {
    #[must_use]
    pub fn media_directory<P: Into<PathBuf>>(dir: P) -> Self {
        Self::Media(Arc::new(MediaDirectory::new(dir)))
    }

    /// Gets a free file name for `base_name`.
    ///
    /// The returned path exists on disk as an empty file.
    pub fn allocate(&self, base_name: &str, extension: &str) -> Result<PathBuf, DownloadError> {
        match self {
            Self::TempFiles => temp_file(extension),
            Self::Media(namer) => namer.free_media_name(base_name, extension),
        }
    }
}

fn temp_file(extension: &str) -> Result<PathBuf, DownloadError> {
    let file = tempfile::Builder::new()
        .prefix("audio-downloader-")
        .suffix(extension)
        .tempfile()
        .map_err(|e| DownloadError::io(std::env::temp_dir(), e))?;

    let (_file, path) = file.keep().map_err(|e| {
        let path = e.file.path().to_path_buf();
        DownloadError::io(path, e.error)
    })?;
    trace!("Allocated temp file {path:?}");

    Ok(path)
}

/// [`MediaNamer`] for a plain directory on disk.
///
/// Names are sanitized and get a ` (n)` suffix when taken.
#[derive(Debug, Clone)]
pub struct MediaDirectory {
    dir: PathBuf,
}

impl MediaDirectory {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

impl MediaNamer for MediaDirectory {
    fn free_media_name(&self, base_name: &str, extension: &str) -> Result<PathBuf, DownloadError> {
        fs::create_dir_all(&self.dir).map_err(|e| DownloadError::io(&self.dir, e))?;

        let stem = clean_stem(base_name, extension);

        for n in 0_u32.. {
            let file_name = if n == 0 {
                format!("{stem}{extension}")
            } else {
                format!("{stem} ({n}){extension}")
            };
            let path = self.dir.join(file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    debug!("Reserved media file {path:?}");
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    trace!("{path:?} is taken");
                }
                Err(e) => return Err(DownloadError::io(path, e)),
            }
        }

        unreachable!("ran out of numeric suffixes")
    }
}

/// Filesystem-safe stem for `base_name`, short enough to leave room for a
/// counter and the extension.
fn clean_stem(base_name: &str, extension: &str) -> String {
    let stem = sanitize_with_options(
        base_name.trim(),
        sanitize_filename::Options {
            truncate: true,
            replacement: "_",
            ..Default::default()
        },
    );

    let budget = MAX_FILENAME_LENGTH.saturating_sub(extension.len() + " (000)".len());
    let stem = truncate_bytes(&stem, budget).trim().trim_start_matches('.');

    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem.to_string()
    }
}

/// Longest prefix of `s` that fits in `max_bytes` without splitting a char.
fn truncate_bytes(s: &str, max_bytes: usize) -> &str {
    let end = s
        .char_indices()
        .find(|(idx, ch)| idx + ch.len_utf8() > max_bytes)
        .map_or(s.len(), |(idx, _)| idx);

    &s[..end]
}
