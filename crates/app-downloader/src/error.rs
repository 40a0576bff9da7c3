use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while fetching a pronunciation or a site icon.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Connection, DNS, TLS or timeout failure before a status was received.
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than `200 OK`.
    #[error("{status}: {reason} ({url})")]
    HttpStatus {
        url: String,
        status: u16,
        reason: String,
    },

    /// Expected markup or attribute was not present.
    #[error("failed to parse {url}: {message}")]
    Parse { url: String, message: String },

    #[error("invalid URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image from {url}: {source}")]
    Image {
        url: String,
        #[source]
        source: image::ImageError,
    },
}

impl DownloadError {
    pub(crate) fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_url<U: Into<String>, M: ToString>(url: U, message: M) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// HTTP status of the failed response, if there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_message_carries_code_and_reason() {
        let err = DownloadError::HttpStatus {
            url: "https://example.com/x".to_string(),
            status: 404,
            reason: "Not Found".to_string(),
        };

        assert_eq!(err.to_string(), "404: Not Found (https://example.com/x)");
        assert_eq!(err.status(), Some(404));
    }
}
