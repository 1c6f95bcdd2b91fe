use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("Transfer from {url} was interrupted: {reason}")]
    Interrupted { url: String, reason: String },

    #[error("Response from {url} ended after {actual} bytes, expected {expected}")]
    LengthMismatch {
        url: String,
        expected: u64,
        actual: u64,
    },

    #[error("Unexpected response body from {url}: {source}")]
    Deserialize {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Repository '{0}' is invalid, expected `owner/repo`")]
    InvalidRepository(String),

    #[error("'{0}' is not a plain file name")]
    InvalidFileName(String),

    #[error("API base URL '{0}' cannot be used to build request URLs")]
    InvalidApiUrl(String),

    #[error("Invalid asset pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection failure, non-success status or malformed response.
    Transport,
    /// The response body does not match the expected shape.
    Deserialize,
    /// The destination could not be written.
    Filesystem,
    /// The caller passed something unusable.
    Input,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(_)
            | Error::Status { .. }
            | Error::Interrupted { .. }
            | Error::LengthMismatch { .. } => ErrorKind::Transport,
            Error::Deserialize { .. } => ErrorKind::Deserialize,
            Error::Io { .. } => ErrorKind::Filesystem,
            Error::InvalidRepository(_)
            | Error::InvalidFileName(_)
            | Error::InvalidApiUrl(_)
            | Error::InvalidPattern(_) => ErrorKind::Input,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let status = Error::Status {
            url: "https://example.com".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(status.kind(), ErrorKind::Transport);

        let json = serde_json::from_str::<u32>("nope").unwrap_err();
        let deserialize = Error::Deserialize {
            url: "https://example.com".to_string(),
            source: json,
        };
        assert_eq!(deserialize.kind(), ErrorKind::Deserialize);

        let io = Error::io(
            "/out/a.zip",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert_eq!(io.kind(), ErrorKind::Filesystem);
        assert!(io.to_string().contains("/out/a.zip"));

        assert_eq!(
            Error::InvalidRepository("nope".to_string()).kind(),
            ErrorKind::Input
        );
    }
}
