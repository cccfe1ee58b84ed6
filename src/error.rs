//! Error taxonomy for remote walks and document loading.
//!
//! Only `Config` and `Auth` are meant to stop a run outright. The others are
//! caught per file (or per folder) by the walker and the pipeline, logged with
//! the file's resolved path, and recorded in the returned report.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`LoaderError`], suitable for reports and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RemoteUnavailable,
    UnsupportedFormat,
    Decode,
    LocalIo,
    Parse,
    Auth,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RemoteUnavailable => "remote_unavailable",
            Self::UnsupportedFormat => "unsupported_format",
            Self::Decode => "decode",
            Self::LocalIo => "local_io",
            Self::Parse => "parse",
            Self::Auth => "auth",
            Self::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum LoaderError {
    /// Any failed call to the storage API: transport error or non-2xx status
    #[error("remote storage unavailable ({}): {message}", status_label(.status))]
    RemoteUnavailable { status: Option<u16>, message: String },

    #[error("unsupported document format: {mime_type}")]
    UnsupportedFormat { mime_type: String },

    /// Text could not be decoded even after encoding detection
    #[error("failed to decode text: {message}")]
    Decode { message: String },

    #[error("local I/O error at {}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes were fetched but the document library rejected them
    #[error("failed to parse {format} document: {message}")]
    Parse { format: &'static str, message: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("configuration error: {0}")]
    Config(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {}", code),
        None => "no response".to_string(),
    }
}

impl LoaderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RemoteUnavailable { .. } => ErrorKind::RemoteUnavailable,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::LocalIo { .. } => ErrorKind::LocalIo,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RemoteUnavailable {
            status,
            message: message.into(),
        }
    }

    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.into(),
            source,
        }
    }

    pub fn parse(format: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            format,
            message: message.to_string(),
        }
    }
}

impl From<reqwest::Error> for LoaderError {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteUnavailable {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoaderError>;
