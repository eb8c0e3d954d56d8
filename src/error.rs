//! Error types for mangaone-dl
//!
//! This module provides the error taxonomy for the extraction and download pipeline:
//! - Network failures (transport errors and non-success statuses)
//! - Extraction failures (missing key or IV in the viewer payload)
//! - Decryption failures (ciphertext inconsistent with block size or padding)
//! - Filesystem failures (output directory or page file I/O)
//!
//! Per-page failures are wrapped in [`Error::Page`] so the message names the page
//! index at which a later run can resume.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mangaone-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mangaone-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "scan.key_pattern")
        key: Option<String>,
    },

    /// Session credentials could not be obtained
    #[error("credentials error: {0}")]
    Credentials(String),

    /// Request could not be sent or the response body could not be read
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote answered with a non-success status
    #[error("request to {url} failed with status {status}")]
    HttpStatus {
        /// The URL that was requested
        url: String,
        /// The HTTP status code returned
        status: u16,
    },

    /// The viewer payload did not yield the expected secrets
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Page bytes could not be decrypted
    #[error("decryption error: {0}")]
    Decryption(#[from] DecryptionError),

    /// Output directory or page file I/O failed
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// The path being created or written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The run was cancelled before it finished
    #[error("operation cancelled")]
    Cancelled,

    /// A single page failed; processing stopped at this index
    #[error("page {index} ({url}) failed: {source}")]
    Page {
        /// 1-based page index that failed
        index: usize,
        /// Locator of the failing page
        url: String,
        /// What went wrong
        #[source]
        source: Box<Error>,
    },
}

/// Extraction failures while scanning the viewer payload
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No 64-hex-character run in the payload
    #[error("could not find the encryption key in the response")]
    KeyNotFound,

    /// No 32-hex-character run left after removing the key
    #[error("could not find the IV in the response")]
    IvNotFound,

    /// A matched secret did not decode to the expected byte length
    #[error("invalid {what} hex: {reason}")]
    InvalidHex {
        /// Which secret ("key" or "iv")
        what: &'static str,
        /// Decoder error or length mismatch
        reason: String,
    },

    /// A scan pattern failed to compile
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The pattern source after placeholder substitution
        pattern: String,
        /// Compiler error
        reason: String,
    },
}

/// Decryption failures for a single page
#[derive(Debug, Error)]
pub enum DecryptionError {
    /// Ciphertext is empty or not a multiple of the AES block size
    #[error("ciphertext length {len} is not a positive multiple of 16")]
    InvalidLength {
        /// Length of the received buffer
        len: usize,
    },

    /// Padding removal failed on the final block
    #[error("invalid PKCS#7 padding")]
    BadPadding,

    /// Key or IV has the wrong length for AES-256
    #[error("invalid key or IV length")]
    InvalidKeyLength,
}

/// Pipeline phase an error belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Configuration, credentials, or output directory preparation
    Setup,
    /// Fetching and scanning the viewer payload
    Extraction,
    /// Per-page fetch, decrypt, and write
    Download,
}

impl Error {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Credentials(_) => "credentials_error",
            Error::Network(_) => "network_error",
            Error::HttpStatus { .. } => "http_status",
            Error::Extraction(e) => match e {
                ExtractionError::KeyNotFound => "key_not_found",
                ExtractionError::IvNotFound => "iv_not_found",
                ExtractionError::InvalidHex { .. } => "invalid_hex",
                ExtractionError::InvalidPattern { .. } => "invalid_pattern",
            },
            Error::Decryption(e) => match e {
                DecryptionError::InvalidLength { .. } => "invalid_ciphertext_length",
                DecryptionError::BadPadding => "bad_padding",
                DecryptionError::InvalidKeyLength => "invalid_key_length",
            },
            Error::Filesystem { .. } => "filesystem_error",
            Error::Serialization(_) => "serialization_error",
            Error::Cancelled => "cancelled",
            Error::Page { source, .. } => source.error_code(),
        }
    }

    /// Which phase of the run produced this error
    ///
    /// Network errors are attributed to extraction unless wrapped in [`Error::Page`].
    pub fn phase(&self) -> Phase {
        match self {
            Error::Page { .. } => Phase::Download,
            Error::Decryption(_) => Phase::Download,
            Error::Extraction(_) | Error::Network(_) | Error::HttpStatus { .. } => {
                Phase::Extraction
            }
            Error::Config { .. }
            | Error::Credentials(_)
            | Error::Filesystem { .. }
            | Error::Serialization(_)
            | Error::Cancelled => Phase::Setup,
        }
    }

    /// Page index to resume from, if the error came from a page
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            Error::Page { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub(crate) fn config(message: impl Into<String>, key: &str) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }
}
