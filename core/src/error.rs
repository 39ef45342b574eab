//! Error types for the frpc-panel-core crate

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported key length {0}: key must be 16, 24, or 32 bytes (AES-128/192/256)")]
    KeyLength(usize),

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Encrypted payload too short: {len} bytes (need at least one {block}-byte block)")]
    TruncatedInput { len: usize, block: usize },

    #[error("Decryption failed: {0}")]
    Decrypt(String),

    #[error("Cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Client is already running")]
    AlreadyRunning,

    #[error("Client is not running")]
    NotRunning,

    #[error("Failed to launch client: {0}")]
    Launch(std::io::Error),

    #[error("Failed to terminate client: {0}")]
    Termination(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn decrypt(msg: impl Into<String>) -> Self {
        Error::Decrypt(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// True for the failures that mark an input as "not a valid encrypted
    /// blob" (the adopt classification path treats these as plaintext).
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Error::Decode(_) | Error::TruncatedInput { .. } | Error::Decrypt(_)
        )
    }
}
