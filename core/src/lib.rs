//! FRPC Panel Core Library
//!
//! This crate provides the core functionality for launching and supervising
//! an frpc-style proxy client: encrypted configuration storage, typed config
//! entries, single-process supervision, and line-oriented log relaying.

pub mod cipher;
pub mod client_config;
pub mod error;
pub mod relay;
pub mod store;
pub mod supervisor;

pub use cipher::{decrypt, decrypt_text, encrypt, BLOCK_SIZE, SHARED_KEY};
pub use client_config::{AuthConfig, ClientConfig, EntryKind, ProxyEntry, VisitorEntry};
pub use error::{Error, Result};
pub use relay::{
    spawn_reader, BoundedBuffer, ConsoleSink, Fanout, FileSink, LogSink, StreamKind,
    DEFAULT_RETENTION,
};
pub use store::{ConfigStore, CLIENT_BINARY, PRIMARY_ARTIFACT};
pub use supervisor::ProcessSupervisor;
