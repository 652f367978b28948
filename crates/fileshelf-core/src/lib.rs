//! Core types for fileshelf.
//!
//! This crate provides the configuration and error types shared by the
//! file operations engine and its front ends.

mod config;
mod error;

pub use config::{
    DEFAULT_MAX_HISTORY, DEFAULT_MAX_NUMBERING_ATTEMPTS, DEFAULT_UNDO_CONTENT_LIMIT,
    DEFAULT_UNDO_TOTAL_LIMIT, EngineConfig, EngineConfigBuilder,
};
pub use error::{FileOpError, OperationError};
