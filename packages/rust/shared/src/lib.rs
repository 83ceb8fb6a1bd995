//! Shared types, error model, and configuration for PileLog.
//!
//! This crate is the foundation depended on by all other PileLog crates.
//! It provides:
//! - [`PileLogError`]: the unified error type
//! - Domain and wire types ([`PendingRecord`], [`PileDrivingRecord`], [`SubmissionResult`], [`SessionId`])
//! - Configuration ([`AppConfig`], config loading and validation)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BackendConfig, DialogueConfig, Locale, ProjectConfig, TelegramConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_token,
};
pub use error::{PileLogError, Result};
pub use types::{
    DATE_FORMAT, PendingRecord, PileDrivingRecord, SessionId, SubmissionResult, format_date,
    midnight_utc,
};
