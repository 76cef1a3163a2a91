//! Shared types, error model, and configuration for docweave.
//!
//! This crate is the foundation depended on by all other docweave crates.
//! It provides:
//! - [`DocweaveError`] — the unified error type
//! - Domain types ([`PageDescriptor`], [`SectionGroups`], [`FetchKind`])
//! - Configuration ([`AppConfig`], [`SiteConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, SiteConfig, SiteProfile, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{DocweaveError, Result};
pub use types::{DEFAULT_LANGUAGE, FetchKind, HOME_SECTION, PageDescriptor, SectionGroups};
