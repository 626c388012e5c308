#![forbid(unsafe_code)]
#![warn(
    unused,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! File-backed configuration for the Harrow scheduler.
//!
//! Layout: `model.rs` (typed sections), `defaults.rs` (fallback values),
//! `validate.rs` (field checks), `loader.rs` (`ConfigLoader` + environment
//! overrides), `error.rs` (`ConfigError`).

mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    AppliedOverride, CONFIG_PATH_ENV, ConfigLoader, EnvLookup, LoadedConfig, parse_document,
};
pub use model::{
    BackoffConfig, DiscoveryConfig, GateConfig, HarrowConfig, LoggingSettings, ReclamationConfig,
    TransferConfig,
};
pub use validate::validate_config;
