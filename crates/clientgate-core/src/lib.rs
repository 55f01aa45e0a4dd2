//! # clientgate core
//!
//! Configuration and input validation shared by the clientgate crates.
//!
//! This crate provides:
//! - Configuration loading (JSON5) with environment overrides
//! - Credential input checks applied before the authentication layer runs

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod validation;

pub use config::{AuthConfig, Config, ConfigError, MAX_TOKEN_EXPIRY_MINUTES, StoreConfig};
pub use validation::{ValidationError, check_password, normalize_email};
