//! # Feature: Prefixes
//!
//! Global, per-user and per-guild command prefixes, cached in memory.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

pub mod cache;

pub use cache::{strip_prefix, validate_prefix, PrefixCache, PrefixError, MAX_PREFIX_LEN};
