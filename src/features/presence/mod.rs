//! # Feature: Presence
//!
//! Rotating bot statuses managed with the `status` developer command.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//! - **Toggleable**: false

pub mod rotator;
pub mod status;

pub use rotator::{AppliedStatus, Presence, PresenceTarget, FALLBACK_STATUS};
pub use status::{
    expand_placeholders, NewStatus, PresenceCounts, StatusArgsError, StatusEntry, StatusKind,
    DEFAULT_STREAM_URL,
};
