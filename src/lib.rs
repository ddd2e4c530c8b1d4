// Core layer - shared types and configuration
pub mod core;

// Features layer - all feature modules
pub mod features;

// Infrastructure
pub mod database;

// Application layer
pub mod commands;

// Discord adapter
pub mod gateway;

#[cfg(test)]
pub mod test_utils;

// Re-export core config for backwards compatibility
pub use core::Config;
