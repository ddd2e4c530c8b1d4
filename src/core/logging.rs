//! Logger setup and the runtime debug switch behind `logdebug`
//!
//! env_logger is installed with this crate's records let through at debug
//! level; `log::set_max_level` is what actually decides whether they are
//! written, so verbose logging can be flipped without a restart.

use log::LevelFilter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Level a filter string such as `info` or `daisy=debug,serenity=warn` admits
pub fn base_level(filter: &str) -> LevelFilter {
    env_logger::Builder::new().parse_filters(filter).build().filter()
}

/// Install the global logger and return the level it starts at
pub fn init(default_filter: &str) -> LevelFilter {
    let env = || env_logger::Env::default().default_filter_or(default_filter);
    let base = env_logger::Builder::from_env(env()).build().filter();

    env_logger::Builder::from_env(env())
        .filter_module(env!("CARGO_CRATE_NAME"), base.max(LevelFilter::Debug))
        .init();
    log::set_max_level(base);
    base
}

/// Shared on/off state for verbose logging
#[derive(Clone)]
pub struct DebugSwitch {
    base: LevelFilter,
    enabled: Arc<AtomicBool>,
}

impl DebugSwitch {
    pub fn new(base: LevelFilter) -> Self {
        Self {
            base,
            enabled: Arc::new(AtomicBool::new(base >= LevelFilter::Debug)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Flip verbose logging, returning whether it is now on
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::SeqCst);
        log::set_max_level(self.level(enabled));
        enabled
    }

    fn level(&self, enabled: bool) -> LevelFilter {
        if enabled {
            self.base.max(LevelFilter::Debug)
        } else {
            self.base.min(LevelFilter::Info)
        }
    }
}
