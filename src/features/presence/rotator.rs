//! Presence rotation
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.0.0: Periodic random status with forced rotation from the `status update` command

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, warn};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::status::{expand_placeholders, PresenceCounts, StatusEntry, StatusKind, DEFAULT_STREAM_URL};
use crate::database::Store;

/// Shown when no statuses are stored
pub const FALLBACK_STATUS: &str = "Ooooh, wee, Rick!";

/// Where activities are applied, and where the counts for placeholders come from
#[async_trait]
pub trait PresenceTarget: Send + Sync {
    async fn set_activity(&self, kind: StatusKind, text: &str, url: Option<&str>);
    fn guild_count(&self) -> usize;
    fn user_count(&self) -> usize;
}

/// The activity that was applied by a rotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStatus {
    pub kind: StatusKind,
    pub text: String,
}

struct Inner {
    store: Arc<dyn Store>,
    target: RwLock<Option<Arc<dyn PresenceTarget>>>,
    command_count: usize,
    rotating: AtomicBool,
}

/// Picks and applies random statuses; cheap to clone
#[derive(Clone)]
pub struct Presence {
    inner: Arc<Inner>,
}

impl Presence {
    pub fn new(store: Arc<dyn Store>, command_count: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                target: RwLock::new(None),
                command_count,
                rotating: AtomicBool::new(false),
            }),
        }
    }

    /// Point rotations at a connected gateway session
    pub async fn attach(&self, target: Arc<dyn PresenceTarget>) {
        *self.inner.target.write().await = Some(target);
    }

    pub async fn is_attached(&self) -> bool {
        self.inner.target.read().await.is_some()
    }

    /// Apply one random stored status now.
    ///
    /// Returns `None` when nothing is attached yet or no statuses are stored;
    /// in the latter case the fallback custom status is applied.
    pub async fn rotate(&self) -> Result<Option<AppliedStatus>> {
        let Some(target) = self.inner.target.read().await.clone() else {
            debug!("Presence rotation skipped, no gateway attached");
            return Ok(None);
        };

        let statuses = self.inner.store.list_statuses().await?;
        let Some(status) = pick(&statuses) else {
            target
                .set_activity(StatusKind::Custom, FALLBACK_STATUS, None)
                .await;
            return Ok(None);
        };

        let counts = PresenceCounts {
            guilds: target.guild_count(),
            users: target.user_count(),
            commands: self.inner.command_count,
        };
        let text = expand_placeholders(&status.text, counts);
        let url = match status.kind {
            StatusKind::Streaming => Some(status.url.as_deref().unwrap_or(DEFAULT_STREAM_URL)),
            _ => None,
        };

        target.set_activity(status.kind, &text, url).await;
        debug!("Presence set to {} {text:?}", status.kind);

        Ok(Some(AppliedStatus {
            kind: status.kind,
            text,
        }))
    }

    /// Start the periodic rotation task; later calls are no-ops
    pub fn spawn_rotation(&self, interval: Duration) {
        if self.inner.rotating.swap(true, Ordering::SeqCst) {
            return;
        }

        let presence = self.clone();
        tokio::spawn(async move {
            info!("Presence rotation every {}s", interval.as_secs());
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = presence.rotate().await {
                    warn!("Presence rotation failed: {e:#}");
                }
            }
        });
    }
}

fn pick(statuses: &[StatusEntry]) -> Option<&StatusEntry> {
    if statuses.is_empty() {
        return None;
    }
    let index = rand::rng().random_range(0..statuses.len());
    statuses.get(index)
}
