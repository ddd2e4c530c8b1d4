//! AI request queue
//!
//! Admission control and bounded concurrency in front of the completion
//! provider. Requests wait in a FIFO channel; a single worker task hands each
//! one to its own task once a semaphore permit is free.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.1.0: Prune submission times once their cooldown is over
//! - 1.0.0: Per-user cooldown, optional queue bound, semaphore-limited worker

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Semaphore};
use uuid::Uuid;

use super::history::ConversationTurn;
use super::provider::CompletionProvider;
use crate::commands::Responder;
use crate::core::{truncate_for_message, Config};

/// Prune submission times once the map grows past this many callers
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Please wait {:.1} more seconds before asking again.", .remaining.as_secs_f64())]
    SlowDown { remaining: Duration },

    #[error("Too many questions are waiting right now, please try again shortly.")]
    QueueFull,

    #[error("I couldn't come up with a reply right now.")]
    Provider,

    #[error("The AI is not available right now.")]
    Closed,
}

impl QueueError {
    /// Text shown to the user who asked
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

pub type AiReply = Result<String, QueueError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    pub cooldown: Duration,
    pub max_concurrent: usize,
    /// 0 means unbounded
    pub max_queue: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(3000),
            max_concurrent: 2,
            max_queue: 0,
        }
    }
}

impl QueueSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cooldown: config.ai_cooldown,
            max_concurrent: config.ai_max_concurrent.max(1),
            max_queue: config.ai_max_queue,
        }
    }
}

struct Job {
    id: Uuid,
    caller_id: String,
    turns: Vec<ConversationTurn>,
    responder: Arc<dyn Responder>,
    result: oneshot::Sender<AiReply>,
}

enum JobSender {
    Bounded(mpsc::Sender<Job>),
    Unbounded(mpsc::UnboundedSender<Job>),
}

enum JobReceiver {
    Bounded(mpsc::Receiver<Job>),
    Unbounded(mpsc::UnboundedReceiver<Job>),
}

impl JobSender {
    fn send(&self, job: Job) -> Result<(), QueueError> {
        match self {
            JobSender::Bounded(tx) => tx.try_send(job).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => QueueError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
            }),
            JobSender::Unbounded(tx) => tx.send(job).map_err(|_| QueueError::Closed),
        }
    }
}

impl JobReceiver {
    async fn recv(&mut self) -> Option<Job> {
        match self {
            JobReceiver::Bounded(rx) => rx.recv().await,
            JobReceiver::Unbounded(rx) => rx.recv().await,
        }
    }
}

struct Inner {
    sender: JobSender,
    last_submission: DashMap<String, Instant>,
    cooldown: Duration,
    in_flight: Arc<AtomicUsize>,
}

/// Handle to the AI request queue; clones share one worker
#[derive(Clone)]
pub struct AiQueue {
    inner: Arc<Inner>,
}

impl AiQueue {
    /// Create the queue and spawn its worker on the current runtime
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: QueueSettings) -> Self {
        let (sender, receiver) = if settings.max_queue == 0 {
            let (tx, rx) = mpsc::unbounded_channel();
            (JobSender::Unbounded(tx), JobReceiver::Unbounded(rx))
        } else {
            let (tx, rx) = mpsc::channel(settings.max_queue);
            (JobSender::Bounded(tx), JobReceiver::Bounded(rx))
        };

        let in_flight = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(settings.max_concurrent.max(1)));

        tokio::spawn(run_worker(
            receiver,
            provider,
            semaphore,
            Arc::clone(&in_flight),
        ));

        info!(
            "AI queue started (concurrency {}, cooldown {}ms, queue {})",
            settings.max_concurrent,
            settings.cooldown.as_millis(),
            if settings.max_queue == 0 {
                "unbounded".to_string()
            } else {
                settings.max_queue.to_string()
            }
        );

        Self {
            inner: Arc::new(Inner {
                sender,
                last_submission: DashMap::new(),
                cooldown: settings.cooldown,
                in_flight,
            }),
        }
    }

    /// Queue a conversation and wait for the completion.
    ///
    /// Rejected immediately with [`QueueError::SlowDown`] when the caller
    /// submitted within the cooldown, or [`QueueError::QueueFull`] when the
    /// queue is bounded and full. A full queue does not count as a submission.
    pub async fn submit(
        &self,
        caller_id: &str,
        turns: Vec<ConversationTurn>,
        responder: Arc<dyn Responder>,
    ) -> AiReply {
        let previous = self.admit(caller_id, Instant::now())?;

        let (result_tx, result_rx) = oneshot::channel();
        let job = Job {
            id: Uuid::new_v4(),
            caller_id: caller_id.to_string(),
            turns,
            responder,
            result: result_tx,
        };
        let job_id = job.id;

        if let Err(err) = self.inner.sender.send(job) {
            warn!("[{job_id}] AI request from {caller_id} rejected: {err:?}");
            self.roll_back(caller_id, previous);
            return Err(err);
        }
        debug!("[{job_id}] AI request from {caller_id} queued");

        result_rx.await.map_err(|_| QueueError::Closed)?
    }

    /// Record a submission, returning the one it replaced
    fn admit(&self, caller_id: &str, now: Instant) -> Result<Option<Instant>, QueueError> {
        if self.inner.last_submission.len() > PRUNE_THRESHOLD {
            self.prune_at(now);
        }

        match self.inner.last_submission.entry(caller_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let elapsed = now.saturating_duration_since(*entry.get());
                if elapsed < self.inner.cooldown {
                    return Err(QueueError::SlowDown {
                        remaining: self.inner.cooldown - elapsed,
                    });
                }
                Ok(Some(entry.insert(now)))
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                Ok(None)
            }
        }
    }

    /// Forget callers whose cooldown is over
    fn prune_at(&self, now: Instant) {
        let cooldown = self.inner.cooldown;
        self.inner
            .last_submission
            .retain(|_, submitted| now.saturating_duration_since(*submitted) < cooldown);
    }

    fn roll_back(&self, caller_id: &str, previous: Option<Instant>) {
        match previous {
            Some(instant) => {
                self.inner
                    .last_submission
                    .insert(caller_id.to_string(), instant);
            }
            None => {
                self.inner.last_submission.remove(caller_id);
            }
        }
    }

    /// Requests currently being answered by the provider
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }
}

async fn run_worker(
    mut receiver: JobReceiver,
    provider: Arc<dyn CompletionProvider>,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
) {
    loop {
        // a permit is taken before receiving so waiting jobs stay in the channel
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let Some(job) = receiver.recv().await else {
            break;
        };

        let provider = Arc::clone(&provider);
        let in_flight = Arc::clone(&in_flight);
        tokio::spawn(async move {
            in_flight.fetch_add(1, Ordering::SeqCst);
            process_job(job, provider.as_ref()).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            drop(permit);
        });
    }
    info!("AI queue worker stopped");
}

async fn process_job(job: Job, provider: &dyn CompletionProvider) {
    let Job {
        id,
        caller_id,
        turns,
        responder,
        result,
    } = job;

    if let Err(e) = responder.typing().await {
        debug!("[{id}] Typing indicator failed: {e}");
    }

    let reply = match provider.complete(&turns).await {
        Ok(text) => {
            info!("[{id}] AI reply for {caller_id}: {} chars", text.chars().count());
            Ok(truncate_for_message(&text))
        }
        Err(e) => {
            error!("[{id}] AI completion for {caller_id} failed: {e:#}");
            Err(QueueError::Provider)
        }
    };

    if result.send(reply).is_err() {
        debug!("[{id}] Requester went away before the reply was ready");
    }
}
