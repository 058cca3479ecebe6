//! Periodic reconciliation
//!
//! The Scheduler drives the [`Reconciler`] on a fixed cadence:
//! - One attempt immediately at startup
//! - One attempt per tick (60 seconds) afterwards, forever
//! - A failed attempt is logged and the loop continues
//!
//! There is no backoff, circuit breaking or failure threshold: the only
//! retry of a failed attempt is the next tick.
//!
//! ## Concurrency
//!
//! Attempts are awaited inline in the loop, never spawned, so at most one
//! reconciliation runs at a time. Ticks missed while an attempt is running are
//! delayed rather than bunched up.

use crate::error::{Result, Step};
use crate::reconciler::{Outcome, Reconciler};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Fixed period between attempts
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Capacity of the attempt event channel
///
/// When full, new events are dropped (with a warning log).
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Events emitted by the Scheduler after every attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptEvent {
    /// Attempt completed
    Succeeded {
        /// Attempt number, starting at 1
        seq: u64,
        /// When the attempt finished
        at: DateTime<Utc>,
        outcome: Outcome,
    },

    /// Attempt failed
    Failed {
        /// Attempt number, starting at 1
        seq: u64,
        /// When the attempt finished
        at: DateTime<Utc>,
        /// Step that failed
        step: Step,
        /// Error message
        error: String,
    },
}

impl AttemptEvent {
    pub fn seq(&self) -> u64 {
        match self {
            AttemptEvent::Succeeded { seq, .. } | AttemptEvent::Failed { seq, .. } => *seq,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AttemptEvent::Succeeded { .. })
    }
}

/// Runs reconciliation attempts on a timer
///
/// ## Lifecycle
///
/// 1. Create with [`Scheduler::new()`]
/// 2. Start with [`Scheduler::run()`] (daemon) or [`Scheduler::run_once()`] (one-shot)
/// 3. Daemon mode runs until the process exits
pub struct Scheduler {
    reconciler: Reconciler,

    /// Period between attempts
    interval: Duration,

    /// Number of attempts started so far
    attempts: AtomicU64,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<AttemptEvent>,
}

impl Scheduler {
    /// Create a scheduler with the fixed 60 second period
    ///
    /// # Returns
    ///
    /// A tuple of (scheduler, event_receiver) where event_receiver yields one
    /// [`AttemptEvent`] per attempt
    pub fn new(reconciler: Reconciler) -> (Self, mpsc::Receiver<AttemptEvent>) {
        Self::with_interval(reconciler, DEFAULT_INTERVAL)
    }

    /// Create a scheduler with a custom period
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn with_interval(
        reconciler: Reconciler,
        interval: Duration,
    ) -> (Self, mpsc::Receiver<AttemptEvent>) {
        assert!(!interval.is_zero(), "scheduler interval must be non-zero");
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let scheduler = Self {
            reconciler,
            interval,
            attempts: AtomicU64::new(0),
            event_tx: tx,
        };

        (scheduler, rx)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of attempts started so far
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Run the periodic loop forever
    ///
    /// Only returns if the surrounding task is dropped.
    pub async fn run(&self) {
        self.run_internal(None).await
    }

    /// Run the periodic loop until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// The attempt in progress when the signal arrives is finished first.
    pub async fn run_with_shutdown(&self, shutdown_rx: oneshot::Receiver<()>) {
        self.run_internal(Some(shutdown_rx)).await
    }

    /// Run exactly one attempt and return its result
    pub async fn run_once(&self) -> Result<Outcome> {
        self.attempt().await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) {
        info!(
            "Starting DDNS scheduler for {} (every {:?})",
            self.reconciler.config().hostname(),
            self.interval
        );

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(shutdown);

        // Failures are reported through the log and the event channel only
        let _ = self.attempt().await;

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = self.attempt().await;
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received, scheduler stopped");
                    break;
                }
            }
        }
    }

    /// Perform one logged attempt
    async fn attempt(&self) -> Result<Outcome> {
        let seq = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Running DNS check (attempt {})", seq);

        let result = self.reconciler.reconcile().await;

        let event = match &result {
            Ok(outcome) => {
                info!("DNS check {} finished: {}", seq, outcome);
                AttemptEvent::Succeeded {
                    seq,
                    at: Utc::now(),
                    outcome: outcome.clone(),
                }
            }
            Err(e) => {
                error!("DNS check {} failed at {}: {}", seq, e.step(), e);
                AttemptEvent::Failed {
                    seq,
                    at: Utc::now(),
                    step: e.step(),
                    error: e.to_string(),
                }
            }
        };
        self.emit_event(event);

        result
    }

    fn emit_event(&self, event: AttemptEvent) {
        // A dropped receiver just means nobody is listening
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Attempt event channel full, dropping event");
        }
    }
}
