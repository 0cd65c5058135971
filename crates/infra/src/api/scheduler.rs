//! Reconciliation scheduler
//!
//! Drives [`ProfileSession::reconcile`] from three sources: a fixed interval,
//! visibility regained and focus regained. All of them are funneled through
//! one queue so the conflict guard and error policy apply exactly once per
//! run. Requests that pile up while a run is in progress are coalesced.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use profilesync_core::{ProfileSession, ReconcileOutcome, ReconcileTrigger};
use profilesync_domain::{ProfileSyncError, ReconciliationConfig};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

const TRIGGER_QUEUE_DEPTH: usize = 8;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&ReconciliationConfig::default())
    }
}

impl From<&ReconciliationConfig> for SchedulerConfig {
    fn from(config: &ReconciliationConfig) -> Self {
        Self { interval: config.interval() }
    }
}

/// Cloneable handle the presentation layer uses to report visibility and
/// focus events.
#[derive(Clone)]
pub struct TriggerHandle {
    tx: mpsc::Sender<ReconcileTrigger>,
    visible: Arc<AtomicBool>,
}

impl TriggerHandle {
    /// Report a visibility change. Only a hidden-to-visible transition
    /// requests a reconciliation. Returns whether one was queued.
    pub fn notify_visibility(&self, visible: bool) -> bool {
        let was_visible = self.visible.swap(visible, Ordering::SeqCst);
        if visible && !was_visible {
            return self.request(ReconcileTrigger::VisibilityRegained);
        }
        false
    }

    /// Report that the window regained focus.
    pub fn notify_focus(&self) -> bool {
        self.request(ReconcileTrigger::FocusRegained)
    }

    /// Queue a reconciliation. A full queue already guarantees a run, so the
    /// request is dropped.
    pub fn request(&self, trigger: ReconcileTrigger) -> bool {
        match self.tx.try_send(trigger) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(trigger = trigger.as_str(), "reconciliation already queued");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

pub struct ReconciliationScheduler {
    session: ProfileSession,
    config: SchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
    trigger_tx: mpsc::Sender<ReconcileTrigger>,
    trigger_rx: Arc<Mutex<mpsc::Receiver<ReconcileTrigger>>>,
    visible: Arc<AtomicBool>,
}

impl ReconciliationScheduler {
    pub fn new(session: ProfileSession, config: SchedulerConfig) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_QUEUE_DEPTH);
        Self {
            session,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
            trigger_tx,
            trigger_rx: Arc::new(Mutex::new(trigger_rx)),
            visible: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn trigger_handle(&self) -> TriggerHandle {
        TriggerHandle { tx: self.trigger_tx.clone(), visible: Arc::clone(&self.visible) }
    }

    /// Spawn the background loop. It stops on [`Self::stop`] or when the
    /// session unmounts.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Detached` if the session is already
    /// unmounted, or `ProfileSyncError::Internal` if already running.
    #[instrument(skip(self), fields(session_id = %self.session.session_id()))]
    pub async fn start(&mut self) -> Result<(), ProfileSyncError> {
        if self.session.is_detached() {
            return Err(ProfileSyncError::Detached);
        }
        if self.is_running().await {
            return Err(ProfileSyncError::Internal("reconciliation scheduler already running".into()));
        }

        // Child of the session token, so unmount stops the loop.
        self.cancellation_token = self.session.cancellation_token();

        let session = self.session.clone();
        let interval = self.config.interval;
        let cancel = self.cancellation_token.clone();
        let trigger_rx = Arc::clone(&self.trigger_rx);

        let handle = tokio::spawn(async move {
            Self::reconcile_loop(session, interval, cancel, trigger_rx).await;
        });
        *self.task_handle.lock().await = Some(handle);

        info!(interval_secs = interval.as_secs(), "reconciliation scheduler started");
        Ok(())
    }

    /// Cancel the loop and wait for it to finish.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Internal` if not running, or if the task
    /// panicked or did not finish in time.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), ProfileSyncError> {
        if !self.is_running().await {
            return Err(ProfileSyncError::Internal("reconciliation scheduler not running".into()));
        }

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            match tokio::time::timeout(Duration::from_secs(5), handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "reconciliation task panicked");
                    return Err(ProfileSyncError::Internal("reconciliation task panicked".into()));
                }
                Err(_) => {
                    warn!("reconciliation task did not complete within timeout");
                    return Err(ProfileSyncError::Internal("reconciliation task timeout".into()));
                }
            }
        }

        info!("reconciliation scheduler stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.task_handle.lock().await.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    async fn reconcile_loop(
        session: ProfileSession,
        interval: Duration,
        cancel: CancellationToken,
        trigger_rx: Arc<Mutex<mpsc::Receiver<ReconcileTrigger>>>,
    ) {
        let mut triggers = trigger_rx.lock().await;
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let trigger = tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => ReconcileTrigger::Interval,
                received = triggers.recv() => match received {
                    Some(trigger) => trigger,
                    None => break,
                },
            };

            let mut coalesced = 0usize;
            while triggers.try_recv().is_ok() {
                coalesced += 1;
            }
            if coalesced > 0 {
                debug!(coalesced, "coalesced queued reconciliation requests");
            }

            let outcome = tokio::select! {
                () = cancel.cancelled() => break,
                outcome = session.reconcile(trigger) => outcome,
            };
            ticker.reset();

            match &outcome {
                ReconcileOutcome::Applied { changed, suppressed } => {
                    debug!(trigger = trigger.as_str(), ?changed, ?suppressed, "reconciliation applied");
                }
                ReconcileOutcome::Skipped(reason) => {
                    debug!(trigger = trigger.as_str(), ?reason, "reconciliation skipped");
                }
                // Already logged by the session.
                ReconcileOutcome::Failed(_) => {}
            }
        }

        debug!("reconciliation loop exited");
    }
}

/// Ensure the loop is stopped when dropped
impl Drop for ReconciliationScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() {
            self.cancellation_token.cancel();
        }
    }
}
