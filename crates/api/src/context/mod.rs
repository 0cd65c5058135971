//! Profile settings context - dependency injection for one mounted screen

use std::sync::Arc;
use std::time::{Duration, Instant};

use profilesync_core::{
    LeavePrompt, NavigationGuard, NavigationVerdict, ProfileSession, ReconcileOutcome,
    ReconcileTrigger, RemoteProfileStore, SaveAck, UnloadInterceptor,
};
use profilesync_domain::{CompanionCatalog, Config, ProfileSyncError, Result};
use profilesync_infra::{
    init_tracing, AccessTokenProvider, ApiClient, ApiClientConfig, HttpProfileStore,
    ReconciliationScheduler, SchedulerConfig, StaticTokenProvider, TriggerHandle,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::utils::logging::log_operation;

const SCHEDULER_START_TIMEOUT: Duration = Duration::from_secs(10);
const UNLOAD_TASK_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything one mounted profile settings screen needs.
///
/// Built by [`ProfileSettingsContext::mount`]; torn down by
/// [`ProfileSettingsContext::unmount`] or, as a fallback, on drop.
pub struct ProfileSettingsContext {
    pub config: Config,
    session: ProfileSession,
    navigation: NavigationGuard,
    scheduler: Mutex<Option<ReconciliationScheduler>>,
    triggers: Option<TriggerHandle>,
    unload_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for ProfileSettingsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileSettingsContext")
            .field("session", &self.session)
            .field("reconciliation_enabled", &self.triggers.is_some())
            .finish_non_exhaustive()
    }
}

impl ProfileSettingsContext {
    /// Mount the screen against the HTTP profile API described by `config`.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Config` for invalid configuration or an
    /// HTTP client that cannot be built, and `ProfileSyncError::Internal` if
    /// the reconciliation scheduler fails to start. A failed initial load is
    /// not an error; see [`ProfileSession::mount`].
    pub async fn mount(
        config: Config,
        user_id: impl Into<String>,
        prompt: Arc<dyn LeavePrompt>,
    ) -> Result<Self> {
        config.validate()?;
        let store = build_http_store(&config)?;
        Self::mount_with_store(config, user_id, store, prompt).await
    }

    /// Startup entry point: load configuration from the environment (or a
    /// config file), install the tracing subscriber unless the host already
    /// has one, then [`Self::mount`].
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Config` if no valid configuration is found
    /// or the log level is not a valid filter; otherwise as [`Self::mount`].
    pub async fn mount_from_env(
        user_id: impl Into<String>,
        prompt: Arc<dyn LeavePrompt>,
    ) -> Result<Self> {
        let config = profilesync_infra::config::load()?;
        if !init_tracing(&config.logging)? {
            debug!("keeping the existing tracing subscriber");
        }
        Self::mount(config, user_id, prompt).await
    }

    /// Mount the screen against an arbitrary store implementation.
    ///
    /// # Errors
    /// See [`Self::mount`].
    pub async fn mount_with_store(
        config: Config,
        user_id: impl Into<String>,
        store: Arc<dyn RemoteProfileStore>,
        prompt: Arc<dyn LeavePrompt>,
    ) -> Result<Self> {
        config.validate()?;

        let started = Instant::now();
        let catalog = Arc::new(CompanionCatalog::builtin());
        let session = ProfileSession::mount(user_id, store, catalog).await;
        let load_error = session.snapshot().load_error;
        log_operation("profile::mount", started.elapsed(), load_error.as_ref());

        let (scheduler, triggers) = if config.reconciliation.enabled {
            let mut scheduler = ReconciliationScheduler::new(
                session.clone(),
                SchedulerConfig::from(&config.reconciliation),
            );
            let triggers = scheduler.trigger_handle();
            if let Err(err) = start_scheduler(&mut scheduler).await {
                session.unmount();
                return Err(err);
            }
            (Some(scheduler), Some(triggers))
        } else {
            info!(user_id = session.user_id(), "background reconciliation disabled");
            (None, None)
        };

        let navigation = NavigationGuard::new(session.clone(), prompt);

        Ok(Self {
            config,
            session,
            navigation,
            scheduler: Mutex::new(scheduler),
            triggers,
            unload_tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn session(&self) -> &ProfileSession {
        &self.session
    }

    pub fn navigation(&self) -> &NavigationGuard {
        &self.navigation
    }

    /// Handle for visibility and focus events. `None` when background
    /// reconciliation is disabled.
    pub fn triggers(&self) -> Option<&TriggerHandle> {
        self.triggers.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        !self.session.is_detached()
    }

    /// Save the draft and log the outcome.
    ///
    /// # Errors
    /// Propagates the session's save error unchanged.
    pub async fn save(&self) -> Result<SaveAck> {
        let started = Instant::now();
        let result = self.session.save().await;
        log_operation("profile::save", started.elapsed(), result.as_ref().err());
        result
    }

    /// Reconcile right away, outside the scheduler.
    pub async fn refresh(&self) -> ReconcileOutcome {
        self.session.reconcile(ReconcileTrigger::Manual).await
    }

    pub async fn before_navigate(&self, destination: &str) -> NavigationVerdict {
        self.navigation.before_navigate(destination).await
    }

    /// Keep `interceptor` armed exactly while the draft is dirty, until
    /// unmount.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Detached` after unmount.
    pub async fn attach_unload_interceptor(
        &self,
        interceptor: Arc<dyn UnloadInterceptor>,
    ) -> Result<()> {
        if self.session.is_detached() {
            return Err(ProfileSyncError::Detached);
        }
        let handle = self.navigation.track_unload(interceptor);
        self.unload_tasks.lock().await.push(handle);
        Ok(())
    }

    /// Detach the session and wait for background work to wind down.
    ///
    /// Idempotent. Unsaved edits are discarded.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Internal` if a background task panicked.
    pub async fn unmount(&self) -> Result<()> {
        self.session.unmount();

        if let Some(scheduler) = self.scheduler.lock().await.as_mut() {
            if scheduler.is_running().await {
                if let Err(err) = scheduler.stop().await {
                    debug!(error = %err, "scheduler already winding down");
                }
            }
        }

        let tasks: Vec<_> = self.unload_tasks.lock().await.drain(..).collect();
        let mut panicked = false;
        for task in tasks {
            match tokio::time::timeout(UNLOAD_TASK_JOIN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(error = %err, "unload tracking task panicked");
                    panicked = true;
                }
                Err(_) => warn!("unload tracking task did not stop within timeout"),
            }
        }

        info!(
            session_id = %self.session.session_id(),
            component = "ProfileSettingsContext",
            "profile_settings_unmounted"
        );

        if panicked {
            return Err(ProfileSyncError::Internal("unload tracking task panicked".into()));
        }
        Ok(())
    }
}

/// Detaching on drop stops every task spawned for this screen even when
/// [`ProfileSettingsContext::unmount`] was never awaited.
impl Drop for ProfileSettingsContext {
    fn drop(&mut self) {
        self.session.unmount();
    }
}

fn build_http_store(config: &Config) -> Result<Arc<dyn RemoteProfileStore>> {
    let auth: Arc<dyn AccessTokenProvider> =
        Arc::new(StaticTokenProvider::new(config.api.access_token.clone()));
    let client = ApiClient::new(ApiClientConfig::from(&config.api), auth)?;
    Ok(Arc::new(HttpProfileStore::new(Arc::new(client))))
}

async fn start_scheduler(scheduler: &mut ReconciliationScheduler) -> Result<()> {
    tokio::time::timeout(SCHEDULER_START_TIMEOUT, scheduler.start())
        .await
        .map_err(|_| {
            tracing::error!(timeout_secs = 10, "ReconciliationScheduler start timed out");
            ProfileSyncError::Internal("ReconciliationScheduler start timed out after 10s".into())
        })?
        .map_err(|err| {
            tracing::error!(error = %err, "failed to start ReconciliationScheduler");
            err
        })
}
