//! Navigation guard
//!
//! In-app navigation away from a dirty surface asks the user first; the
//! browser-level unload interception is armed only while the draft is
//! dirty.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use super::ports::{LeaveDecision, LeavePrompt, UnloadInterceptor};
use super::session::ProfileSession;

/// Whether a navigation attempt may go ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationVerdict {
    Proceed,
    Cancel,
}

pub struct NavigationGuard {
    session: ProfileSession,
    prompt: Arc<dyn LeavePrompt>,
}

impl NavigationGuard {
    pub fn new(session: ProfileSession, prompt: Arc<dyn LeavePrompt>) -> Self {
        Self { session, prompt }
    }

    /// Decide whether navigating to `destination` may proceed.
    ///
    /// Dirty state is read synchronously at the moment of the attempt. A
    /// clean or detached session proceeds without prompting. Leaving does
    /// not modify the session; the draft is discarded with it on unmount.
    pub async fn before_navigate(&self, destination: &str) -> NavigationVerdict {
        if self.session.is_detached() {
            return NavigationVerdict::Proceed;
        }
        let changed = self.session.changed_fields();
        if changed.is_empty() {
            return NavigationVerdict::Proceed;
        }

        let decision = self.prompt.confirm_leave(&changed).await;
        debug!(destination, ?changed, ?decision, "navigation with unsaved changes");
        match decision {
            LeaveDecision::Leave => NavigationVerdict::Proceed,
            LeaveDecision::Stay => NavigationVerdict::Cancel,
        }
    }

    /// Keep `interceptor` armed exactly while the session is dirty.
    ///
    /// The task ends when the session unmounts, disarming on the way out.
    pub fn track_unload(&self, interceptor: Arc<dyn UnloadInterceptor>) -> JoinHandle<()> {
        let mut dirty_rx = self.session.dirty_watch();
        let cancel = self.session.cancellation_token();

        tokio::spawn(async move {
            let mut armed = false;
            loop {
                let dirty = *dirty_rx.borrow_and_update();
                if dirty != armed {
                    if dirty {
                        interceptor.arm();
                    } else {
                        interceptor.disarm();
                    }
                    armed = dirty;
                }

                tokio::select! {
                    () = cancel.cancelled() => break,
                    changed = dirty_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            if armed {
                interceptor.disarm();
            }
        })
    }
}
