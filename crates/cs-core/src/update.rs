use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{error, info, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::package::PackageManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Idle,
    Installing,
    Verifying,
    Succeeded,
    RollingBack,
    RolledBack,
    RollbackFailed,
}

/// Phase transitions reported while an update runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateProgress {
    Installing { version: String },
    Installed { version: String },
    Verifying { version: String },
    Verified { version: String },
    StepFailed { state: UpdateState, reason: String },
    RollingBack { version: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Succeeded {
        version: String,
    },
    RolledBack {
        target: String,
        previous: String,
        reason: String,
    },
    RollbackFailed {
        target: String,
        previous: String,
        reason: String,
        rollback_error: String,
        recovery_command: String,
    },
}

impl UpdateOutcome {
    #[must_use]
    pub fn state(&self) -> UpdateState {
        match self {
            Self::Succeeded { .. } => UpdateState::Succeeded,
            Self::RolledBack { .. } => UpdateState::RolledBack,
            Self::RollbackFailed { .. } => UpdateState::RollbackFailed,
        }
    }

    /// Copy-pasteable instructions for the case where the package is left in
    /// an unknown state.
    #[must_use]
    pub fn recovery_instructions(&self) -> Option<String> {
        match self {
            Self::RollbackFailed {
                recovery_command, ..
            } => Some(format!("Manual recovery:\n  {recovery_command}")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct SessionState {
    target_version: String,
    previous_version: String,
    in_progress: bool,
    rollback_target: Option<String>,
    state: UpdateState,
}

/// State of a single update invocation.
///
/// The orchestrator is the only writer. Anything that has to react to an
/// interruption holds a [`SessionHandle`], which can only read.
pub struct UpdateSession {
    shared: Arc<RwLock<SessionState>>,
}

impl UpdateSession {
    pub fn new(target_version: impl Into<String>, previous_version: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(RwLock::new(SessionState {
                target_version: target_version.into(),
                previous_version: previous_version.into(),
                in_progress: false,
                rollback_target: None,
                state: UpdateState::Idle,
            })),
        }
    }

    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    #[must_use]
    pub fn target_version(&self) -> String {
        self.read().target_version.clone()
    }

    #[must_use]
    pub fn previous_version(&self) -> String {
        self.read().previous_version.clone()
    }

    fn begin(&self) {
        let mut state = self.write();
        state.rollback_target = Some(state.previous_version.clone());
        state.in_progress = true;
    }

    fn transition(&self, next: UpdateState) {
        self.write().state = next;
    }

    fn clear(&self) {
        let mut state = self.write();
        state.in_progress = false;
        state.rollback_target = None;
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.shared.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.shared.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<RwLock<SessionState>>,
}

impl SessionHandle {
    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.read().in_progress
    }

    /// The version to reinstall, present only while an update is running.
    #[must_use]
    pub fn rollback_target(&self) -> Option<String> {
        let state = self.read();
        if state.in_progress {
            state.rollback_target.clone()
        } else {
            None
        }
    }

    #[must_use]
    pub fn target_version(&self) -> String {
        self.read().target_version.clone()
    }

    #[must_use]
    pub fn state(&self) -> UpdateState {
        self.read().state
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.shared.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Installs a target version, verifies it, and rolls back on any failure.
pub struct Updater<P> {
    manager: P,
    progress: Option<UnboundedSender<UpdateProgress>>,
}

impl<P: PackageManager> Updater<P> {
    pub fn new(manager: P) -> Self {
        Self {
            manager,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: UnboundedSender<UpdateProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn manager(&self) -> &P {
        &self.manager
    }

    /// Run the update described by `session` to a terminal state.
    ///
    /// Install and verification failures never surface as errors; they are
    /// routed through rollback and the rollback result is returned.
    pub async fn execute(&self, session: &UpdateSession) -> UpdateOutcome {
        let target = session.target_version();
        let previous = session.previous_version();

        session.begin();
        info!("Updating from {previous} to {target}");

        match self.install_and_verify(Some(session), &target).await {
            Ok(()) => {
                session.transition(UpdateState::Succeeded);
                session.clear();
                info!("Update to {target} verified");
                UpdateOutcome::Succeeded { version: target }
            }
            Err(reason) => {
                session.transition(UpdateState::RollingBack);
                let outcome = self.roll_back(&target, &previous, reason).await;
                session.transition(outcome.state());
                session.clear();
                outcome
            }
        }
    }

    /// Roll back an update that was cut short. Returns `None` when no update
    /// was in progress.
    pub async fn recover_interrupted(&self, handle: &SessionHandle) -> Option<UpdateOutcome> {
        let previous = handle.rollback_target()?;
        let target = handle.target_version();
        warn!("Update to {target} interrupted during {:?}", handle.state());

        Some(
            self.roll_back(&target, &previous, "Update interrupted".to_string())
                .await,
        )
    }

    async fn roll_back(&self, target: &str, previous: &str, reason: String) -> UpdateOutcome {
        warn!("Rolling back to {previous}: {reason}");
        self.emit(UpdateProgress::RollingBack {
            version: previous.to_string(),
        });

        match self.install_and_verify(None, previous).await {
            Ok(()) => {
                info!("Rolled back to {previous}");
                UpdateOutcome::RolledBack {
                    target: target.to_string(),
                    previous: previous.to_string(),
                    reason,
                }
            }
            Err(rollback_error) => {
                error!("Rollback to {previous} failed: {rollback_error}");
                UpdateOutcome::RollbackFailed {
                    target: target.to_string(),
                    previous: previous.to_string(),
                    reason,
                    rollback_error,
                    recovery_command: self.manager.install_command(previous),
                }
            }
        }
    }

    async fn install_and_verify(
        &self,
        session: Option<&UpdateSession>,
        version: &str,
    ) -> Result<(), String> {
        if let Some(session) = session {
            session.transition(UpdateState::Installing);
        }
        self.emit(UpdateProgress::Installing {
            version: version.to_string(),
        });

        if let Err(e) = self.manager.install(version).await {
            return Err(self.step_failed(UpdateState::Installing, e.to_string()));
        }
        self.emit(UpdateProgress::Installed {
            version: version.to_string(),
        });

        if let Some(session) = session {
            session.transition(UpdateState::Verifying);
        }
        self.emit(UpdateProgress::Verifying {
            version: version.to_string(),
        });

        match self.manager.installed_version().await {
            Ok(reported) if reported.trim() == version => {
                self.emit(UpdateProgress::Verified {
                    version: version.to_string(),
                });
                Ok(())
            }
            Ok(reported) => Err(self.step_failed(
                UpdateState::Verifying,
                format!(
                    "Version mismatch after installation: expected {version}, found {}",
                    reported.trim()
                ),
            )),
            Err(e) => Err(self.step_failed(UpdateState::Verifying, e.to_string())),
        }
    }

    fn step_failed(&self, state: UpdateState, reason: String) -> String {
        self.emit(UpdateProgress::StepFailed {
            state,
            reason: reason.clone(),
        });
        reason
    }

    fn emit(&self, event: UpdateProgress) {
        if let Some(progress) = &self.progress {
            let _ = progress.send(event);
        }
    }
}
