use crate::player::{disable_auto_play_collection, drive_player_mode};
use crate::retry::{CancelFlag, RetryOutcome};
use crate::state::{PlayerMode, PlayerState, PlayerTaskStatus};
use crate::updates::InternalEvent;

use super::AppCore;

/// Tracks the player tasks currently acting on the host page. Starting a new
/// mode application cancels the previous one.
#[derive(Debug, Default)]
pub(super) struct PlayerRuntime {
    next_task_id: u64,
    active: Option<(u64, CancelFlag)>,
    auto_play: Option<CancelFlag>,
}

impl PlayerRuntime {
    fn begin(&mut self) -> (u64, CancelFlag) {
        self.cancel_active();
        self.next_task_id += 1;
        let cancel = CancelFlag::new();
        self.active = Some((self.next_task_id, cancel.clone()));
        (self.next_task_id, cancel)
    }

    fn begin_auto_play(&mut self) -> CancelFlag {
        if let Some(prev) = self.auto_play.take() {
            prev.cancel();
        }
        let cancel = CancelFlag::new();
        self.auto_play = Some(cancel.clone());
        cancel
    }

    /// Returns whether a mode task was running.
    fn cancel_active(&mut self) -> bool {
        match self.active.take() {
            Some((_, cancel)) => {
                cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Clears the slot if `task_id` is still current. False means the result is stale.
    fn finish(&mut self, task_id: u64) -> bool {
        match &self.active {
            Some((id, _)) if *id == task_id => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    fn cancel_all(&mut self) -> bool {
        if let Some(cancel) = self.auto_play.take() {
            cancel.cancel();
        }
        self.cancel_active()
    }
}

fn status_for(outcome: RetryOutcome) -> PlayerTaskStatus {
    match outcome {
        RetryOutcome::Succeeded { attempts } => PlayerTaskStatus::Applied { attempts },
        RetryOutcome::Exhausted { attempts } => PlayerTaskStatus::Exhausted { attempts },
        RetryOutcome::Cancelled { .. } => PlayerTaskStatus::Cancelled,
    }
}

impl AppCore {
    /// Drives the host player into the configured default mode.
    pub(super) fn apply_player_mode(&mut self) {
        let Some(surface) = self.control_surface() else {
            tracing::debug!("no player control surface; mode not applied");
            return;
        };
        let mode = self.state.settings.default_player_mode;
        let (task_id, cancel) = self.player_runtime.begin();
        self.state.player = PlayerState {
            mode: Some(mode),
            status: PlayerTaskStatus::Running,
        };
        self.emit_state();

        let selectors = self.selectors.clone();
        let budget = self.retry_budget;
        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            let outcome =
                drive_player_mode(mode, surface.as_ref(), &selectors, budget, cancel).await;
            AppCore::send_internal(
                &tx,
                InternalEvent::PlayerTaskFinished {
                    task_id,
                    mode,
                    outcome,
                },
            );
        });
    }

    pub(super) fn cancel_player_mode(&mut self) {
        if self.player_runtime.cancel_active() {
            self.state.player.status = PlayerTaskStatus::Cancelled;
            self.emit_state();
        }
    }

    /// Stops every pending player task. The caller emits.
    pub(super) fn cancel_player_tasks(&mut self) {
        if self.player_runtime.cancel_all() {
            self.state.player.status = PlayerTaskStatus::Cancelled;
        }
    }

    pub(super) fn schedule_auto_play_disable(&mut self) {
        let Some(surface) = self.control_surface() else {
            return;
        };
        let cancel = self.player_runtime.begin_auto_play();
        let selectors = self.selectors.clone();
        self.runtime.spawn(async move {
            let clicked = disable_auto_play_collection(surface.as_ref(), &selectors, cancel).await;
            tracing::debug!(clicked, "collection autoplay switch");
        });
    }

    pub(super) fn on_player_task_finished(
        &mut self,
        task_id: u64,
        mode: PlayerMode,
        outcome: RetryOutcome,
    ) {
        if !self.player_runtime.finish(task_id) {
            tracing::debug!(task_id, "stale player task result dropped");
            return;
        }
        tracing::info!(
            mode = mode.tag(),
            attempts = outcome.attempts(),
            applied = outcome.succeeded(),
            "player mode task finished"
        );
        self.state.player.status = status_for(outcome);
        self.emit_state();
    }
}
