use std::time::Duration;

use flume::Sender;
use tokio::time::MissedTickBehavior;

use crate::api::{SiteApi, NOT_LOGGED_IN_CODE};
use crate::retry::CancelFlag;
use crate::state::{AuthState, DrawerState, PopupState};
use crate::updates::{CoreMsg, InternalEvent, SessionProbe};

use super::AppCore;

/// Periodic refresh of counters and the moments badge while a session is live.
#[derive(Debug, Default)]
pub(super) struct Poller {
    stop: Option<CancelFlag>,
}

impl Poller {
    pub(super) fn start(
        &mut self,
        runtime: &tokio::runtime::Runtime,
        interval: Duration,
        tx: Sender<CoreMsg>,
        token: u64,
    ) {
        self.stop();
        let stop = CancelFlag::new();
        let stop_for_task = stop.clone();
        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; Start already refreshed.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if stop_for_task.is_cancelled() {
                    break;
                }
                if tx
                    .send(CoreMsg::Internal(Box::new(InternalEvent::PollTick { token })))
                    .is_err()
                {
                    break;
                }
            }
            tracing::debug!(token, "poller stopped");
        });
        self.stop = Some(stop);
    }

    pub(super) fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.cancel();
        }
    }
}

async fn probe_session(api: &dyn SiteApi) -> SessionProbe {
    let envelope = match api.user_info().await {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(err = %e, "user info fetch failed");
            return SessionProbe::LoggedOut;
        }
    };
    if envelope.code == NOT_LOGGED_IN_CODE {
        return SessionProbe::LoggedOut;
    }
    match envelope.into_data() {
        Ok(info) if info.is_login => SessionProbe::LoggedIn(info.into()),
        Ok(_) => SessionProbe::LoggedOut,
        Err(e) => {
            tracing::warn!(err = %e, "user info rejected");
            SessionProbe::LoggedOut
        }
    }
}

impl AppCore {
    pub(super) fn start_session(&mut self) {
        self.session_token += 1;
        let token = self.session_token;

        let api = self.site_api();
        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            let probe = probe_session(api.as_ref()).await;
            AppCore::send_internal(&tx, InternalEvent::UserInfoFetched { token, probe });
        });

        let interval = self.config.poll_interval();
        self.poller
            .start(&self.runtime, interval, self.core_sender.clone(), token);
        tracing::info!(token, interval_ms = interval.as_millis() as u64, "session started");
    }

    pub(super) fn on_user_info(&mut self, probe: SessionProbe) {
        match probe {
            SessionProbe::LoggedIn(user) => {
                tracing::info!(mid = user.mid, "logged in");
                self.state.auth = AuthState::LoggedIn { user };
                self.emit_state();
                self.refresh_unread_counters();
                // A popup opened before login could not load its feed yet.
                if self.state.popups.moments {
                    self.fetch_feed_page();
                } else {
                    self.refresh_new_item_count();
                }
            }
            SessionProbe::LoggedOut => {
                tracing::info!("logged out");
                if self.state.auth != AuthState::LoggedOut {
                    self.state.auth = AuthState::LoggedOut;
                    self.emit_state();
                }
            }
        }
    }

    pub(super) fn on_poll_tick(&mut self) {
        if !self.state.is_logged_in() {
            return;
        }
        self.refresh_unread_counters();
        // The popup drives its own fetches while open.
        if !self.state.popups.moments {
            self.refresh_new_item_count();
        }
    }

    pub(super) fn teardown_session(&mut self) {
        self.poller.stop();
        self.session_token += 1;
        self.feed_generation += 1;
        self.cancel_player_tasks();

        self.state.auth = AuthState::LoggedOut;
        self.state.unread.zero();
        self.state.moments.new_item_count = 0;
        self.state.moments.finish_fetch();
        self.state.popups = PopupState::default();
        self.state.drawer = DrawerState::closed();
        self.emit_state();
        tracing::info!("session torn down");
    }
}
