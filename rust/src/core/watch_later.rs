use crate::api::ApiEnvelope;
use crate::updates::InternalEvent;

use super::AppCore;

impl AppCore {
    /// Adds `aid` to watch later, or removes it when this session already added it.
    pub(super) fn toggle_watch_later(&mut self, aid: u64) {
        if !self.state.is_logged_in() {
            return;
        }
        if !self.watch_later_in_flight.insert(aid) {
            tracing::debug!(aid, "watch later toggle already in flight");
            return;
        }
        let Some(csrf) = self.config.csrf() else {
            tracing::warn!("watch later needs a csrf token; none configured");
            self.watch_later_in_flight.remove(&aid);
            return;
        };

        let add = !self.state.watch_later_added.contains(&aid);
        let api = self.site_api();
        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            let result = if add {
                api.add_to_watch_later(aid, csrf).await
            } else {
                api.remove_from_watch_later(aid, csrf).await
            };
            let ok = match result.and_then(ApiEnvelope::into_status) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(aid, add, err = %e, "watch later toggle failed");
                    false
                }
            };
            AppCore::send_internal(
                &tx,
                InternalEvent::WatchLaterToggled {
                    aid,
                    added: add,
                    ok,
                },
            );
        });
    }

    pub(super) fn on_watch_later_toggled(&mut self, aid: u64, added: bool, ok: bool) {
        self.watch_later_in_flight.remove(&aid);
        if !ok {
            return;
        }
        if added {
            if !self.state.watch_later_added.contains(&aid) {
                self.state.watch_later_added.push(aid);
            }
        } else {
            self.state.watch_later_added.retain(|a| *a != aid);
        }
        self.emit_state();
    }
}
