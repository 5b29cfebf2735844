use std::collections::HashMap;

use crate::api::{count_map, ApiEnvelope, ApiError};
use crate::state::DM_BUCKETS;
use crate::updates::InternalEvent;

use super::AppCore;

fn counts_from(
    source: &'static str,
    result: Result<ApiEnvelope<serde_json::Value>, ApiError>,
) -> Option<HashMap<String, u32>> {
    match result
        .and_then(ApiEnvelope::into_data)
        .and_then(|value| count_map(&value))
    {
        Ok(counts) => Some(counts),
        Err(e) => {
            tracing::warn!(source, err = %e, "unread counts fetch failed");
            None
        }
    }
}

fn dm_buckets(mut counts: HashMap<String, u32>) -> HashMap<String, u32> {
    counts.retain(|bucket, _| DM_BUCKETS.contains(&bucket.as_str()));
    counts
}

impl AppCore {
    /// Both sources are fetched concurrently and reported separately, so one
    /// failing leaves the other's result in place.
    pub(super) fn refresh_unread_counters(&mut self) {
        if !self.state.is_logged_in() {
            return;
        }
        let token = self.session_token;
        let api = self.site_api();
        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            let (messages, dms) = tokio::join!(
                api.unread_notification_counts(),
                api.unread_direct_message_counts()
            );
            let counts = counts_from("notifications", messages);
            AppCore::send_internal(&tx, InternalEvent::UnreadMessagesFetched { token, counts });
            let counts = counts_from("direct_messages", dms).map(dm_buckets);
            AppCore::send_internal(&tx, InternalEvent::UnreadDmsFetched { token, counts });
        });
    }
}
