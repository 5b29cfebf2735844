use crate::api::ApiEnvelope;
use crate::state::{MomentItem, MomentKind, MomentsPage, LIVE_PAGE_SIZE};
use crate::updates::InternalEvent;

use super::AppCore;

/// The update endpoint only knows post kinds; the live tab shares the video badge.
fn badge_kind(kind: MomentKind) -> MomentKind {
    if kind.is_live() {
        MomentKind::Video
    } else {
        kind
    }
}

impl AppCore {
    /// Clears the feed for `kind` and immediately loads its first page.
    pub(super) fn reset_feed(&mut self, kind: MomentKind) {
        // Anything still in flight belongs to the old feed.
        self.feed_generation += 1;
        self.state.moments.reset(kind);
        self.state.moments.finish_fetch();
        tracing::debug!(kind = kind.api_type(), generation = self.feed_generation, "moments reset");
        self.emit_state();
        self.fetch_feed_page();
    }

    pub(super) fn fetch_feed_page(&mut self) {
        if !self.state.is_logged_in() {
            return;
        }
        if !self.state.moments.try_begin_page_fetch() {
            tracing::debug!(phase = ?self.state.moments.phase(), "moments fetch skipped");
            return;
        }
        self.emit_state();

        let generation = self.feed_generation;
        let feed = &self.state.moments;
        let kind = feed.kind;
        let api = self.site_api();
        let tx = self.core_sender.clone();

        if kind.is_live() {
            let page = feed.live_page;
            self.runtime.spawn(async move {
                let items = match api
                    .live_moments_page(page, LIVE_PAGE_SIZE)
                    .await
                    .and_then(ApiEnvelope::into_data)
                {
                    Ok(data) => Some(
                        data.list
                            .into_iter()
                            .map(|item| item.into_item())
                            .collect::<Vec<MomentItem>>(),
                    ),
                    Err(e) => {
                        tracing::warn!(page, err = %e, "live moments fetch failed");
                        None
                    }
                };
                AppCore::send_internal(
                    &tx,
                    InternalEvent::LiveMomentsPageFetched { generation, items },
                );
            });
        } else {
            let query = feed.next_query();
            self.runtime.spawn(async move {
                let page = match api
                    .moments_page(query)
                    .await
                    .and_then(ApiEnvelope::into_data)
                {
                    Ok(data) => Some(data.into_page(kind)),
                    Err(e) => {
                        tracing::warn!(kind = kind.api_type(), err = %e, "moments fetch failed");
                        None
                    }
                };
                AppCore::send_internal(&tx, InternalEvent::MomentsPageFetched { generation, page });
            });
        }
    }

    pub(super) fn on_moments_page(&mut self, generation: u64, page: Option<MomentsPage>) {
        if generation != self.feed_generation {
            tracing::debug!(generation, "stale moments page dropped");
            return;
        }
        self.state.moments.finish_fetch();
        if let Some(page) = page {
            let appended = self.state.moments.apply_page(page);
            tracing::debug!(appended, has_more = self.state.moments.has_more, "moments page merged");
        }
        self.emit_state();
    }

    pub(super) fn on_live_moments_page(&mut self, generation: u64, items: Option<Vec<MomentItem>>) {
        if generation != self.feed_generation {
            tracing::debug!(generation, "stale live page dropped");
            return;
        }
        self.state.moments.finish_fetch();
        if let Some(items) = items {
            let appended = self.state.moments.apply_live_page(items);
            tracing::debug!(
                appended,
                next_page = self.state.moments.live_page,
                has_more = self.state.moments.has_more,
                "live page merged"
            );
        }
        self.emit_state();
    }

    /// Badge only: the count is stored, items are left for the next popup open.
    pub(super) fn refresh_new_item_count(&mut self) {
        if !self.state.is_logged_in() {
            return;
        }
        if !self.state.moments.try_begin_count_refresh() {
            tracing::debug!("new moments count skipped; fetch in flight");
            return;
        }
        self.emit_state();

        let generation = self.feed_generation;
        let kind = badge_kind(self.state.moments.kind);
        let baseline = self.state.moments.badge_baseline();
        let api = self.site_api();
        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            let count = match api
                .moments_update(kind, baseline)
                .await
                .and_then(ApiEnvelope::into_data)
            {
                Ok(data) => Some(data.update_num),
                Err(e) => {
                    tracing::warn!(err = %e, "new moments count fetch failed");
                    None
                }
            };
            AppCore::send_internal(&tx, InternalEvent::NewMomentsCountFetched { generation, count });
        });
    }

    pub(super) fn on_new_moments_count(&mut self, generation: u64, count: Option<u32>) {
        if generation != self.feed_generation {
            return;
        }
        self.state.moments.finish_fetch();
        if let Some(count) = count {
            self.state.moments.new_item_count = count;
        }
        self.emit_state();
    }
}
