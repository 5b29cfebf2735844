mod config;
mod moments;
mod page;
mod player_runtime;
mod popups;
mod session;
mod unread;
mod watch_later;

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use flume::Sender;

use crate::actions::AppAction;
use crate::api::{SharedSiteApi, SiteApi};
use crate::player::{PlayerSelectors, RetryBudget};
use crate::state::AppState;
use crate::updates::{AppUpdate, CoreMsg, InternalEvent};
use crate::{PlayerControlSurface, SharedControlSurface};

pub(crate) use config::{load_app_config, site_api_for};

pub struct AppCore {
    pub state: AppState,
    rev: u64,

    update_sender: Sender<AppUpdate>,
    core_sender: Sender<CoreMsg>,
    shared_state: Arc<RwLock<AppState>>,

    config: config::AppConfig,
    runtime: tokio::runtime::Runtime,
    site_api: SharedSiteApi,
    control_surface: SharedControlSurface,
    selectors: PlayerSelectors,
    retry_budget: RetryBudget,

    // Bumped on Start/Teardown; results carrying an older token are dropped.
    session_token: u64,
    // Bumped whenever the feed is reset; stale page/count results are dropped.
    feed_generation: u64,
    poller: session::Poller,
    player_runtime: player_runtime::PlayerRuntime,
    watch_later_in_flight: HashSet<u64>,
}

impl AppCore {
    pub(crate) fn new(
        update_sender: Sender<AppUpdate>,
        core_sender: Sender<CoreMsg>,
        config: config::AppConfig,
        shared_state: Arc<RwLock<AppState>>,
        site_api: SharedSiteApi,
        control_surface: SharedControlSurface,
    ) -> Self {
        let mut state = AppState::empty();
        state.settings = config.initial_settings();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .enable_io()
            .build()
            .expect("tokio runtime");

        let selectors = config.selectors();
        let retry_budget = config.retry_budget();

        let this = Self {
            state,
            rev: 0,
            update_sender,
            core_sender,
            shared_state,
            config,
            runtime,
            site_api,
            control_surface,
            selectors,
            retry_budget,
            session_token: 0,
            feed_generation: 0,
            poller: session::Poller::default(),
            player_runtime: player_runtime::PlayerRuntime::default(),
            watch_later_in_flight: HashSet::new(),
        };

        // Ensure FfiApp.state() has an immediately-available snapshot.
        let snapshot = this.state.clone();
        this.commit_state_snapshot(&snapshot);
        this
    }

    fn next_rev(&mut self) -> u64 {
        self.rev += 1;
        self.state.rev = self.rev;
        self.rev
    }

    fn commit_state_snapshot(&self, snapshot: &AppState) {
        match self.shared_state.write() {
            Ok(mut g) => *g = snapshot.clone(),
            Err(poison) => *poison.into_inner() = snapshot.clone(),
        }
    }

    fn emit_state(&mut self) {
        self.next_rev();
        self.state.total_unread = self.state.unread.total_unread();
        let snapshot = self.state.clone();
        self.commit_state_snapshot(&snapshot);
        let _ = self.update_sender.send(AppUpdate::FullState(snapshot));
    }

    fn site_api(&self) -> Arc<dyn SiteApi> {
        match self.site_api.read() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    fn control_surface(&self) -> Option<Arc<dyn PlayerControlSurface>> {
        match self.control_surface.read() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    fn send_internal(tx: &Sender<CoreMsg>, event: InternalEvent) {
        let _ = tx.send(CoreMsg::Internal(Box::new(event)));
    }

    pub fn handle_message(&mut self, msg: CoreMsg) {
        match msg {
            CoreMsg::Action(ref action) => {
                // Never log `?action` directly: URLs and settings are user content.
                match action {
                    AppAction::Scrolled { .. } | AppAction::PointerOverTopBar { .. } => {
                        tracing::trace!(action = action.tag(), "dispatch")
                    }
                    _ => tracing::info!(action = action.tag(), "dispatch"),
                }
                self.handle_action(action.clone());
            }
            CoreMsg::Internal(internal) => self.handle_internal(*internal),
        }
    }

    fn handle_internal(&mut self, internal: InternalEvent) {
        match internal {
            InternalEvent::UserInfoFetched { token, probe } => {
                if token != self.session_token {
                    return;
                }
                self.on_user_info(probe);
            }
            InternalEvent::PollTick { token } => {
                if token != self.session_token {
                    return;
                }
                self.on_poll_tick();
            }
            InternalEvent::UnreadMessagesFetched { token, counts } => {
                if token != self.session_token {
                    return;
                }
                if let Some(counts) = counts {
                    self.state.unread.message_counts = counts;
                    self.emit_state();
                }
            }
            InternalEvent::UnreadDmsFetched { token, counts } => {
                if token != self.session_token {
                    return;
                }
                if let Some(counts) = counts {
                    self.state.unread.dm_counts = counts;
                    self.emit_state();
                }
            }
            InternalEvent::MomentsPageFetched { generation, page } => {
                self.on_moments_page(generation, page);
            }
            InternalEvent::LiveMomentsPageFetched { generation, items } => {
                self.on_live_moments_page(generation, items);
            }
            InternalEvent::NewMomentsCountFetched { generation, count } => {
                self.on_new_moments_count(generation, count);
            }
            InternalEvent::WatchLaterToggled { aid, added, ok } => {
                self.on_watch_later_toggled(aid, added, ok);
            }
            InternalEvent::PlayerTaskFinished {
                task_id,
                mode,
                outcome,
            } => {
                self.on_player_task_finished(task_id, mode, outcome);
            }
        }
    }

    fn handle_action(&mut self, action: AppAction) {
        match action {
            // Lifecycle
            AppAction::Start => self.start_session(),
            AppAction::Teardown => self.teardown_session(),
            AppAction::WindowFocusChanged { focused } => {
                if focused && self.state.is_logged_in() {
                    self.refresh_unread_counters();
                }
            }

            // Notifications
            AppAction::RefreshUnreadCounters => self.refresh_unread_counters(),
            AppAction::OpenNotificationsItem { url } => self.open_notifications_item(url),
            AppAction::SetNotificationsDrawerVisible { visible } => {
                self.set_notifications_drawer_visible(visible)
            }

            // Moments
            AppAction::SelectMomentsKind { kind } => self.reset_feed(kind),
            AppAction::FetchMomentsPage => self.fetch_feed_page(),
            AppAction::ResetMoments => {
                let kind = self.state.moments.kind;
                self.reset_feed(kind);
            }
            AppAction::RefreshNewMomentsCount => self.refresh_new_item_count(),

            // Popups
            AppAction::SetPopupVisible { popup, visible } => self.set_popup_visible(popup, visible),
            AppAction::ClickTopBarItem { popup } => self.click_top_bar_item(popup),
            AppAction::ClickOutside { popup } => self.click_outside(popup),
            AppAction::CloseAllPopups { except } => self.close_all_popups(except),

            // Scroll
            AppAction::Scrolled { scroll_top } => self.on_scrolled(scroll_top),
            AppAction::PointerOverTopBar { inside } => {
                if self.state.scroll.pointer_inside != inside {
                    self.state.scroll.pointer_inside = inside;
                    self.emit_state();
                }
            }

            // Page
            AppAction::NavigatedTo { url } => self.on_navigated(url),
            AppAction::PageLoaded => self.on_page_loaded(),
            AppAction::PageShown => self.apply_player_mode_for_page(),
            AppAction::VisibilityChanged { visible } => {
                if visible {
                    self.apply_player_mode_for_page();
                }
            }
            AppAction::SetActivatedPage { page } => {
                if self.state.page.activated_page != page {
                    self.state.page.activated_page = page;
                    self.emit_state();
                }
            }
            AppAction::SetReachTop { reach_top } => {
                if self.state.page.reach_top != reach_top {
                    self.state.page.reach_top = reach_top;
                    self.emit_state();
                }
            }

            // Player
            AppAction::ApplyPlayerMode => self.apply_player_mode(),
            AppAction::CancelPlayerMode => self.cancel_player_mode(),

            // Misc
            AppAction::UpdateSettings { settings } => self.update_settings(settings),
            AppAction::ToggleWatchLater { aid } => self.toggle_watch_later(aid),
        }
    }
}
