use std::collections::HashMap;

use crate::api::MomentsQuery;

/// Notification categories that only aggregate other categories. They are shown
/// on their own badges but never added to the top bar total.
pub const AGGREGATE_ONLY_CATEGORIES: &[&str] = &["up", "recv_reply", "recv_like"];
/// Direct message buckets shown on the notifications badge.
pub const DM_BUCKETS: &[&str] = &["follow_unread", "unfollow_unread"];

/// The live feed is paged by number with a fixed page size.
pub const LIVE_PAGE_SIZE: u32 = 10;

pub const DEFAULT_NOTIFICATIONS_URL: &str = "https://message.bilibili.com/";

#[derive(uniffi::Record, Clone, Debug)]
pub struct AppState {
    pub rev: u64,
    pub auth: AuthState,
    pub unread: UnreadCounters,
    /// Mirror of `unread.total_unread()`, refreshed on every emit.
    pub total_unread: u32,
    pub moments: MomentsFeedState,
    pub popups: PopupState,
    pub drawer: DrawerState,
    pub scroll: TopBarScrollState,
    pub page: PageState,
    pub settings: TopBarSettings,
    pub player: PlayerState,
    pub watch_later_added: Vec<u64>,
}

impl AppState {
    pub fn empty() -> Self {
        Self {
            rev: 0,
            auth: AuthState::LoggedOut,
            unread: UnreadCounters::default(),
            total_unread: 0,
            moments: MomentsFeedState::new(MomentKind::Video),
            popups: PopupState::default(),
            drawer: DrawerState::closed(),
            scroll: TopBarScrollState::default(),
            page: PageState::default(),
            settings: TopBarSettings::default(),
            player: PlayerState::idle(),
            watch_later_added: vec![],
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.auth, AuthState::LoggedIn { .. })
    }
}

#[derive(uniffi::Enum, Clone, Debug, PartialEq)]
pub enum AuthState {
    LoggedOut,
    LoggedIn { user: UserInfo },
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct UserInfo {
    pub mid: u64,
    pub name: String,
    pub avatar_url: String,
}

#[derive(uniffi::Record, Clone, Debug, Default, PartialEq, Eq)]
pub struct UnreadCounters {
    /// Notification category (`at`, `reply`, `like`, `sys_msg`, ...) -> count.
    pub message_counts: HashMap<String, u32>,
    /// Direct message bucket (`follow_unread`, `unfollow_unread`) -> count.
    pub dm_counts: HashMap<String, u32>,
}

impl UnreadCounters {
    pub fn total_unread(&self) -> u32 {
        let messages: u32 = self
            .message_counts
            .iter()
            .filter(|(category, _)| !AGGREGATE_ONLY_CATEGORIES.contains(&category.as_str()))
            .map(|(_, count)| *count)
            .fold(0, u32::saturating_add);
        let dms: u32 = self.dm_counts.values().copied().fold(0, u32::saturating_add);
        messages.saturating_add(dms)
    }

    pub fn message_count(&self, category: &str) -> u32 {
        self.message_counts.get(category).copied().unwrap_or(0)
    }

    pub fn dm_count(&self, bucket: &str) -> u32 {
        self.dm_counts.get(bucket).copied().unwrap_or(0)
    }

    /// Keeps the known keys but zeroes them, so badges render "0" rather than vanish.
    pub fn zero(&mut self) {
        self.message_counts.values_mut().for_each(|c| *c = 0);
        self.dm_counts.values_mut().for_each(|c| *c = 0);
    }
}

#[derive(
    uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MomentKind {
    Video,
    Article,
    Live,
}

impl MomentKind {
    pub fn api_type(&self) -> &'static str {
        match self {
            MomentKind::Video => "video",
            MomentKind::Article => "article",
            MomentKind::Live => "live",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, MomentKind::Live)
    }
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct MomentItem {
    pub kind: MomentKind,
    pub title: String,
    pub author_name: String,
    pub author_avatar_url: String,
    pub author_link_url: Option<String>,
    pub publish_time: String,
    pub cover_image_url: String,
    pub link_url: String,
    pub resource_id: Option<u64>,
}

/// One cursor-paged response, already mapped to items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MomentsPage {
    pub has_more: bool,
    pub items: Vec<MomentItem>,
    pub update_baseline: String,
    pub offset: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Fetching,
    Exhausted,
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct MomentsFeedState {
    pub kind: MomentKind,
    pub items: Vec<MomentItem>,
    pub update_baseline: String,
    pub offset: String,
    pub live_page: u32,
    pub has_more: bool,
    pub new_item_count: u32,
    pub is_fetching: bool,
}

impl MomentsFeedState {
    pub fn new(kind: MomentKind) -> Self {
        Self {
            kind,
            items: vec![],
            update_baseline: String::new(),
            offset: String::new(),
            live_page: 1,
            has_more: true,
            new_item_count: 0,
            is_fetching: false,
        }
    }

    /// Clears items and cursors for `kind`. The badge count and the in-flight
    /// flag are left to the caller.
    pub fn reset(&mut self, kind: MomentKind) {
        self.kind = kind;
        self.items.clear();
        self.update_baseline.clear();
        self.offset.clear();
        self.live_page = 1;
        self.has_more = true;
    }

    pub fn phase(&self) -> FeedPhase {
        if self.is_fetching {
            FeedPhase::Fetching
        } else if !self.has_more {
            FeedPhase::Exhausted
        } else {
            FeedPhase::Idle
        }
    }

    /// Takes the in-flight gate for a page fetch. False means the call is a no-op.
    pub fn try_begin_page_fetch(&mut self) -> bool {
        if self.is_fetching || !self.has_more {
            return false;
        }
        self.is_fetching = true;
        true
    }

    /// Takes the in-flight gate for a badge refresh. Exhausted feeds still get counts.
    pub fn try_begin_count_refresh(&mut self) -> bool {
        if self.is_fetching {
            return false;
        }
        self.is_fetching = true;
        true
    }

    pub fn finish_fetch(&mut self) {
        self.is_fetching = false;
    }

    /// Merges a cursor-paged response. Returns the number of appended items.
    pub fn apply_page(&mut self, page: MomentsPage) -> usize {
        if !page.has_more {
            self.has_more = false;
            return 0;
        }
        self.update_baseline = page.update_baseline;
        self.offset = page.offset;
        let appended = page.items.len();
        self.items.extend(page.items);
        appended
    }

    /// Merges one page of the live feed. A short page marks the end.
    pub fn apply_live_page(&mut self, items: Vec<MomentItem>) -> usize {
        if (items.len() as u32) < LIVE_PAGE_SIZE {
            self.has_more = false;
        } else {
            self.live_page += 1;
        }
        let appended = items.len();
        self.items.extend(items);
        appended
    }

    pub fn is_new(&self, index: u32) -> bool {
        index < self.new_item_count
    }

    /// Query for the next cursor page. Empty cursors are left out.
    pub fn next_query(&self) -> MomentsQuery {
        MomentsQuery {
            kind: self.kind,
            update_baseline: cursor(&self.update_baseline),
            offset: cursor(&self.offset),
        }
    }

    /// Baseline for the new-item count; "0" before the first page.
    pub fn badge_baseline(&self) -> String {
        cursor(&self.update_baseline).unwrap_or_else(|| "0".to_string())
    }
}

fn cursor(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(
    uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum PopupKind {
    Channels,
    UserPanel,
    Notifications,
    Moments,
    Favorites,
    History,
    WatchLater,
    Upload,
    More,
}

impl PopupKind {
    pub const ALL: [PopupKind; 9] = [
        PopupKind::Channels,
        PopupKind::UserPanel,
        PopupKind::Notifications,
        PopupKind::Moments,
        PopupKind::Favorites,
        PopupKind::History,
        PopupKind::WatchLater,
        PopupKind::Upload,
        PopupKind::More,
    ];
}

#[derive(uniffi::Record, Clone, Debug, Default, PartialEq, Eq)]
pub struct PopupState {
    pub channels: bool,
    pub user_panel: bool,
    pub notifications: bool,
    pub moments: bool,
    pub favorites: bool,
    pub history: bool,
    pub watch_later: bool,
    pub upload: bool,
    pub more: bool,
    /// Last item opened by tap when touch-screen optimisation is on.
    pub clicked: Option<PopupKind>,
}

impl PopupState {
    pub fn is_visible(&self, popup: PopupKind) -> bool {
        match popup {
            PopupKind::Channels => self.channels,
            PopupKind::UserPanel => self.user_panel,
            PopupKind::Notifications => self.notifications,
            PopupKind::Moments => self.moments,
            PopupKind::Favorites => self.favorites,
            PopupKind::History => self.history,
            PopupKind::WatchLater => self.watch_later,
            PopupKind::Upload => self.upload,
            PopupKind::More => self.more,
        }
    }

    pub fn set_visible(&mut self, popup: PopupKind, visible: bool) {
        let slot = match popup {
            PopupKind::Channels => &mut self.channels,
            PopupKind::UserPanel => &mut self.user_panel,
            PopupKind::Notifications => &mut self.notifications,
            PopupKind::Moments => &mut self.moments,
            PopupKind::Favorites => &mut self.favorites,
            PopupKind::History => &mut self.history,
            PopupKind::WatchLater => &mut self.watch_later,
            PopupKind::Upload => &mut self.upload,
            PopupKind::More => &mut self.more,
        };
        *slot = visible;
    }

    pub fn visible_popups(&self) -> Vec<PopupKind> {
        PopupKind::ALL
            .into_iter()
            .filter(|p| self.is_visible(*p))
            .collect()
    }
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct DrawerState {
    pub notifications_visible: bool,
    pub notifications_url: String,
}

impl DrawerState {
    pub fn closed() -> Self {
        Self {
            notifications_visible: false,
            notifications_url: DEFAULT_NOTIFICATIONS_URL.to_string(),
        }
    }
}

#[derive(uniffi::Record, Clone, Debug, Default, PartialEq)]
pub struct TopBarScrollState {
    pub hidden: bool,
    pub scroll_top: f64,
    pub old_scroll_top: f64,
    pub pointer_inside: bool,
}

#[derive(uniffi::Enum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AppPage {
    #[default]
    Home,
    Search,
    Anime,
    History,
    Favorites,
    WatchLater,
    Moments,
}

#[derive(uniffi::Record, Clone, Debug, Default, PartialEq, Eq)]
pub struct PageState {
    pub url: String,
    pub activated_page: AppPage,
    pub reach_top: bool,
}

#[derive(
    uniffi::Enum, Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum PlayerMode {
    #[default]
    Default,
    Fullscreen,
    WebFullscreen,
    Widescreen,
}

impl PlayerMode {
    pub fn tag(&self) -> &'static str {
        match self {
            PlayerMode::Default => "default",
            PlayerMode::Fullscreen => "fullscreen",
            PlayerMode::WebFullscreen => "webFullscreen",
            PlayerMode::Widescreen => "widescreen",
        }
    }
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TopBarSettings {
    pub show_top_bar: bool,
    pub auto_hide_top_bar: bool,
    pub touch_screen_optimization: bool,
    pub open_notifications_page_as_drawer: bool,
    pub use_original_homepage: bool,
    pub use_search_page_mode_on_home_page: bool,
    pub individually_set_search_page_wallpaper: bool,
    pub wallpaper: Option<String>,
    pub search_page_wallpaper: Option<String>,
    pub default_player_mode: PlayerMode,
    pub disable_auto_play_collection: bool,
}

impl Default for TopBarSettings {
    fn default() -> Self {
        Self {
            show_top_bar: true,
            auto_hide_top_bar: false,
            touch_screen_optimization: false,
            open_notifications_page_as_drawer: true,
            use_original_homepage: false,
            use_search_page_mode_on_home_page: false,
            individually_set_search_page_wallpaper: false,
            wallpaper: None,
            search_page_wallpaper: None,
            default_player_mode: PlayerMode::Default,
            disable_auto_play_collection: false,
        }
    }
}

#[derive(uniffi::Enum, Clone, Debug, PartialEq, Eq)]
pub enum PlayerTaskStatus {
    Idle,
    Running,
    Applied { attempts: u32 },
    Exhausted { attempts: u32 },
    Cancelled,
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct PlayerState {
    pub mode: Option<PlayerMode>,
    pub status: PlayerTaskStatus,
}

impl PlayerState {
    pub fn idle() -> Self {
        Self {
            mode: None,
            status: PlayerTaskStatus::Idle,
        }
    }
}
