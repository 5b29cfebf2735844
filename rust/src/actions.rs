use crate::state::{AppPage, MomentKind, PopupKind, TopBarSettings};

#[derive(uniffi::Enum, Debug, Clone)]
pub enum AppAction {
    // Lifecycle
    Start,
    Teardown,
    WindowFocusChanged {
        focused: bool,
    },

    // Notifications
    RefreshUnreadCounters,
    OpenNotificationsItem {
        url: String,
    },
    SetNotificationsDrawerVisible {
        visible: bool,
    },

    // Moments
    SelectMomentsKind {
        kind: MomentKind,
    },
    FetchMomentsPage,
    ResetMoments,
    RefreshNewMomentsCount,

    // Popups
    SetPopupVisible {
        popup: PopupKind,
        visible: bool,
    },
    ClickTopBarItem {
        popup: PopupKind,
    },
    ClickOutside {
        popup: PopupKind,
    },
    CloseAllPopups {
        except: Option<PopupKind>,
    },

    // Scroll
    Scrolled {
        scroll_top: f64,
    },
    PointerOverTopBar {
        inside: bool,
    },

    // Page
    NavigatedTo {
        url: String,
    },
    PageLoaded,
    PageShown,
    VisibilityChanged {
        visible: bool,
    },
    SetActivatedPage {
        page: AppPage,
    },
    SetReachTop {
        reach_top: bool,
    },

    // Player
    ApplyPlayerMode,
    CancelPlayerMode,

    // Misc
    UpdateSettings {
        settings: TopBarSettings,
    },
    ToggleWatchLater {
        aid: u64,
    },
}

impl AppAction {
    /// Log-safe action tag (never includes URLs or user content).
    pub fn tag(&self) -> &'static str {
        match self {
            // Lifecycle
            AppAction::Start => "Start",
            AppAction::Teardown => "Teardown",
            AppAction::WindowFocusChanged { .. } => "WindowFocusChanged",

            // Notifications
            AppAction::RefreshUnreadCounters => "RefreshUnreadCounters",
            AppAction::OpenNotificationsItem { .. } => "OpenNotificationsItem",
            AppAction::SetNotificationsDrawerVisible { .. } => "SetNotificationsDrawerVisible",

            // Moments
            AppAction::SelectMomentsKind { .. } => "SelectMomentsKind",
            AppAction::FetchMomentsPage => "FetchMomentsPage",
            AppAction::ResetMoments => "ResetMoments",
            AppAction::RefreshNewMomentsCount => "RefreshNewMomentsCount",

            // Popups
            AppAction::SetPopupVisible { .. } => "SetPopupVisible",
            AppAction::ClickTopBarItem { .. } => "ClickTopBarItem",
            AppAction::ClickOutside { .. } => "ClickOutside",
            AppAction::CloseAllPopups { .. } => "CloseAllPopups",

            // Scroll
            AppAction::Scrolled { .. } => "Scrolled",
            AppAction::PointerOverTopBar { .. } => "PointerOverTopBar",

            // Page
            AppAction::NavigatedTo { .. } => "NavigatedTo",
            AppAction::PageLoaded => "PageLoaded",
            AppAction::PageShown => "PageShown",
            AppAction::VisibilityChanged { .. } => "VisibilityChanged",
            AppAction::SetActivatedPage { .. } => "SetActivatedPage",
            AppAction::SetReachTop { .. } => "SetReachTop",

            // Player
            AppAction::ApplyPlayerMode => "ApplyPlayerMode",
            AppAction::CancelPlayerMode => "CancelPlayerMode",

            // Misc
            AppAction::UpdateSettings { .. } => "UpdateSettings",
            AppAction::ToggleWatchLater { .. } => "ToggleWatchLater",
        }
    }
}
