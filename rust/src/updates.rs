use std::collections::HashMap;

use crate::retry::RetryOutcome;
use crate::state::{AppState, MomentItem, MomentsPage, PlayerMode, UserInfo};
use crate::AppAction;

#[derive(uniffi::Enum, Clone, Debug)]
pub enum AppUpdate {
    FullState(AppState),
}

impl AppUpdate {
    pub fn rev(&self) -> u64 {
        match self {
            AppUpdate::FullState(s) => s.rev,
        }
    }
}

#[derive(Debug)]
pub enum CoreMsg {
    Action(AppAction),
    Internal(Box<InternalEvent>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionProbe {
    LoggedIn(UserInfo),
    LoggedOut,
}

#[derive(Debug)]
pub enum InternalEvent {
    // Session. `token` ties a result to the session it was issued under, so
    // anything that lands after a teardown is dropped.
    UserInfoFetched {
        token: u64,
        probe: SessionProbe,
    },
    PollTick {
        token: u64,
    },

    // Unread counters. Each source reports independently; `None` means the
    // fetch failed and the previous map stays.
    UnreadMessagesFetched {
        token: u64,
        counts: Option<HashMap<String, u32>>,
    },
    UnreadDmsFetched {
        token: u64,
        counts: Option<HashMap<String, u32>>,
    },

    // Moments feed. `generation` ties a result to the feed reset it was issued under.
    MomentsPageFetched {
        generation: u64,
        page: Option<MomentsPage>,
    },
    LiveMomentsPageFetched {
        generation: u64,
        items: Option<Vec<MomentItem>>,
    },
    NewMomentsCountFetched {
        generation: u64,
        count: Option<u32>,
    },

    // Watch later
    WatchLaterToggled {
        aid: u64,
        added: bool,
        ok: bool,
    },

    // Player
    PlayerTaskFinished {
        task_id: u64,
        mode: PlayerMode,
        outcome: RetryOutcome,
    },
}
