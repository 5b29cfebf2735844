use crate::state::{PopupKind, PopupState, TopBarSettings};

use super::AppCore;

fn without_others(popups: &PopupState, keep: Option<PopupKind>) -> PopupState {
    let mut next = PopupState {
        clicked: popups.clicked,
        ..PopupState::default()
    };
    if let Some(keep) = keep {
        next.set_visible(keep, popups.is_visible(keep));
    }
    next
}

/// Scroll position -> whether the bar should hide. `None` keeps the current value.
pub(super) fn scroll_visibility(
    scroll_top: f64,
    previous_scroll_top: f64,
    auto_hide: bool,
    pointer_inside: bool,
) -> Option<bool> {
    let mut hidden = None;
    if scroll_top == 0.0 {
        hidden = Some(false);
    }
    if auto_hide && !pointer_inside && scroll_top != 0.0 {
        hidden = Some(scroll_top > previous_scroll_top);
    }
    hidden
}

impl AppCore {
    /// Swaps in a new popup set and runs the open/close side effects.
    fn apply_popups(&mut self, next: PopupState) {
        let prev = std::mem::replace(&mut self.state.popups, next);
        if prev == self.state.popups {
            return;
        }
        self.emit_state();

        let now = &self.state.popups;
        let notifications_closed = prev.notifications && !now.notifications;
        let moments_opened = !prev.moments && now.moments;
        let moments_closed = prev.moments && !now.moments;

        if notifications_closed {
            self.refresh_unread_counters();
        }
        if moments_opened {
            let kind = self.state.moments.kind;
            self.reset_feed(kind);
        }
        if moments_closed {
            self.refresh_new_item_count();
        }
    }

    /// Hover enter/leave. Showing one popup hides the rest.
    pub(super) fn set_popup_visible(&mut self, popup: PopupKind, visible: bool) {
        let mut next = if visible {
            without_others(&self.state.popups, Some(popup))
        } else {
            self.state.popups.clone()
        };
        next.set_visible(popup, visible);
        self.apply_popups(next);
    }

    /// Tap on a top bar item; only meaningful with touch-screen optimisation on.
    pub(super) fn click_top_bar_item(&mut self, popup: PopupKind) {
        if !self.state.settings.touch_screen_optimization {
            return;
        }
        let mut next = without_others(&self.state.popups, Some(popup));
        next.set_visible(popup, !self.state.popups.is_visible(popup));
        next.clicked = Some(popup);
        self.apply_popups(next);
    }

    pub(super) fn click_outside(&mut self, popup: PopupKind) {
        if self.state.popups.clicked != Some(popup) {
            return;
        }
        let mut next = self.state.popups.clone();
        next.set_visible(popup, false);
        self.apply_popups(next);
    }

    pub(super) fn close_all_popups(&mut self, except: Option<PopupKind>) {
        let next = without_others(&self.state.popups, except);
        self.apply_popups(next);
    }

    pub(super) fn open_notifications_item(&mut self, url: String) {
        if !self.state.settings.open_notifications_page_as_drawer {
            return;
        }
        self.state.drawer.notifications_url = url;
        self.state.drawer.notifications_visible = true;
        self.emit_state();
    }

    pub(super) fn set_notifications_drawer_visible(&mut self, visible: bool) {
        if self.state.drawer.notifications_visible == visible {
            return;
        }
        self.state.drawer.notifications_visible = visible;
        self.emit_state();
        if !visible {
            self.refresh_unread_counters();
        }
    }

    pub(super) fn on_scrolled(&mut self, scroll_top: f64) {
        let scroll = &self.state.scroll;
        let hidden = scroll_visibility(
            scroll_top,
            scroll.scroll_top,
            self.state.settings.auto_hide_top_bar,
            scroll.pointer_inside,
        );
        let was_hidden = scroll.hidden;

        self.state.scroll.old_scroll_top = self.state.scroll.scroll_top;
        self.state.scroll.scroll_top = scroll_top;
        if let Some(hidden) = hidden {
            self.state.scroll.hidden = hidden;
        }
        // Positions alone do not warrant a snapshot; visibility changes do.
        if self.state.scroll.hidden != was_hidden {
            self.emit_state();
        }
    }

    pub(super) fn update_settings(&mut self, settings: TopBarSettings) {
        if settings == self.state.settings {
            return;
        }
        if !settings.auto_hide_top_bar {
            self.state.scroll.hidden = false;
        }
        self.state.settings = settings;
        self.emit_state();
    }
}
