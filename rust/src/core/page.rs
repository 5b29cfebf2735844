use crate::page::{hosts_player, is_video_page};

use super::AppCore;

impl AppCore {
    pub(super) fn on_navigated(&mut self, url: String) {
        if self.state.page.url == url {
            return;
        }
        // Tasks still probing belong to the page we just left.
        self.cancel_player_tasks();
        self.state.page.url = url;
        self.emit_state();
        self.apply_player_mode_for_page();
    }

    pub(super) fn on_page_loaded(&mut self) {
        self.apply_player_mode_for_page();
        // Bangumi pages keep their autoplay behaviour.
        if self.state.settings.disable_auto_play_collection && is_video_page(&self.state.page.url)
        {
            self.schedule_auto_play_disable();
        }
    }

    pub(super) fn apply_player_mode_for_page(&mut self) {
        if hosts_player(&self.state.page.url) {
            self.apply_player_mode();
        }
    }
}
