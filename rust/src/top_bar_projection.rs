use crate::page::{is_home_page, UrlPattern};
use crate::state::{AppPage, AppState, TopBarSettings};

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct TopBarView {
    pub show_top_bar: bool,
    pub hidden_by_scroll: bool,
    pub is_top_bar_fixed: bool,
    pub force_white_icon: bool,
    pub show_search_bar: bool,
    pub is_search_page: bool,
    pub notifications_badge: u32,
    pub moments_badge: u32,
}

/// Projects core state plus the current page into what the top bar renders.
pub fn project_top_bar(state: &AppState) -> TopBarView {
    let url = state.page.url.as_str();
    let settings = &state.settings;
    TopBarView {
        show_top_bar: show_top_bar(url, settings),
        hidden_by_scroll: state.scroll.hidden,
        is_top_bar_fixed: is_top_bar_fixed(url),
        force_white_icon: force_white_icon(url, state.page.activated_page, settings),
        show_search_bar: show_search_bar(
            url,
            state.page.activated_page,
            state.page.reach_top,
            settings,
        ),
        is_search_page: UrlPattern::SearchPage.matches(url),
        notifications_badge: state.unread.total_unread(),
        moments_badge: state.moments.new_item_count,
    }
}

fn show_top_bar(url: &str, settings: &TopBarSettings) -> bool {
    if UrlPattern::CreatorPlatform.matches(url) || UrlPattern::ReadPreview.matches(url) {
        return false;
    }
    settings.show_top_bar
}

fn is_top_bar_fixed(url: &str) -> bool {
    is_home_page(url)
        || [
            UrlPattern::VideoList,
            UrlPattern::BangumiPlay,
            UrlPattern::Moments,
            UrlPattern::ChannelPage,
            UrlPattern::ReadHome,
            UrlPattern::Account,
        ]
        .iter()
        .any(|p| p.matches(url))
}

fn force_white_icon(url: &str, activated: AppPage, settings: &TopBarSettings) -> bool {
    let home = is_home_page(url);
    if (home && settings.use_original_homepage)
        || (UrlPattern::ChannelPage.matches(url) && !UrlPattern::VideoPage.matches(url))
        || UrlPattern::Space.matches(url)
        || UrlPattern::Account.matches(url)
    {
        return true;
    }
    if !home {
        return false;
    }

    let has_wallpaper = settings.wallpaper.as_deref().is_some_and(|w| !w.is_empty());
    let has_search_wallpaper = settings
        .search_page_wallpaper
        .as_deref()
        .is_some_and(|w| !w.is_empty());

    if activated == AppPage::Search {
        if settings.individually_set_search_page_wallpaper {
            return has_search_wallpaper;
        }
        return has_wallpaper;
    }
    if has_wallpaper {
        return true;
    }
    settings.use_search_page_mode_on_home_page
        && settings.individually_set_search_page_wallpaper
        && has_search_wallpaper
}

fn show_search_bar(
    url: &str,
    activated: AppPage,
    reach_top: bool,
    settings: &TopBarSettings,
) -> bool {
    if is_home_page(url) {
        if settings.use_original_homepage {
            return true;
        }
        if activated == AppPage::Search {
            return false;
        }
        if settings.use_search_page_mode_on_home_page && activated == AppPage::Home && reach_top {
            return false;
        }
        return true;
    }
    !UrlPattern::SearchPage.matches(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(url: &str) -> AppState {
        let mut state = AppState::empty();
        state.page.url = url.to_string();
        state
    }

    #[test]
    fn creator_platform_hides_top_bar() {
        let view = project_top_bar(&state_at("https://member.bilibili.com/platform/home"));
        assert!(!view.show_top_bar);
        let view = project_top_bar(&state_at("https://www.bilibili.com/video/BV1"));
        assert!(view.show_top_bar);
        assert!(view.is_top_bar_fixed);
    }

    #[test]
    fn search_page_hides_search_bar() {
        let view = project_top_bar(&state_at("https://search.bilibili.com/all?keyword=a"));
        assert!(view.is_search_page);
        assert!(!view.show_search_bar);
        assert!(!view.is_top_bar_fixed);
    }

    #[test]
    fn search_mode_homepage_hides_search_bar_at_top() {
        let mut state = state_at("https://www.bilibili.com/");
        state.settings.use_search_page_mode_on_home_page = true;
        state.page.reach_top = true;
        assert!(!project_top_bar(&state).show_search_bar);
        state.page.reach_top = false;
        assert!(project_top_bar(&state).show_search_bar);
    }

    #[test]
    fn white_icon_follows_wallpaper_on_homepage() {
        let mut state = state_at("https://www.bilibili.com/");
        assert!(!project_top_bar(&state).force_white_icon);
        state.settings.wallpaper = Some("https://i0.hdslb.com/wall.jpg".to_string());
        assert!(project_top_bar(&state).force_white_icon);

        state.page.activated_page = AppPage::Search;
        state.settings.individually_set_search_page_wallpaper = true;
        assert!(!project_top_bar(&state).force_white_icon);
        state.settings.search_page_wallpaper = Some("https://i0.hdslb.com/s.jpg".to_string());
        assert!(project_top_bar(&state).force_white_icon);
    }

    #[test]
    fn channel_and_space_pages_force_white_icon() {
        assert!(project_top_bar(&state_at("https://www.bilibili.com/v/popular/all")).force_white_icon);
        assert!(project_top_bar(&state_at("https://space.bilibili.com/2")).force_white_icon);
        assert!(!project_top_bar(&state_at("https://www.bilibili.com/video/BV1")).force_white_icon);
    }

    #[test]
    fn badges_mirror_counters() {
        let mut state = state_at("https://www.bilibili.com/");
        state
            .unread
            .message_counts
            .insert("reply".to_string(), 2);
        state.unread.message_counts.insert("up".to_string(), 5);
        state.moments.new_item_count = 7;
        let view = project_top_bar(&state);
        assert_eq!(view.notifications_badge, 2);
        assert_eq!(view.moments_badge, 7);
    }
}
