use std::sync::OnceLock;

use regex::Regex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UrlPattern {
    Home,
    SearchPage,
    VideoPage,
    VideoList,
    BangumiPlay,
    ChannelPage,
    Space,
    Account,
    Moments,
    ReadHome,
    ReadPreview,
    CreatorPlatform,
    Message,
}

impl UrlPattern {
    const ALL: [UrlPattern; 13] = [
        UrlPattern::Home,
        UrlPattern::SearchPage,
        UrlPattern::VideoPage,
        UrlPattern::VideoList,
        UrlPattern::BangumiPlay,
        UrlPattern::ChannelPage,
        UrlPattern::Space,
        UrlPattern::Account,
        UrlPattern::Moments,
        UrlPattern::ReadHome,
        UrlPattern::ReadPreview,
        UrlPattern::CreatorPlatform,
        UrlPattern::Message,
    ];

    fn source(&self) -> &'static str {
        match self {
            UrlPattern::Home => r"^https?://(?:www\.)?bilibili\.com/?(?:index\.html)?(?:[?#].*)?$",
            UrlPattern::SearchPage => r"^https?://search\.bilibili\.com/.*$",
            UrlPattern::VideoPage => r"^https?://(?:www\.)?bilibili\.com/video.*",
            UrlPattern::VideoList => r"^https?://(?:www\.)?bilibili\.com/(?:video|list)/.*",
            UrlPattern::BangumiPlay => r"^https?://(?:www\.)?bilibili\.com/bangumi/play/.*",
            UrlPattern::ChannelPage => {
                r"^https?://(?:www\.)?bilibili\.com/(?:c|v|anime|guochuang|tv|movie|variety|mooc).*"
            }
            UrlPattern::Space => r"^https?://space\.bilibili\.com/.*",
            UrlPattern::Account => r"^https?://account\.bilibili\.com/big.*$",
            UrlPattern::Moments => r"^https?://t\.bilibili\.com.*",
            UrlPattern::ReadHome => r"^https?://(?:www\.)?bilibili\.com/read/home.*",
            UrlPattern::ReadPreview => {
                r"^https?://(?:www\.)?bilibili\.com/read/(?:preview|pcpreview).*"
            }
            UrlPattern::CreatorPlatform => r"^https?://member\.bilibili\.com/platform.*",
            UrlPattern::Message => r"^https?://message\.bilibili\.com.*$",
        }
    }

    fn regex(&self) -> &'static Regex {
        static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
        let compiled = COMPILED.get_or_init(|| {
            UrlPattern::ALL
                .iter()
                .map(|p| Regex::new(p.source()).expect("static url pattern"))
                .collect()
        });
        &compiled[*self as usize]
    }

    pub fn matches(&self, url: &str) -> bool {
        self.regex().is_match(url)
    }
}

pub fn is_home_page(url: &str) -> bool {
    UrlPattern::Home.matches(url)
}

fn path_of(url: &str) -> Option<String> {
    reqwest::Url::parse(url).ok().map(|u| u.path().to_string())
}

pub fn is_video_page(url: &str) -> bool {
    path_of(url).is_some_and(|p| p.starts_with("/video/"))
}

pub fn is_bangumi_or_watch_later_page(url: &str) -> bool {
    path_of(url)
        .is_some_and(|p| p.starts_with("/bangumi/play/") || p.starts_with("/list/watchlater"))
}

/// Pages that host a player the default layout should be applied to.
pub fn hosts_player(url: &str) -> bool {
    is_video_page(url) || is_bangumi_or_watch_later_page(url)
}
