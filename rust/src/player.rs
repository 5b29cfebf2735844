use std::time::Duration;

use serde::Deserialize;

use crate::retry::{sleep_unless_cancelled, CancelFlag, RetryOutcome, RetryTask};
use crate::state::PlayerMode;
use crate::PlayerControlSurface;

const WEB_FULLSCREEN_SCROLL_DELAY: Duration = Duration::from_millis(180);
const WIDESCREEN_SCROLL_DELAY: Duration = Duration::from_millis(800);
pub(crate) const AUTO_PLAY_SWITCH_DELAY: Duration = Duration::from_millis(2000);

fn candidates(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Selector candidates for the host page's player controls. Player markup differs
/// between page versions, so each control lists every known variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlayerSelectors {
    pub play: Vec<String>,
    pub fullscreen: Vec<String>,
    pub web_fullscreen: Vec<String>,
    pub widescreen: Vec<String>,
    pub auto_play_switch_on: Vec<String>,
    pub video: Vec<String>,
    pub player: Vec<String>,
    pub sending_bar: Vec<String>,
    pub full_screen_state: Vec<String>,
    pub web_screen_state: Vec<String>,
    pub wide_screen_state: Vec<String>,
}

impl Default for PlayerSelectors {
    fn default() -> Self {
        Self {
            play: candidates(&[
                ".bpx-player-ctrl-play",
                ".bilibili-player-video-btn-start",
                ".squirtle-video-start",
            ]),
            fullscreen: candidates(&[
                ".bpx-player-ctrl-full",
                ".bilibili-player-video-btn-fullscreen",
                ".squirtle-video-fullscreen",
            ]),
            web_fullscreen: candidates(&[
                ".bpx-player-ctrl-web",
                ".bilibili-player-video-web-fullscreen",
                ".squirtle-video-pagefullscreen",
            ]),
            widescreen: candidates(&[
                ".bpx-player-ctrl-wide",
                ".bilibili-player-video-btn-widescreen",
                ".squirtle-video-widescreen",
            ]),
            auto_play_switch_on: candidates(&[".auto-play .switch-btn.on"]),
            video: candidates(&[
                "#bilibiliPlayer video",
                "#bilibili-player video",
                ".bilibili-player video",
                ".player-container video",
                "#bilibiliPlayer bwp-video",
                "#bilibili-player bwp-video",
                ".bilibili-player bwp-video",
                ".player-container bwp-video",
                "#bofqi video",
            ]),
            player: candidates(&["#bilibili-player", ".bpx-player-container"]),
            sending_bar: candidates(&[".bpx-player-sending-bar"]),
            full_screen_state: candidates(&["[data-screen='full']"]),
            web_screen_state: candidates(&["[data-screen='web']"]),
            wide_screen_state: candidates(&["[data-screen='wide']"]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    pub max_attempts: u32,
    pub interval: Duration,
}

/// Scrolls so the danmaku sending bar sits inside the viewport, or centres the
/// player when the page has no sending bar.
pub fn scroll_player_to_optimal_position(
    surface: &dyn PlayerControlSurface,
    selectors: &PlayerSelectors,
) {
    if !surface.exists(selectors.player.clone()) {
        return;
    }
    match surface.element_bottom(selectors.sending_bar.clone()) {
        Some(bottom) => {
            let overflow = bottom - surface.viewport_height();
            if overflow > 0.0 {
                surface.scroll_by(overflow);
            }
        }
        None => surface.scroll_into_view(selectors.player.clone(), true),
    }
}

/// Drives the player into `mode`, retrying while the controls are not rendered yet.
pub async fn drive_player_mode(
    mode: PlayerMode,
    surface: &dyn PlayerControlSurface,
    selectors: &PlayerSelectors,
    budget: RetryBudget,
    cancel: CancelFlag,
) -> RetryOutcome {
    let task = RetryTask::new(budget.max_attempts, budget.interval, cancel.clone());
    match mode {
        PlayerMode::Default => {
            scroll_player_to_optimal_position(surface, selectors);
            RetryOutcome::Succeeded { attempts: 1 }
        }
        PlayerMode::Fullscreen => {
            task.run(|| {
                surface.exists(selectors.full_screen_state.clone())
                    || surface.click_first(selectors.fullscreen.clone())
            })
            .await
        }
        PlayerMode::WebFullscreen => {
            let mut clicked = false;
            let outcome = task
                .run(|| {
                    if surface.exists(selectors.web_screen_state.clone()) {
                        return true;
                    }
                    if surface.click_first(selectors.web_fullscreen.clone()) {
                        clicked = true;
                        return true;
                    }
                    false
                })
                .await;
            if clicked
                && surface.is_mobile()
                && sleep_unless_cancelled(WEB_FULLSCREEN_SCROLL_DELAY, &cancel).await
            {
                surface.scroll_into_view(selectors.video.clone(), true);
            }
            outcome
        }
        PlayerMode::Widescreen => {
            let mut clicked = false;
            let outcome = task
                .run(|| {
                    if surface.exists(selectors.wide_screen_state.clone()) {
                        scroll_player_to_optimal_position(surface, selectors);
                        return true;
                    }
                    if surface.click_first(selectors.widescreen.clone()) {
                        clicked = true;
                        return true;
                    }
                    false
                })
                .await;
            if clicked && sleep_unless_cancelled(WIDESCREEN_SCROLL_DELAY, &cancel).await {
                scroll_player_to_optimal_position(surface, selectors);
            }
            outcome
        }
    }
}

/// Switches off "autoplay next in collection" once the player had time to render.
pub async fn disable_auto_play_collection(
    surface: &dyn PlayerControlSurface,
    selectors: &PlayerSelectors,
    cancel: CancelFlag,
) -> bool {
    if !sleep_unless_cancelled(AUTO_PLAY_SWITCH_DELAY, &cancel).await {
        return false;
    }
    surface.click_first(selectors.auto_play_switch_on.clone())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct FakeSurface {
        present: Mutex<Vec<String>>,
        clicks: Mutex<Vec<String>>,
        scrolled_by: Mutex<Vec<f64>>,
        centered: Mutex<Vec<String>>,
        sending_bar_bottom: Option<f64>,
        mobile: bool,
    }

    impl FakeSurface {
        fn with_present(selectors: &[&str]) -> Self {
            Self {
                present: Mutex::new(candidates(selectors)),
                ..Default::default()
            }
        }

        fn find(&self, selectors: &[String]) -> Option<String> {
            let present = self.present.lock().unwrap();
            selectors.iter().find(|s| present.contains(s)).cloned()
        }
    }

    impl PlayerControlSurface for FakeSurface {
        fn exists(&self, selectors: Vec<String>) -> bool {
            self.find(&selectors).is_some()
        }

        fn click_first(&self, selectors: Vec<String>) -> bool {
            match self.find(&selectors) {
                Some(hit) => {
                    self.clicks.lock().unwrap().push(hit);
                    true
                }
                None => false,
            }
        }

        fn element_bottom(&self, selectors: Vec<String>) -> Option<f64> {
            self.find(&selectors).and(self.sending_bar_bottom)
        }

        fn viewport_height(&self) -> f64 {
            800.0
        }

        fn scroll_by(&self, dy: f64) {
            self.scrolled_by.lock().unwrap().push(dy);
        }

        fn scroll_into_view(&self, selectors: Vec<String>, _center: bool) {
            self.centered.lock().unwrap().push(selectors.join(","));
        }

        fn is_mobile(&self) -> bool {
            self.mobile
        }
    }

    fn budget(max_attempts: u32) -> RetryBudget {
        RetryBudget {
            max_attempts,
            interval: Duration::from_millis(1),
        }
    }

    #[test]
    fn optimal_scroll_reveals_sending_bar() {
        let surface = FakeSurface {
            sending_bar_bottom: Some(950.0),
            ..FakeSurface::with_present(&[".bpx-player-container", ".bpx-player-sending-bar"])
        };
        scroll_player_to_optimal_position(&surface, &PlayerSelectors::default());
        assert_eq!(*surface.scrolled_by.lock().unwrap(), vec![150.0]);
        assert!(surface.centered.lock().unwrap().is_empty());
    }

    #[test]
    fn optimal_scroll_centres_player_without_sending_bar() {
        let surface = FakeSurface::with_present(&["#bilibili-player"]);
        scroll_player_to_optimal_position(&surface, &PlayerSelectors::default());
        assert_eq!(surface.centered.lock().unwrap().len(), 1);
    }

    #[test]
    fn optimal_scroll_ignores_missing_player() {
        let surface = FakeSurface::default();
        scroll_player_to_optimal_position(&surface, &PlayerSelectors::default());
        assert!(surface.scrolled_by.lock().unwrap().is_empty());
        assert!(surface.centered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fullscreen_clicks_first_known_control() {
        let surface = FakeSurface::with_present(&[".squirtle-video-fullscreen"]);
        let outcome = drive_player_mode(
            PlayerMode::Fullscreen,
            &surface,
            &PlayerSelectors::default(),
            budget(3),
            CancelFlag::new(),
        )
        .await;
        assert_eq!(outcome, RetryOutcome::Succeeded { attempts: 1 });
        assert_eq!(
            *surface.clicks.lock().unwrap(),
            vec![".squirtle-video-fullscreen".to_string()]
        );
    }

    #[tokio::test]
    async fn fullscreen_leaves_an_active_fullscreen_alone() {
        let surface = FakeSurface::with_present(&["[data-screen='full']", ".bpx-player-ctrl-full"]);
        let outcome = drive_player_mode(
            PlayerMode::Fullscreen,
            &surface,
            &PlayerSelectors::default(),
            budget(3),
            CancelFlag::new(),
        )
        .await;
        assert_eq!(outcome, RetryOutcome::Succeeded { attempts: 1 });
        assert!(surface.clicks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fullscreen_gives_up_silently() {
        let surface = FakeSurface::default();
        let outcome = drive_player_mode(
            PlayerMode::Fullscreen,
            &surface,
            &PlayerSelectors::default(),
            budget(4),
            CancelFlag::new(),
        )
        .await;
        assert_eq!(outcome, RetryOutcome::Exhausted { attempts: 4 });
    }

    #[tokio::test]
    async fn web_fullscreen_skips_click_when_already_active() {
        let surface = FakeSurface::with_present(&["[data-screen='web']", ".bpx-player-ctrl-web"]);
        let outcome = drive_player_mode(
            PlayerMode::WebFullscreen,
            &surface,
            &PlayerSelectors::default(),
            budget(3),
            CancelFlag::new(),
        )
        .await;
        assert!(outcome.succeeded());
        assert!(surface.clicks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn web_fullscreen_centres_video_on_mobile() {
        let surface = FakeSurface {
            mobile: true,
            ..FakeSurface::with_present(&[".bpx-player-ctrl-web", "#bilibili-player video"])
        };
        let outcome = drive_player_mode(
            PlayerMode::WebFullscreen,
            &surface,
            &PlayerSelectors::default(),
            budget(3),
            CancelFlag::new(),
        )
        .await;
        assert!(outcome.succeeded());
        assert_eq!(surface.clicks.lock().unwrap().len(), 1);
        assert_eq!(surface.centered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn widescreen_scrolls_even_when_already_wide() {
        let surface = FakeSurface::with_present(&["[data-screen='wide']", "#bilibili-player"]);
        let outcome = drive_player_mode(
            PlayerMode::Widescreen,
            &surface,
            &PlayerSelectors::default(),
            budget(3),
            CancelFlag::new(),
        )
        .await;
        assert!(outcome.succeeded());
        assert!(surface.clicks.lock().unwrap().is_empty());
        assert_eq!(surface.centered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_widescreen_skips_follow_up_scroll() {
        let surface = FakeSurface::with_present(&[".bpx-player-ctrl-wide", "#bilibili-player"]);
        let cancel = CancelFlag::new();
        let selectors = PlayerSelectors::default();
        let drive = drive_player_mode(
            PlayerMode::Widescreen,
            &surface,
            &selectors,
            budget(3),
            cancel.clone(),
        );
        let (outcome, ()) = tokio::join!(drive, async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });
        assert!(outcome.succeeded());
        assert_eq!(surface.clicks.lock().unwrap().len(), 1);
        assert!(surface.centered.lock().unwrap().is_empty());
    }

    #[test]
    fn selector_overrides_keep_other_defaults() {
        let selectors: PlayerSelectors =
            serde_json::from_str(r#"{"fullscreen":[".my-full"]}"#).unwrap();
        assert_eq!(selectors.fullscreen, vec![".my-full".to_string()]);
        assert_eq!(selectors.widescreen, PlayerSelectors::default().widescreen);
    }
}
