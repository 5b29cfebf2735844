#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use topbar_core::{AppReconciler, AppState, AppUpdate, AuthState, FfiApp};

use super::MockSiteApi;

pub fn wait_until(what: &str, timeout: Duration, f: impl FnMut() -> bool) {
    wait_until_with_poll(what, timeout, Duration::from_millis(20), f);
}

pub fn wait_until_with_poll(
    what: &str,
    timeout: Duration,
    poll: Duration,
    mut f: impl FnMut() -> bool,
) {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if f() {
            return;
        }
        std::thread::sleep(poll);
    }
    panic!("{what}: condition not met within {timeout:?}");
}

/// Writes `topbar_config.json` with networking off plus any extra keys.
pub fn write_config(data_dir: &str, extra: serde_json::Value) {
    let path = std::path::Path::new(data_dir).join("topbar_config.json");
    let mut v = serde_json::json!({
        "disable_network": true,
        "poll_interval_ms": 60_000,
        "player_retry_interval_ms": 10,
    });
    if let (Some(base), Some(extra)) = (v.as_object_mut(), extra.as_object()) {
        for (k, val) in extra {
            base.insert(k.clone(), val.clone());
        }
    }
    std::fs::write(path, serde_json::to_vec(&v).unwrap()).unwrap();
}

pub struct TestApp {
    pub app: Arc<FfiApp>,
    pub api: Arc<MockSiteApi>,
    _dir: TempDir,
}

impl TestApp {
    pub fn new(api: MockSiteApi) -> Self {
        Self::with_config(api, serde_json::json!({}))
    }

    pub fn with_config(api: MockSiteApi, extra: serde_json::Value) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        write_config(&data_dir, extra);
        let app = FfiApp::new(data_dir);
        let api = Arc::new(api);
        app.set_site_api_for_tests(api.clone());
        Self {
            app,
            api,
            _dir: dir,
        }
    }

    pub fn state(&self) -> AppState {
        self.app.state()
    }

    /// Dispatches `Start` and waits for the login probe and the badge refresh
    /// it triggers, so the feed gate is free when the test continues.
    pub fn start_logged_in(&self) {
        self.app.dispatch(topbar_core::AppAction::Start);
        wait_until("logged in", Duration::from_secs(2), || {
            matches!(self.state().auth, AuthState::LoggedIn { .. })
        });
        wait_until("badge refresh settled", Duration::from_secs(2), || {
            !self.api.update_requests().is_empty() && !self.state().moments.is_fetching
        });
    }

    pub fn wait_for(&self, what: &str, mut f: impl FnMut(&AppState) -> bool) -> AppState {
        let mut last = self.state();
        wait_until(what, Duration::from_secs(3), || {
            last = self.state();
            f(&last)
        });
        last
    }
}

#[derive(Clone)]
pub struct Collector(pub Arc<Mutex<Vec<AppUpdate>>>);

impl Collector {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn revs(&self) -> Vec<u64> {
        self.0.lock().unwrap().iter().map(AppUpdate::rev).collect()
    }
}

impl AppReconciler for Collector {
    fn reconcile(&self, update: AppUpdate) {
        self.0.lock().unwrap().push(update);
    }
}
