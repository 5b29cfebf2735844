mod actions;
pub mod api;
mod core;
mod logging;
pub mod page;
pub mod player;
pub mod retry;
mod state;
mod top_bar_projection;
mod updates;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use flume::{Receiver, Sender};

use crate::api::{SharedSiteApi, SiteApi};

pub use actions::AppAction;
pub use state::*;
pub use top_bar_projection::*;
pub use updates::*;

uniffi::setup_scaffolding!();

#[uniffi::export(callback_interface)]
pub trait AppReconciler: Send + Sync + 'static {
    fn reconcile(&self, update: AppUpdate);
}

/// Host-side access to the page that embeds the video player.
///
/// Every lookup takes a list of selector candidates; the host tries them in
/// order and acts on the first match. All calls are made from a tokio worker
/// thread and must not block for long.
#[uniffi::export(callback_interface)]
pub trait PlayerControlSurface: Send + Sync + 'static {
    fn exists(&self, selectors: Vec<String>) -> bool;
    /// Clicks the first matching element. Returns false when none matched.
    fn click_first(&self, selectors: Vec<String>) -> bool;
    /// Bottom edge of the first match, in viewport pixels.
    fn element_bottom(&self, selectors: Vec<String>) -> Option<f64>;
    fn viewport_height(&self) -> f64;
    fn scroll_by(&self, dy: f64);
    fn scroll_into_view(&self, selectors: Vec<String>, center: bool);
    fn is_mobile(&self) -> bool;
}

pub(crate) type SharedControlSurface = Arc<RwLock<Option<Arc<dyn PlayerControlSurface>>>>;

#[uniffi::export]
pub fn top_bar_view(state: AppState) -> TopBarView {
    project_top_bar(&state)
}

#[uniffi::export]
pub fn is_new_moment(state: AppState, index: u32) -> bool {
    state.moments.is_new(index)
}

#[derive(uniffi::Object)]
pub struct FfiApp {
    core_tx: Sender<CoreMsg>,
    update_rx: Receiver<AppUpdate>,
    listening: AtomicBool,
    shared_state: Arc<RwLock<AppState>>,
    site_api: SharedSiteApi,
    control_surface: SharedControlSurface,
}

#[uniffi::export]
impl FfiApp {
    #[uniffi::constructor]
    pub fn new(data_dir: String) -> Arc<Self> {
        logging::init_logging(&data_dir);
        tracing::info!(data_dir = %data_dir, "FfiApp::new() starting");

        let config = crate::core::load_app_config(&data_dir);
        let (update_tx, update_rx) = flume::unbounded();
        let (core_tx, core_rx) = flume::unbounded::<CoreMsg>();
        let shared_state = Arc::new(RwLock::new(AppState::empty()));
        let site_api: SharedSiteApi = Arc::new(RwLock::new(crate::core::site_api_for(&config)));
        let control_surface: SharedControlSurface = Arc::new(RwLock::new(None));

        // Actor loop thread (single threaded "app actor").
        let core_tx_for_core = core_tx.clone();
        let shared_for_core = shared_state.clone();
        let api_for_core = site_api.clone();
        let surface_for_core = control_surface.clone();
        thread::spawn(move || {
            let mut core = crate::core::AppCore::new(
                update_tx,
                core_tx_for_core,
                config,
                shared_for_core,
                api_for_core,
                surface_for_core,
            );
            while let Ok(msg) = core_rx.recv() {
                core.handle_message(msg);
            }
        });

        Arc::new(Self {
            core_tx,
            update_rx,
            listening: AtomicBool::new(false),
            shared_state,
            site_api,
            control_surface,
        })
    }

    pub fn state(&self) -> AppState {
        match self.shared_state.read() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    pub fn dispatch(&self, action: AppAction) {
        // Contract: never block caller.
        let _ = self.core_tx.send(CoreMsg::Action(action));
    }

    pub fn listen_for_updates(&self, reconciler: Box<dyn AppReconciler>) {
        if self
            .listening
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Avoid multiple listeners that would split messages.
            return;
        }

        let rx = self.update_rx.clone();
        thread::spawn(move || {
            while let Ok(update) = rx.recv() {
                reconciler.reconcile(update);
            }
        });
    }

    pub fn set_player_control_surface(&self, surface: Box<dyn PlayerControlSurface>) {
        let surface: Arc<dyn PlayerControlSurface> = Arc::from(surface);
        match self.control_surface.write() {
            Ok(mut slot) => {
                *slot = Some(surface);
            }
            Err(poison) => {
                *poison.into_inner() = Some(surface);
            }
        }
    }
}

impl FfiApp {
    pub fn set_site_api_for_tests(&self, api: Arc<dyn SiteApi>) {
        match self.site_api.write() {
            Ok(mut slot) => {
                *slot = api;
            }
            Err(poison) => {
                *poison.into_inner() = api;
            }
        }
    }

    pub fn set_player_control_surface_for_tests(&self, surface: Arc<dyn PlayerControlSurface>) {
        match self.control_surface.write() {
            Ok(mut slot) => {
                *slot = Some(surface);
            }
            Err(poison) => {
                *poison.into_inner() = Some(surface);
            }
        }
    }
}
