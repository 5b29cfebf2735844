#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use topbar_core::PlayerControlSurface;

/// A host page whose player controls appear after `ready_after` probes.
pub struct MockSurface {
    ready_after: usize,
    probes: AtomicUsize,
    clicks: Mutex<Vec<String>>,
    centred: AtomicUsize,
}

impl MockSurface {
    pub fn ready_after(probes: usize) -> Self {
        Self {
            ready_after: probes,
            probes: AtomicUsize::new(0),
            clicks: Mutex::new(Vec::new()),
            centred: AtomicUsize::new(0),
        }
    }

    pub fn never_ready() -> Self {
        Self::ready_after(usize::MAX)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn centred(&self) -> usize {
        self.centred.load(Ordering::SeqCst)
    }
}

impl PlayerControlSurface for MockSurface {
    fn exists(&self, selectors: Vec<String>) -> bool {
        // Only the player container is ever present; no mode is pre-applied.
        selectors.iter().any(|s| s == "#bilibili-player")
    }

    fn click_first(&self, selectors: Vec<String>) -> bool {
        let n = self.probes.fetch_add(1, Ordering::SeqCst) + 1;
        if n < self.ready_after {
            return false;
        }
        match selectors.first() {
            Some(first) => {
                self.clicks.lock().unwrap().push(first.clone());
                true
            }
            None => false,
        }
    }

    fn element_bottom(&self, _selectors: Vec<String>) -> Option<f64> {
        None
    }

    fn viewport_height(&self) -> f64 {
        800.0
    }

    fn scroll_by(&self, _dy: f64) {}

    fn scroll_into_view(&self, _selectors: Vec<String>, _center: bool) {
        self.centred.fetch_add(1, Ordering::SeqCst);
    }

    fn is_mobile(&self) -> bool {
        false
    }
}
