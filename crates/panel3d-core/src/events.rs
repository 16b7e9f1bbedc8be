//! Typed "model loaded" channel between viewers and their extensions.

use crate::viewer::{ContainerId, Viewer, ViewerId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelLoaded {
    pub container: ContainerId,
    pub viewer: ViewerId,
    pub url: String,
    pub clip_count: usize,
}

/// Receives each successful load exactly once, after the model is attached.
pub trait ModelLoadedListener {
    fn on_model_loaded(&mut self, event: &ModelLoaded, viewer: &mut Viewer);
}

#[derive(Default)]
pub struct ModelLoadedBus {
    listeners: Vec<Box<dyn ModelLoadedListener>>,
}

impl ModelLoadedBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn ModelLoadedListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers to every listener in subscription order.
    pub fn publish(&mut self, event: &ModelLoaded, viewer: &mut Viewer) {
        for listener in &mut self.listeners {
            listener.on_model_loaded(event, viewer);
        }
    }
}
