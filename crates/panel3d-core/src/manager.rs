//! Single owner of the registry, the model-loaded bus and the scheduler.
//!
//! The browser layer holds one `ViewerManager` behind an `Rc<RefCell<_>>` and
//! routes every observer callback, load completion and animation frame
//! through it.

use crate::config::Attributes;
use crate::environment::Environment;
use crate::error::{LoadError, SurfaceError};
use crate::events::{ModelLoaded, ModelLoadedBus, ModelLoadedListener};
use crate::model::Model;
use crate::registry::{Ensured, SurfaceFactory, ViewerRegistry};
use crate::scheduler::{FrameStats, RenderScheduler};
use crate::viewer::{ContainerId, LoadState, Viewer, ViewerId};

#[derive(Default)]
pub struct ViewerManager {
    registry: ViewerRegistry,
    bus: ModelLoadedBus,
    scheduler: RenderScheduler,
}

impl ViewerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn ModelLoadedListener>) {
        self.bus.subscribe(listener);
    }

    pub fn ensure_viewer(
        &mut self,
        container: ContainerId,
        attributes: impl FnOnce() -> Attributes,
        factory: &mut dyn SurfaceFactory,
        force_resize: bool,
    ) -> Result<Ensured, SurfaceError> {
        self.registry.ensure(container, attributes, factory, force_resize)
    }

    pub fn on_intersection(
        &mut self,
        container: ContainerId,
        intersecting: bool,
        attributes: impl FnOnce() -> Attributes,
        factory: &mut dyn SurfaceFactory,
    ) -> Result<Option<Ensured>, SurfaceError> {
        self.registry
            .on_intersection(container, intersecting, attributes, factory)
    }

    /// Container box changed while the viewer stayed in view.
    pub fn resize(&mut self, container: ContainerId) {
        if let Some(v) = self.registry.viewer_for_mut(container) {
            v.resize();
        }
    }

    /// Finishes an asynchronous model load. A viewer that was disposed in the
    /// meantime, or that already finished loading, ignores the result.
    pub fn complete_load(&mut self, viewer: ViewerId, url: &str, result: Result<Model, LoadError>) {
        let Some(v) = self.registry.get_mut(viewer) else {
            log::debug!("[load] dropping result for disposed viewer {}", viewer.0);
            return;
        };
        if v.load_state() != LoadState::Pending {
            log::debug!(
                "[load] viewer {} already settled, ignoring {}",
                viewer.0,
                url
            );
            return;
        }
        match result {
            Ok(model) => {
                let clip_count = model.clips.len();
                v.attach_model(model);
                log::info!(
                    "[load] {} attached to viewer {} ({} clips)",
                    url,
                    viewer.0,
                    clip_count
                );
                let event = ModelLoaded {
                    container: v.container(),
                    viewer,
                    url: url.to_owned(),
                    clip_count,
                };
                self.bus.publish(&event, v);
            }
            Err(e) => {
                log::warn!("[load] failed to load model {}: {}", url, e);
                v.fail_load();
            }
        }
    }

    pub fn complete_environment(
        &mut self,
        viewer: ViewerId,
        url: &str,
        result: Result<Environment, LoadError>,
    ) {
        let Some(v) = self.registry.get_mut(viewer) else {
            return;
        };
        match result {
            Ok(env) => {
                v.attach_environment(&env);
                log::info!("[load] environment {} attached to viewer {}", url, viewer.0);
            }
            Err(e) => log::warn!("[load] failed to load environment {}: {}", url, e),
        }
    }

    pub fn frame(&mut self, now: f64) -> FrameStats {
        self.scheduler.frame(now, &mut self.registry)
    }

    pub fn dispose(&mut self, container: ContainerId) -> bool {
        self.registry.dispose(container).is_some()
    }

    pub fn lookup(&self, container: ContainerId) -> Option<ViewerId> {
        self.registry.lookup(container)
    }

    pub fn viewer(&self, id: ViewerId) -> Option<&Viewer> {
        self.registry.get(id)
    }

    pub fn viewer_mut(&mut self, id: ViewerId) -> Option<&mut Viewer> {
        self.registry.get_mut(id)
    }

    pub fn viewer_for_mut(&mut self, container: ContainerId) -> Option<&mut Viewer> {
        self.registry.viewer_for_mut(container)
    }

    pub fn registry(&self) -> &ViewerRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }
}
