//! Lazy activation: at most one viewer per container, created on first use.

use crate::config::{Attributes, ViewerConfig};
use crate::error::SurfaceError;
use crate::viewer::{ContainerId, RenderSurface, Viewer, ViewerId};
use fnv::FnvHashMap;

/// Builds the rendering surface for a container. Called at most once per
/// live container.
pub trait SurfaceFactory {
    fn create(
        &mut self,
        container: ContainerId,
        config: &ViewerConfig,
    ) -> Result<Box<dyn RenderSurface>, SurfaceError>;
}

/// Result of an ensure request.
#[derive(Clone, Debug, PartialEq)]
pub struct Ensured {
    pub viewer: ViewerId,
    pub created: bool,
    /// Model URL to fetch, only set when the viewer was just created.
    pub model_url: Option<String>,
    /// Environment map URL to fetch, only set when the viewer was just created.
    pub env_url: Option<String>,
}

#[derive(Default)]
pub struct ViewerRegistry {
    viewers: Vec<Viewer>,
    by_container: FnvHashMap<ContainerId, ViewerId>,
    next_id: u64,
}

impl ViewerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the viewer for `container`, building it if needed.
    /// `attributes` is only read when a viewer is built.
    pub fn ensure(
        &mut self,
        container: ContainerId,
        attributes: impl FnOnce() -> Attributes,
        factory: &mut dyn SurfaceFactory,
        force_resize: bool,
    ) -> Result<Ensured, SurfaceError> {
        if let Some(&id) = self.by_container.get(&container) {
            if force_resize {
                if let Some(v) = self.get_mut(id) {
                    v.resize();
                }
            }
            return Ok(Ensured {
                viewer: id,
                created: false,
                model_url: None,
                env_url: None,
            });
        }

        let attributes = attributes();
        let config = ViewerConfig::from_attributes(&attributes);
        let surface = factory.create(container, &config)?;
        let id = ViewerId(self.next_id);
        self.next_id += 1;

        let mut viewer = Viewer::new(id, container, attributes, surface);
        if force_resize {
            viewer.resize();
        }
        let model_url = viewer.config().model.clone();
        let env_url = viewer.config().env_hdr.clone();
        log::debug!(
            "[panel3d] viewer {} created for container {} (model: {})",
            id.0,
            container.0,
            model_url.as_deref().unwrap_or("none")
        );
        self.viewers.push(viewer);
        self.by_container.insert(container, id);
        Ok(Ensured {
            viewer: id,
            created: true,
            model_url,
            env_url,
        })
    }

    /// Applies one visibility crossing. Entering view creates the viewer on
    /// first sight and forces a resize on every later entry.
    pub fn on_intersection(
        &mut self,
        container: ContainerId,
        intersecting: bool,
        attributes: impl FnOnce() -> Attributes,
        factory: &mut dyn SurfaceFactory,
    ) -> Result<Option<Ensured>, SurfaceError> {
        if !intersecting {
            if let Some(v) = self.viewer_for_mut(container) {
                v.set_visible(false);
            }
            return Ok(None);
        }
        let ensured = self.ensure(container, attributes, factory, true)?;
        if let Some(v) = self.get_mut(ensured.viewer) {
            v.set_visible(true);
        }
        Ok(Some(ensured))
    }

    pub fn lookup(&self, container: ContainerId) -> Option<ViewerId> {
        self.by_container.get(&container).copied()
    }

    pub fn get(&self, id: ViewerId) -> Option<&Viewer> {
        self.viewers.iter().find(|v| v.id() == id)
    }

    pub fn get_mut(&mut self, id: ViewerId) -> Option<&mut Viewer> {
        self.viewers.iter_mut().find(|v| v.id() == id)
    }

    pub fn viewer_for(&self, container: ContainerId) -> Option<&Viewer> {
        self.lookup(container).and_then(|id| self.get(id))
    }

    pub fn viewer_for_mut(&mut self, container: ContainerId) -> Option<&mut Viewer> {
        let id = self.lookup(container)?;
        self.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.viewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }

    /// Viewers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Viewer> {
        self.viewers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Viewer> {
        self.viewers.iter_mut()
    }

    /// Removes the viewer for `container`, releasing its surface and tickers.
    /// A later `ensure` for the same container builds a fresh viewer.
    pub fn dispose(&mut self, container: ContainerId) -> Option<Viewer> {
        let id = self.by_container.remove(&container)?;
        let index = self.viewers.iter().position(|v| v.id() == id)?;
        log::debug!("[panel3d] viewer {} disposed", id.0);
        Some(self.viewers.remove(index))
    }
}
