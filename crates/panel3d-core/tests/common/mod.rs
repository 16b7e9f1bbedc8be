// Shared fixtures: hand-built models and a recording render surface.

#![allow(dead_code)]

use glam::Vec3;
use panel3d_core::scene::{MeshData, Primitive, SceneGraph, Transform};
use panel3d_core::*;
use std::cell::RefCell;
use std::rc::Rc;

pub fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

/// Closed box with the given half extents, 12 triangles.
pub fn box_mesh(name: &str, half: Vec3) -> MeshData {
    let (x, y, z) = (half.x, half.y, half.z);
    let positions = vec![
        [-x, -y, -z],
        [x, -y, -z],
        [x, y, -z],
        [-x, y, -z],
        [-x, -y, z],
        [x, -y, z],
        [x, y, z],
        [-x, y, z],
    ];
    let indices = vec![
        0, 2, 1, 0, 3, 2, 4, 5, 6, 4, 6, 7, 0, 1, 5, 0, 5, 4, 3, 6, 2, 3, 7, 6, 1, 2, 6, 1, 6, 5,
        0, 4, 7, 0, 7, 3,
    ];
    MeshData {
        name: Some(name.to_owned()),
        primitives: vec![Primitive::new(positions, None, Some(indices), [0.8, 0.8, 0.8, 1.0])],
    }
}

/// Thin disc facing +Z: radius `r`, thickness 10% of the diameter.
pub fn disc_mesh(name: &str, r: f32) -> MeshData {
    box_mesh(name, Vec3::new(r, r, r * 0.1))
}

/// Flat model: each entry becomes a named mesh node under the root.
pub fn model_of(parts: &[(&str, MeshData, Vec3)]) -> Model {
    let mut scene = SceneGraph::new();
    let mut meshes = Vec::new();
    for (name, mesh, at) in parts {
        meshes.push(mesh.clone());
        scene.add_node(
            SceneGraph::ROOT,
            Some(name),
            Transform::from_translation(*at),
            Some(meshes.len() - 1),
        );
    }
    Model::new(scene, meshes, Vec::new())
}

/// Two discs, "A" (r = 1.0) and "B" (r = 0.5), side by side.
pub fn two_disc_model() -> Model {
    model_of(&[
        ("A", disc_mesh("A", 1.0), Vec3::new(-1.5, 0.0, 0.0)),
        ("B", disc_mesh("B", 0.5), Vec3::new(1.0, 0.0, 0.0)),
    ])
}

#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub renders: usize,
    pub resizes: usize,
    pub models_prepared: usize,
    pub stars_prepared: usize,
    pub environments: usize,
    pub last_clear: Option<ClearColor>,
}

pub struct RecordingSurface {
    size: (u32, u32),
    log: Rc<RefCell<SurfaceLog>>,
    fail_render: bool,
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self) -> (u32, u32) {
        self.log.borrow_mut().resizes += 1;
        self.size
    }

    fn prepare_stars(&mut self, _stars: &panel3d_core::stars::StarField) {
        self.log.borrow_mut().stars_prepared += 1;
    }

    fn prepare_model(
        &mut self,
        _model: &Model,
        _ground: Option<&panel3d_core::lighting::GroundPlane>,
    ) {
        self.log.borrow_mut().models_prepared += 1;
    }

    fn prepare_environment(&mut self, _env: &panel3d_core::environment::Environment) {
        self.log.borrow_mut().environments += 1;
    }

    fn render(&mut self, frame: &FrameView<'_>) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        log.last_clear = Some(frame.clear);
        if self.fail_render {
            return Err(RenderError::Lost);
        }
        log.renders += 1;
        Ok(())
    }
}

/// Factory that hands out recording surfaces and remembers every one.
#[derive(Default)]
pub struct RecordingFactory {
    pub created: Vec<(ContainerId, Rc<RefCell<SurfaceLog>>)>,
    pub fail_next: bool,
    pub fail_render: bool,
}

impl RecordingFactory {
    pub fn log_for(&self, container: ContainerId) -> Rc<RefCell<SurfaceLog>> {
        self.created
            .iter()
            .rev()
            .find(|(c, _)| *c == container)
            .map(|(_, l)| l.clone())
            .expect("no surface for container")
    }

    pub fn count_for(&self, container: ContainerId) -> usize {
        self.created.iter().filter(|(c, _)| *c == container).count()
    }
}

impl SurfaceFactory for RecordingFactory {
    fn create(
        &mut self,
        container: ContainerId,
        _config: &ViewerConfig,
    ) -> Result<Box<dyn RenderSurface>, SurfaceError> {
        if std::mem::take(&mut self.fail_next) {
            return Err(SurfaceError::Unavailable("no adapter".into()));
        }
        let log = Rc::new(RefCell::new(SurfaceLog::default()));
        self.created.push((container, log.clone()));
        Ok(Box::new(RecordingSurface {
            size: (800, 600),
            log,
            fail_render: self.fail_render,
        }))
    }
}
