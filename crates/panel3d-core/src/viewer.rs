//! One interactive 3D viewer bound to one page container.

use crate::animation::AnimationMixer;
use crate::config::{Attributes, ClearColor, ViewerConfig};
use crate::constants::*;
use crate::controls::{Camera, OrbitControls};
use crate::environment::Environment;
use crate::error::RenderError;
use crate::lighting::{GroundPlane, LightRig};
use crate::model::Model;
use crate::stars::StarField;
use glam::{Mat4, Vec3};

/// Host-assigned identity of a container element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewerId(pub u64);

/// Everything a surface needs to draw one frame.
pub struct FrameView<'a> {
    pub view: Mat4,
    pub proj: Mat4,
    pub eye: Vec3,
    pub clear: ClearColor,
    pub exposure: f32,
    pub model: Option<&'a Model>,
    pub ground: Option<&'a GroundPlane>,
    pub stars: Option<&'a StarField>,
    pub lights: &'a LightRig,
}

/// Backend that owns the GPU resources of one viewer.
pub trait RenderSurface {
    /// Current drawing-buffer size in pixels.
    fn size(&self) -> (u32, u32);
    /// Re-reads the container box and reconfigures. Returns the new size.
    fn resize(&mut self) -> (u32, u32);
    fn prepare_stars(&mut self, _stars: &StarField) {}
    fn prepare_model(&mut self, model: &Model, ground: Option<&GroundPlane>);
    fn prepare_environment(&mut self, _environment: &Environment) {}
    fn render(&mut self, frame: &FrameView<'_>) -> Result<(), RenderError>;
}

/// What a ticker may touch while it runs.
pub struct TickContext<'a> {
    pub viewer: ViewerId,
    pub model: Option<&'a mut Model>,
}

/// Per-frame hook registered against a viewer.
pub trait Ticker {
    fn advance(&mut self, dt: f32, ctx: &mut TickContext<'_>) -> anyhow::Result<()>;

    fn label(&self) -> &str {
        "ticker"
    }
}

/// Adapts a closure into a [`Ticker`].
pub struct FnTicker<F>(pub F);

impl<F> FnTicker<F>
where
    F: FnMut(f32, &mut TickContext<'_>) -> anyhow::Result<()>,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Ticker for FnTicker<F>
where
    F: FnMut(f32, &mut TickContext<'_>) -> anyhow::Result<()>,
{
    fn advance(&mut self, dt: f32, ctx: &mut TickContext<'_>) -> anyhow::Result<()> {
        (self.0)(dt, ctx)
    }
}

struct TickerSlot {
    ticker: Box<dyn Ticker>,
    failures: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    /// No model declared.
    Idle,
    Pending,
    Loaded,
    Failed,
}

pub struct Viewer {
    id: ViewerId,
    container: ContainerId,
    attributes: Attributes,
    config: ViewerConfig,
    clear: ClearColor,
    surface: Box<dyn RenderSurface>,
    camera: Camera,
    controls: OrbitControls,
    visible: bool,
    auto_rotating: bool,
    resume_at: Option<f64>,
    mixer: Option<AnimationMixer>,
    model: Option<Model>,
    tickers: Vec<TickerSlot>,
    stars: Option<StarField>,
    lights: LightRig,
    ground: Option<GroundPlane>,
    load_state: LoadState,
    has_environment: bool,
    frames_drawn: u64,
    render_failures: u32,
}

impl Viewer {
    pub fn new(
        id: ViewerId,
        container: ContainerId,
        attributes: Attributes,
        mut surface: Box<dyn RenderSurface>,
    ) -> Self {
        let config = ViewerConfig::from_attributes(&attributes);
        let mut camera = Camera::default();
        let (w, h) = surface.size();
        camera.set_viewport(w, h);
        let stars = config
            .stars
            .as_ref()
            .map(|s| StarField::generate(s, container.0));
        if let Some(s) = &stars {
            surface.prepare_stars(s);
            camera.zfar = camera.zfar.max(star_far_plane(s));
        }
        let load_state = if config.model.is_some() {
            LoadState::Pending
        } else {
            LoadState::Idle
        };
        Self {
            id,
            container,
            clear: config.clear_color(),
            lights: LightRig::new(config.shadow_map_enabled()),
            auto_rotating: config.autorotate,
            attributes,
            config,
            surface,
            camera,
            controls: OrbitControls::default(),
            visible: false,
            resume_at: None,
            mixer: None,
            model: None,
            tickers: Vec::new(),
            stars,
            ground: None,
            load_state,
            has_environment: false,
            frames_drawn: 0,
            render_failures: 0,
        }
    }

    pub fn id(&self) -> ViewerId {
        self.id
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn clear_color(&self) -> ClearColor {
        self.clear
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_auto_rotating(&self) -> bool {
        self.auto_rotating
    }

    pub fn resume_pending(&self) -> bool {
        self.resume_at.is_some()
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut Model> {
        self.model.as_mut()
    }

    pub fn mixer(&self) -> Option<&AnimationMixer> {
        self.mixer.as_ref()
    }

    pub fn stars(&self) -> Option<&StarField> {
        self.stars.as_ref()
    }

    pub fn ground(&self) -> Option<&GroundPlane> {
        self.ground.as_ref()
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn has_environment(&self) -> bool {
        self.has_environment
    }

    pub fn ticker_count(&self) -> usize {
        self.tickers.len()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface.size()
    }

    pub fn resize(&mut self) {
        let (w, h) = self.surface.resize();
        self.camera.set_viewport(w, h);
    }

    /// Appends a per-frame hook. Tickers run in registration order.
    pub fn add_ticker(&mut self, ticker: Box<dyn Ticker>) {
        self.tickers.push(TickerSlot {
            ticker,
            failures: 0,
        });
    }

    /// Frames a freshly loaded model and hands it to the surface.
    pub fn attach_model(&mut self, mut model: Model) {
        model.center_at_origin();
        let bounds = model.bounds();
        let size = bounds.diagonal().max(1e-3);
        let distance = self.camera.fit_distance(size, self.config.zoom);

        self.camera.znear = distance * CAMERA_NEAR_FACTOR;
        self.camera.zfar = (distance * CAMERA_FAR_FACTOR).max(self.stars.as_ref().map_or(0.0, star_far_plane));
        self.controls.target = Vec3::ZERO;
        self.controls.min_distance = distance * CONTROLS_MIN_DISTANCE_FACTOR;
        self.controls.max_distance = distance * CONTROLS_MAX_DISTANCE_FACTOR;
        self.controls
            .set_eye(Vec3::new(0.0, CAMERA_ELEVATION, 1.0).normalize() * distance);

        if model.has_animations() {
            self.mixer = Some(AnimationMixer::new(&model.clips));
            self.auto_rotating = false;
        }
        self.lights.fit_to(&bounds);
        self.ground = self
            .config
            .ground
            .as_ref()
            .filter(|_| !bounds.is_empty())
            .map(|g| GroundPlane::under(&bounds, g));
        self.surface.prepare_model(&model, self.ground.as_ref());
        self.model = Some(model);
        self.load_state = LoadState::Loaded;
    }

    pub fn fail_load(&mut self) {
        self.load_state = LoadState::Failed;
    }

    pub fn attach_environment(&mut self, environment: &Environment) {
        self.surface.prepare_environment(environment);
        self.has_environment = true;
    }

    pub fn on_pointer_down(&mut self) {
        self.stop_auto_rotate();
    }

    pub fn on_wheel(&mut self, dolly_factor: f32) {
        self.stop_auto_rotate();
        self.controls.dolly(dolly_factor);
    }

    pub fn on_drag(&mut self, dx: f32, dy: f32, height: f32) {
        self.controls.drag(dx, dy, height);
    }

    /// Arms the idle timer; auto-rotation may resume once it elapses.
    pub fn on_pointer_up(&mut self, now: f64) {
        self.resume_at = Some(now + AUTO_ROTATE_RESUME_SEC);
    }

    fn stop_auto_rotate(&mut self) {
        self.auto_rotating = false;
        self.resume_at = None;
    }

    pub(crate) fn poll_resume(&mut self, now: f64) {
        if let Some(at) = self.resume_at {
            if now >= at {
                self.resume_at = None;
                if self.mixer.is_none() && self.config.autorotate {
                    self.auto_rotating = true;
                }
            }
        }
    }

    pub(crate) fn advance_stars(&mut self, dt: f32) {
        if let Some(s) = &mut self.stars {
            s.advance(dt);
        }
    }

    pub(crate) fn advance_mixer(&mut self, dt: f32) {
        if let (Some(mixer), Some(model)) = (&mut self.mixer, &mut self.model) {
            mixer.update(dt, &model.clips, &mut model.scene);
        }
    }

    pub(crate) fn advance_auto_rotate(&mut self, dt: f32) {
        if self.auto_rotating {
            self.controls.auto_rotate(dt);
        }
    }

    /// Runs every ticker; a failing ticker never stops the others.
    pub(crate) fn run_tickers(&mut self, dt: f32) {
        let id = self.id;
        for (index, slot) in self.tickers.iter_mut().enumerate() {
            let mut ctx = TickContext {
                viewer: id,
                model: self.model.as_mut(),
            };
            if let Err(e) = slot.ticker.advance(dt, &mut ctx) {
                slot.failures += 1;
                if slot.failures == 1 {
                    log::warn!(
                        "[panel3d] ticker #{} ({}) on viewer {} failed: {:#}",
                        index,
                        slot.ticker.label(),
                        id.0,
                        e
                    );
                } else {
                    log::debug!("[panel3d] ticker #{} failed again: {:#}", index, e);
                }
            }
        }
    }

    pub(crate) fn update_controls(&mut self) {
        self.controls.update();
    }

    pub(crate) fn draw(&mut self) -> Result<(), RenderError> {
        let frame = FrameView {
            view: self.controls.view_matrix(),
            proj: self.camera.projection_matrix(),
            eye: self.controls.eye(),
            clear: self.clear,
            exposure: self.config.exposure,
            model: self.model.as_ref(),
            ground: self.ground.as_ref(),
            stars: self.stars.as_ref(),
            lights: &self.lights,
        };
        match self.surface.render(&frame) {
            Ok(()) => {
                self.frames_drawn += 1;
                self.render_failures = 0;
                Ok(())
            }
            Err(e) => {
                self.render_failures += 1;
                Err(e)
            }
        }
    }

    /// Consecutive failed draws, reset by the next successful one.
    pub fn render_failures(&self) -> u32 {
        self.render_failures
    }
}

/// Far plane that keeps the whole star shell inside the frustum.
fn star_far_plane(stars: &StarField) -> f32 {
    stars
        .positions
        .iter()
        .map(|p| p.length())
        .fold(0.0_f32, f32::max)
        * 3.0
}
