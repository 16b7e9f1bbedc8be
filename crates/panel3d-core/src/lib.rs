pub mod animation;
pub mod config;
pub mod constants;
pub mod controls;
pub mod environment;
pub mod error;
pub mod events;
pub mod gears;
pub mod lighting;
pub mod manager;
pub mod model;
pub mod noise;
pub mod paths;
pub mod registry;
pub mod ring;
pub mod scene;
pub mod scheduler;
pub mod stars;
pub mod viewer;

// Shaders bundled as string constants
pub static MESH_WGSL: &str = include_str!("../shaders/mesh.wgsl");
pub static SHADOW_WGSL: &str = include_str!("../shaders/shadow.wgsl");
pub static STARS_WGSL: &str = include_str!("../shaders/stars.wgsl");
pub static BACKGROUND_WGSL: &str = include_str!("../shaders/background.wgsl");

pub use config::{Attributes, ClearColor, Rgb, ViewerConfig};
pub use error::{LoadError, RenderError, RingError, SurfaceError};
pub use events::{ModelLoaded, ModelLoadedBus, ModelLoadedListener};
pub use gears::{GearAnimator, GearConfig, GearTicker, PartResolver};
pub use manager::ViewerManager;
pub use model::Model;
pub use registry::{Ensured, SurfaceFactory, ViewerRegistry};
pub use scheduler::{FrameStats, RenderScheduler};
pub use viewer::{
    ContainerId, FnTicker, FrameView, LoadState, RenderSurface, TickContext, Ticker, Viewer,
    ViewerId,
};
