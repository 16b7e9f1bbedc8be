use thiserror::Error;

/// Why a model or environment asset could not be attached to a viewer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },
    #[error("glTF decode failed: {0}")]
    Decode(#[from] gltf::Error),
    #[error("asset contains no scene")]
    NoScene,
    #[error("environment map: {0}")]
    Environment(String),
}

/// A rendering surface could not be allocated for a container.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("rendering surface unavailable: {0}")]
    Unavailable(String),
}

/// A single draw failed. The scheduler logs these and moves on.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("surface lost or outdated")]
    Lost,
    #[error("out of memory")]
    OutOfMemory,
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingError {
    #[error("path produced {got} points for a ring of {expected}")]
    CountMismatch { expected: usize, got: usize },
}
