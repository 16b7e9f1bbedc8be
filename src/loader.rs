use panel3d_core::environment::Environment;
use panel3d_core::{Ensured, LoadError, Model, ViewerId};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

/// Starts the fetches a freshly created viewer asked for. Results are
/// handed back to the manager whenever they arrive.
pub fn spawn_loads(ensured: &Ensured) {
    if let Some(url) = ensured.model_url.clone() {
        let viewer = ensured.viewer;
        spawn_local(async move {
            let result = load_model(&url).await;
            crate::with_runtime(|rt| rt.manager.complete_load(viewer, &url, result));
        });
    }
    if let Some(url) = ensured.env_url.clone() {
        let viewer = ensured.viewer;
        spawn_local(async move {
            let result = load_environment(viewer, &url).await;
            crate::with_runtime(|rt| rt.manager.complete_environment(viewer, &url, result));
        });
    }
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, LoadError> {
    let window = web::window().ok_or_else(|| LoadError::Fetch("no window".into()))?;
    let resp = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| LoadError::Fetch(format!("{:?}", e)))?;
    let resp: web::Response = resp
        .dyn_into()
        .map_err(|e| LoadError::Fetch(format!("{:?}", e)))?;
    if !resp.ok() {
        return Err(LoadError::Http {
            status: resp.status(),
            url: url.to_owned(),
        });
    }
    let promise = resp
        .array_buffer()
        .map_err(|e| LoadError::Fetch(format!("{:?}", e)))?;
    let buf = JsFuture::from(promise)
        .await
        .map_err(|e| LoadError::Fetch(format!("{:?}", e)))?;
    Ok(js_sys::Uint8Array::new(&buf).to_vec())
}

async fn load_model(url: &str) -> Result<Model, LoadError> {
    let bytes = fetch_bytes(url).await?;
    log::debug!("[load] {} fetched ({} bytes)", url, bytes.len());
    Model::from_gltf_slice(&bytes)
}

async fn load_environment(viewer: ViewerId, url: &str) -> Result<Environment, LoadError> {
    let bytes = fetch_bytes(url).await?;
    let image = image::load_from_memory_with_format(&bytes, image::ImageFormat::Hdr)
        .map_err(|e| LoadError::Environment(e.to_string()))?
        .to_rgb32f();
    let Some((exposure, with_background)) = crate::with_runtime(|rt| {
        rt.manager
            .viewer(viewer)
            .map(|v| (v.config().exposure, v.config().env_background))
    })
    .flatten() else {
        return Err(LoadError::Environment("viewer disposed".into()));
    };
    Environment::from_equirect(
        image.width(),
        image.height(),
        image.as_raw(),
        exposure,
        with_background,
    )
}
