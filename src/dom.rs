use crate::constants::{CONTAINER_SELECTOR, DATA_PREFIX, MAX_DEVICE_PIXEL_RATIO};
use crate::input;
use panel3d_core::{Attributes, ContainerId};
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Every element on the page declared as a viewer host, in document order.
pub fn find_containers(document: &web::Document) -> Vec<web::Element> {
    let Ok(list) = document.query_selector_all(CONTAINER_SELECTOR) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|n| n.dyn_into::<web::Element>().ok())
        .collect()
}

/// Collects `data-*` attributes with the prefix stripped.
pub fn collect_attributes(element: &web::Element) -> Attributes {
    let mut attrs = Attributes::new();
    for name in element.get_attribute_names().iter() {
        let Some(name) = name.as_string() else {
            continue;
        };
        let Some(key) = name.strip_prefix(DATA_PREFIX) else {
            continue;
        };
        if let Some(value) = element.get_attribute(&name) {
            attrs.insert(key, value);
        }
    }
    attrs
}

/// Appends a full-size canvas to the container.
pub fn create_canvas(
    document: &web::Document,
    container: &web::Element,
) -> anyhow::Result<web::HtmlCanvasElement> {
    let canvas: web::HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(|e| anyhow::anyhow!("{:?}", e))?
        .dyn_into()
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    let style = canvas.style();
    _ = style.set_property("display", "block");
    _ = style.set_property("width", "100%");
    _ = style.set_property("height", "100%");
    _ = style.set_property("touch-action", "none");
    container
        .append_child(&canvas)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    sync_canvas_backing_size(&canvas, container);
    Ok(canvas)
}

/// Sizes the drawing buffer to the container box. Returns the new size.
pub fn sync_canvas_backing_size(
    canvas: &web::HtmlCanvasElement,
    container: &web::Element,
) -> (u32, u32) {
    let dpr = web::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0);
    let rect = container.get_bounding_client_rect();
    let (w, h) = input::backing_size(rect.width(), rect.height(), dpr, MAX_DEVICE_PIXEL_RATIO);
    if canvas.width() != w {
        canvas.set_width(w);
    }
    if canvas.height() != h {
        canvas.set_height(h);
    }
    (w, h)
}

pub fn query_canvas(document: &web::Document, selector: &str) -> Option<web::HtmlCanvasElement> {
    document
        .query_selector(selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<web::HtmlCanvasElement>().ok())
}

pub fn context_2d(canvas: &web::HtmlCanvasElement) -> Option<web::CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|c| c.dyn_into::<web::CanvasRenderingContext2d>().ok())
}

pub fn prefers_reduced_motion() -> bool {
    web::window()
        .and_then(|w| w.match_media("(prefers-reduced-motion: reduce)").ok().flatten())
        .map(|mq| mq.matches())
        .unwrap_or(false)
}

/// Stable ids for container elements, in first-seen order.
#[derive(Default)]
pub struct ContainerMap {
    entries: Vec<(web::Element, ContainerId)>,
    next: u64,
}

impl ContainerMap {
    pub fn id_for(&mut self, element: &web::Element) -> ContainerId {
        if let Some(id) = self.find(element) {
            return id;
        }
        let id = ContainerId(self.next);
        self.next += 1;
        self.entries.push((element.clone(), id));
        id
    }

    pub fn find(&self, element: &web::Element) -> Option<ContainerId> {
        self.entries
            .iter()
            .find(|(el, _)| el == element)
            .map(|(_, id)| *id)
    }

    pub fn element(&self, id: ContainerId) -> Option<&web::Element> {
        self.entries
            .iter()
            .find(|(_, i)| *i == id)
            .map(|(el, _)| el)
    }

    pub fn ids(&self) -> Vec<ContainerId> {
        self.entries.iter().map(|(_, id)| *id).collect()
    }
}
