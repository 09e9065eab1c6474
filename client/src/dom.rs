use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, HtmlButtonElement, HtmlCanvasElement,
    HtmlElement, HtmlImageElement, HtmlInputElement,
};

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn create<T: JsCast>(document: &Document, tag: &str, class_name: &str) -> Result<T, JsValue> {
    let element = document.create_element(tag)?;
    if !class_name.is_empty() {
        element.set_class_name(class_name);
    }
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {tag}")))
}

pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("Invalid 2d context"))
}

/// Fades an overlay in or out, also toggling whether it receives pointer events.
pub fn set_shown(element: &HtmlElement, shown: bool) {
    let style = element.style();
    let _ = style.set_property("opacity", if shown { "1" } else { "0" });
    let _ = style.set_property("pointer-events", if shown { "unset" } else { "none" });
}

pub fn is_shown(element: &HtmlElement) -> bool {
    element
        .style()
        .get_property_value("opacity")
        .map(|value| value == "1")
        .unwrap_or(false)
}

pub fn set_display(element: &HtmlElement, display: &str) {
    let _ = element.style().set_property("display", display);
}

pub fn set_enabled(button: &HtmlButtonElement, enabled: bool) {
    button.set_disabled(!enabled);
    let _ = button
        .style()
        .set_property("opacity", if enabled { "unset" } else { "0.5" });
}

pub fn set_body_scroll(document: &Document, enabled: bool) {
    if let Some(body) = document.body() {
        let _ = body
            .style()
            .set_property("overflow", if enabled { "unset" } else { "hidden" });
    }
}

pub fn toggle_class(element: &Element, class_name: &str, on: bool) {
    let _ = element.class_list().toggle_with_force(class_name, on);
}

pub fn folder_icon(document: &Document) -> Result<HtmlElement, JsValue> {
    let icon: HtmlElement = create(document, "span", "folder-icon")?;
    icon.set_inner_html(
        "<svg viewBox=\"0 0 24 24\" aria-hidden=\"true\"><path d=\"M3 6h6l2 2h10v10H3z\" fill=\"none\" stroke=\"currentColor\" stroke-width=\"1\" stroke-linejoin=\"round\"/></svg>",
    );
    Ok(icon)
}

pub fn thumbnail(document: &Document, src: &str) -> Result<HtmlImageElement, JsValue> {
    let image: HtmlImageElement = create(document, "img", "")?;
    image.set_src(src);
    Ok(image)
}

/// Checkbox states of the image cards, in card order.
pub fn card_checkboxes(cards: &HtmlElement) -> Vec<HtmlInputElement> {
    let Ok(nodes) = cards.query_selector_all(".card input[type=\"checkbox\"]") else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|index| nodes.item(index))
        .filter_map(|node| node.dyn_into::<HtmlInputElement>().ok())
        .collect()
}
