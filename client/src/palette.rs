use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlButtonElement, HtmlElement};

use inkgallery_shared::ColorId;

pub const COLORS: [&str; 9] = [
    "#444444",
    "#ff6663",
    "#feb144",
    "#fdfd97",
    "#9ee09e",
    "#9ec1cf",
    "#cc99c9",
    "#eeeeee",
    "transparent",
];
pub const DEFAULT_COLOR: usize = 4;
pub const COLOR_STORAGE_KEY: &str = "drawing-color";

pub enum PaletteAction {
    Select(usize),
    Undo,
    Clear,
    Revert,
    Save,
}

pub fn color_at(index: usize) -> ColorId {
    ColorId::from(COLORS.get(index).copied().unwrap_or(COLORS[DEFAULT_COLOR]))
}

pub fn index_of(color: &str) -> Option<usize> {
    COLORS
        .iter()
        .position(|known| known.eq_ignore_ascii_case(color))
}

const UNDO_ICON: &str = "<svg viewBox=\"0 0 24 24\" aria-hidden=\"true\"><path d=\"M4 4v6h6M4.5 15a8 8 0 1 0 1.9-8.3L4 10\" fill=\"none\" stroke=\"currentColor\" stroke-width=\"2\" stroke-linecap=\"round\"/></svg>";
const CLEAR_ICON: &str = "<svg viewBox=\"0 0 24 24\" aria-hidden=\"true\"><path d=\"M3 6h18M8 6V4h8v2M6 6l1 14h10l1-14M10 11v6M14 11v6\" fill=\"none\" stroke=\"currentColor\" stroke-width=\"2\" stroke-linecap=\"round\"/></svg>";
const REVERT_ICON: &str = "<svg viewBox=\"0 0 24 24\" aria-hidden=\"true\"><path d=\"M9 4h6v3H9zM7 5H5v16h14V5h-2\" fill=\"none\" stroke=\"currentColor\" stroke-width=\"2\" stroke-linejoin=\"round\"/></svg>";
const SAVE_ICON: &str = "<svg viewBox=\"0 0 24 24\" aria-hidden=\"true\"><path d=\"M5 3h11l3 3v15H5zM8 3v6h8M8 21v-7h8v7\" fill=\"none\" stroke=\"currentColor\" stroke-width=\"2\" stroke-linejoin=\"round\"/></svg>";

pub fn render_palette(document: &Document, palette_el: &HtmlElement, selected: usize) {
    palette_el.set_inner_html("");
    for (index, color) in COLORS.iter().enumerate() {
        let Ok(element) = document.create_element("button") else {
            continue;
        };
        let Ok(button) = element.dyn_into::<HtmlButtonElement>() else {
            continue;
        };
        let _ = button.set_attribute("type", "button");
        let _ = button.set_attribute("data-index", &index.to_string());
        let _ = button.set_attribute("aria-label", &format!("Use color {color}"));
        let class_name = if index == selected {
            "swatch active"
        } else {
            "swatch"
        };
        let _ = button.set_attribute("class", class_name);
        let _ = button.style().set_property("background", color);
        if *color == "transparent" {
            button.set_inner_html("<span class=\"eraser-slash\"></span>");
        }
        let _ = palette_el.append_child(&button);
    }

    append_spacer(document, palette_el);
    append_action(document, palette_el, "undo", "Undo", UNDO_ICON);
    append_action(document, palette_el, "clear", "Clear drawing", CLEAR_ICON);
    append_action(document, palette_el, "revert", "Revert drawing", REVERT_ICON);
    append_spacer(document, palette_el);
    append_action(document, palette_el, "save", "Save and close", SAVE_ICON);
}

fn append_spacer(document: &Document, palette_el: &HtmlElement) {
    if let Ok(spacer) = document.create_element("div") {
        spacer.set_class_name("spacer");
        let _ = palette_el.append_child(&spacer);
    }
}

fn append_action(document: &Document, palette_el: &HtmlElement, action: &str, label: &str, icon: &str) {
    let Ok(element) = document.create_element("button") else {
        return;
    };
    let Ok(button) = element.dyn_into::<HtmlButtonElement>() else {
        return;
    };
    let _ = button.set_attribute("type", "button");
    let _ = button.set_attribute("data-action", action);
    let _ = button.set_attribute("aria-label", label);
    let _ = button.set_attribute("class", "palette-action");
    button.set_inner_html(icon);
    let _ = palette_el.append_child(&button);
}

pub fn action_button(palette_el: &HtmlElement, action: &str) -> Option<HtmlButtonElement> {
    palette_el
        .query_selector(&format!("[data-action=\"{action}\"]"))
        .ok()
        .flatten()
        .and_then(|element| element.dyn_into::<HtmlButtonElement>().ok())
}

pub fn highlight(palette_el: &HtmlElement, selected: usize) {
    let Ok(swatches) = palette_el.query_selector_all(".swatch") else {
        return;
    };
    for index in 0..swatches.length() {
        if let Some(element) = swatches
            .item(index)
            .and_then(|node| node.dyn_into::<Element>().ok())
        {
            let _ = element
                .class_list()
                .toggle_with_force("active", index as usize == selected);
        }
    }
}

pub fn palette_action_from_event(event: &Event) -> Option<PaletteAction> {
    let mut current = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok());
    while let Some(element) = current {
        if let Some(action) = element.get_attribute("data-action") {
            return match action.as_str() {
                "undo" => Some(PaletteAction::Undo),
                "clear" => Some(PaletteAction::Clear),
                "revert" => Some(PaletteAction::Revert),
                "save" => Some(PaletteAction::Save),
                _ => None,
            };
        }
        if let Some(index) = element.get_attribute("data-index") {
            return index.parse::<usize>().ok().map(PaletteAction::Select);
        }
        current = element.parent_element();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eraser_is_the_last_color() {
        assert!(color_at(COLORS.len() - 1).is_eraser());
        assert_eq!(color_at(DEFAULT_COLOR).as_str(), "#9ee09e");
        assert_eq!(color_at(99).as_str(), "#9ee09e");
    }

    #[test]
    fn stored_colors_map_back_to_swatches() {
        assert_eq!(index_of("#FF6663"), Some(1));
        assert_eq!(index_of("transparent"), Some(8));
        assert_eq!(index_of("rebeccapurple"), None);
    }
}
