use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlButtonElement, HtmlCanvasElement, KeyboardEvent,
    PointerEvent, UrlSearchParams, Window,
};

use inkgallery_shared::ROOT_DIR;

use crate::annotate;
use crate::dom::{context_2d, get_element, is_shown};
use crate::gallery::{self, CardTarget};
use crate::palette::palette_action_from_event;
use crate::state::{Elements, State};
use crate::util::{swipe_direction, Swipe};
use crate::viewer;

pub struct App {
    pub window: Window,
    pub document: Document,
    pub el: Elements,
    pub state: RefCell<State>,
}

fn document_ready_state(document: &Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

fn document_visibility_state(document: &Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("visibilityState"))
        .ok()?
        .as_string()
}

fn dir_from_location(window: &Window) -> String {
    window
        .location()
        .search()
        .ok()
        .and_then(|search| UrlSearchParams::new_with_str(&search).ok())
        .and_then(|params| params.get("currentDir"))
        .filter(|dir| !dir.is_empty())
        .unwrap_or_else(|| ROOT_DIR.to_string())
}

fn element_id(event: &Event) -> Option<String> {
    event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .map(|element| element.id())
}

fn listen(
    target: &EventTarget,
    kind: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn on_click(
    document: &Document,
    id: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let button: HtmlButtonElement = get_element(document, id)?;
    listen(&button, "click", handler)
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&err.to_string()));
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() == Some("complete") {
        started.set(true);
        return start_app(window, document);
    }

    let onload_started = started.clone();
    let onload_window = window.clone();
    listen(&window, "load", move |_| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app(onload_window.clone(), document.clone()) {
            log::error!("Starting gallery failed: {err:?}");
        }
    })
}

fn start_app(window: Window, document: Document) -> Result<(), JsValue> {
    let canvas: HtmlCanvasElement = get_element(&document, "mainCanvas")?;
    let ctx = context_2d(&canvas)?;
    let el = Elements {
        real_root: get_element(&document, "realRoot")?,
        cards: get_element(&document, "cards")?,
        selection_buttons: get_element(&document, "selectionButtons")?,
        simple_buttons: get_element(&document, "simpleButtons")?,
        capture_button: get_element(&document, "capture")?,
        folder_modal: get_element(&document, "folderModal")?,
        folders: get_element(&document, "folders")?,
        folder_name: get_element(&document, "folderName")?,
        modal: get_element(&document, "modal")?,
        image_container: get_element(&document, "imageContainer")?,
        modal_image: get_element(&document, "modalImage")?,
        pager: get_element(&document, "pager")?,
        canvas,
        ctx,
        palette_container: get_element(&document, "paletteContainer")?,
        palette: get_element(&document, "palette")?,
        size_slider: get_element(&document, "sizeSlider")?,
        cursor: get_element(&document, "cursor")?,
        stats: get_element(&document, "stats")?,
    };
    let color_index = annotate::stored_color(&window);
    let app = Rc::new(App {
        window,
        document,
        el,
        state: RefCell::new(State::new(color_index)),
    });

    annotate::init_palette(&app);
    wire_gallery(&app)?;
    wire_viewer(&app)?;
    wire_canvas(&app)?;
    wire_window(&app)?;

    let dir = dir_from_location(&app.window);
    gallery::select_dir(&app, &dir, false);
    Ok(())
}

fn wire_gallery(app: &Rc<App>) -> Result<(), JsValue> {
    let document = &app.document;

    let app_cb = app.clone();
    listen(&app.el.cards, "click", move |event| {
        match gallery::card_target_from_event(&event) {
            Some(CardTarget::Checkbox) => gallery::update_checkboxes(&app_cb),
            Some(CardTarget::Folder(dir)) => gallery::select_dir(&app_cb, &dir, true),
            Some(CardTarget::Image(index)) => viewer::show_modal(&app_cb, index),
            None => {}
        }
    })?;

    let app_cb = app.clone();
    listen(&app.el.folders, "click", move |event| {
        if let Some(CardTarget::Folder(dir)) = gallery::card_target_from_event(&event) {
            gallery::move_selected(&app_cb, dir);
        }
    })?;

    let app_cb = app.clone();
    listen(&app.el.folder_modal, "click", move |event| {
        if element_id(&event).as_deref() == Some("folderModal") {
            gallery::hide_folder_modal(&app_cb);
        }
    })?;

    let app_cb = app.clone();
    on_click(document, "deleteSelected", move |_| {
        gallery::delete_selected(&app_cb)
    })?;
    let app_cb = app.clone();
    on_click(document, "moveSelected", move |_| {
        gallery::show_folder_modal(&app_cb)
    })?;
    let app_cb = app.clone();
    on_click(document, "unselect", move |_| gallery::unselect(&app_cb))?;
    let app_cb = app.clone();
    on_click(document, "createFolder", move |_| {
        gallery::create_folder(&app_cb)
    })?;
    let app_cb = app.clone();
    on_click(document, "closeFolderModal", move |_| {
        gallery::hide_folder_modal(&app_cb)
    })?;
    let app_cb = app.clone();
    listen(&app.el.capture_button, "click", move |_| {
        gallery::capture(&app_cb, false)
    })?;
    let app_cb = app.clone();
    on_click(document, "captureOpen", move |_| {
        gallery::capture(&app_cb, true)
    })?;
    Ok(())
}

fn wire_viewer(app: &Rc<App>) -> Result<(), JsValue> {
    let document = &app.document;

    let app_cb = app.clone();
    on_click(document, "closeModal", move |_| viewer::hide_modal(&app_cb))?;
    let app_cb = app.clone();
    on_click(document, "prevImage", move |_| viewer::step(&app_cb, -1))?;
    let app_cb = app.clone();
    on_click(document, "nextImage", move |_| viewer::step(&app_cb, 1))?;
    let app_cb = app.clone();
    on_click(document, "drawToggle", move |_| {
        viewer::toggle_drawing(&app_cb, None)
    })?;
    let app_cb = app.clone();
    on_click(document, "deleteImage", move |_| viewer::remove_image(&app_cb))?;

    let app_cb = app.clone();
    listen(&app.el.pager, "click", move |event| {
        if let Some(CardTarget::Image(index)) = gallery::card_target_from_event(&event) {
            viewer::show_modal(&app_cb, index);
        }
    })?;

    let app_cb = app.clone();
    listen(&app.el.modal, "click", move |event| {
        let draw_mode = app_cb.state.borrow().draw_mode;
        match element_id(&event).as_deref() {
            Some("modal" | "imageContainer" | "modalImage") => viewer::toggle_ui(&app_cb),
            Some("mainCanvas") if !draw_mode => viewer::toggle_ui(&app_cb),
            _ => {}
        }
    })?;

    let app_cb = app.clone();
    listen(&app.el.image_container, "pointerdown", move |event| {
        if let Some(event) = event.dyn_ref::<PointerEvent>() {
            app_cb.state.borrow_mut().swipe_start =
                Some((event.client_x() as f64, event.client_y() as f64));
        }
    })?;

    let app_cb = app.clone();
    listen(&app.el.image_container, "pointerup", move |event| {
        let Some(event) = event.dyn_ref::<PointerEvent>() else {
            return;
        };
        let Some((start_x, start_y)) = app_cb.state.borrow_mut().swipe_start.take() else {
            return;
        };
        let dx = event.client_x() as f64 - start_x;
        let dy = event.client_y() as f64 - start_y;
        match swipe_direction(dx, dy) {
            Some(Swipe::Left) => viewer::step(&app_cb, 1),
            Some(Swipe::Right) => viewer::step(&app_cb, -1),
            None => {}
        }
    })?;
    Ok(())
}

fn wire_canvas(app: &Rc<App>) -> Result<(), JsValue> {
    let app_cb = app.clone();
    listen(&app.el.canvas, "pointermove", move |event| {
        if let Some(event) = event.dyn_ref::<PointerEvent>() {
            annotate::on_pointer_move(&app_cb, event);
        }
    })?;

    let app_cb = app.clone();
    listen(&app.el.canvas, "pointerleave", move |_| {
        annotate::on_pointer_leave(&app_cb)
    })?;

    let app_cb = app.clone();
    listen(&app.el.palette, "click", move |event| {
        if let Some(action) = palette_action_from_event(&event) {
            annotate::on_palette(&app_cb, action);
        }
    })
}

fn wire_window(app: &Rc<App>) -> Result<(), JsValue> {
    let app_cb = app.clone();
    listen(&app.window, "keydown", move |event| {
        let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        let folder_modal_open = is_shown(&app_cb.el.folder_modal);
        match event.key().as_str() {
            "Escape" if folder_modal_open => gallery::hide_folder_modal(&app_cb),
            "Escape" if viewer::is_open(&app_cb) => viewer::hide_modal(&app_cb),
            "Enter" if folder_modal_open => gallery::create_folder(&app_cb),
            "ArrowLeft" if viewer::is_open(&app_cb) => viewer::step(&app_cb, -1),
            "ArrowRight" if viewer::is_open(&app_cb) => viewer::step(&app_cb, 1),
            _ => {}
        }
    })?;

    let app_cb = app.clone();
    listen(&app.window, "popstate", move |_| {
        let dir = dir_from_location(&app_cb.window);
        gallery::select_dir(&app_cb, &dir, false);
    })?;

    let app_cb = app.clone();
    listen(&app.document, "visibilitychange", move |_| {
        if document_visibility_state(&app_cb.document).as_deref() == Some("visible") {
            viewer::reacquire_wake_lock(&app_cb);
        }
    })
}
