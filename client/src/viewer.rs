use std::rc::Rc;

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Element, ScrollBehavior, ScrollIntoViewOptions};

use inkgallery_shared::{decode_or_empty, DrawingRequest, PointStream};

use crate::annotate;
use crate::app::App;
use crate::dom::{is_shown, set_body_scroll, set_shown, toggle_class};
use crate::gallery;
use crate::net;
use crate::render::CanvasSurface;
use crate::state::UI_TIMEOUT_MS;
use crate::util::modulo;

pub fn show_modal(app: &Rc<App>, index: usize) {
    let image = {
        let mut state = app.state.borrow_mut();
        state.current_index = Some(index);
        match state.current_image() {
            Some(image) => image.clone(),
            None => return,
        }
    };
    acquire_wake_lock(app);

    set_shown(&app.el.modal, true);
    set_body_scroll(&app.document, false);
    app.el.modal_image.set_src(&image.file);
    app.el.canvas.set_width(image.dimensions.width);
    app.el.canvas.set_height(image.dimensions.height);
    load_drawing(app, image.drawing.as_deref());
    highlight_pager(app, index);
    show_ui(app);
}

pub fn hide_modal(app: &Rc<App>) {
    toggle_drawing(app, Some(false));
    release_wake_lock(app);
    set_shown(&app.el.modal, false);
    set_body_scroll(&app.document, true);
    {
        let mut state = app.state.borrow_mut();
        state.current_index = None;
        state.recorder.reset();
    }
    hide_ui(app);
}

pub fn is_open(app: &App) -> bool {
    is_shown(&app.el.modal)
}

/// Moves `delta` images along the current folder, wrapping at both ends.
pub fn step(app: &Rc<App>, delta: isize) {
    let target = {
        let state = app.state.borrow();
        if state.draw_mode {
            return;
        }
        let Some(index) = state.current_index else {
            return;
        };
        let count = state.view.images.len();
        if count == 0 {
            return;
        }
        modulo(index as isize + delta, count)
    };
    show_modal(app, target);
}

fn load_drawing(app: &Rc<App>, encoded: Option<&str>) {
    let points = encoded.map(decode_or_empty).unwrap_or_else(PointStream::new);
    {
        let mut state = app.state.borrow_mut();
        let mut surface = CanvasSurface::new(&app.el.canvas, &app.el.ctx);
        state.recorder.load(points, &mut surface);
    }
    annotate::refresh_controls(app);
}

/// Picks up a drawing changed by a refresh, unless it is being edited.
pub fn reload_drawing(app: &Rc<App>) {
    if !is_open(app) {
        return;
    }
    let drawing = {
        let state = app.state.borrow();
        if state.draw_mode {
            return;
        }
        match state.current_image() {
            Some(image) => image.drawing.clone(),
            None => return,
        }
    };
    load_drawing(app, drawing.as_deref());
}

fn highlight_pager(app: &App, index: usize) {
    let Ok(items) = app.el.pager.query_selector_all(".pagerWrapper") else {
        return;
    };
    for position in 0..items.length() {
        let Some(element) = items
            .item(position)
            .and_then(|node| node.dyn_into::<Element>().ok())
        else {
            continue;
        };
        let current = position as usize == index;
        toggle_class(&element, "current", current);
        if current {
            let options = ScrollIntoViewOptions::new();
            options.set_behavior(ScrollBehavior::Smooth);
            element.scroll_into_view_with_scroll_into_view_options(&options);
        }
    }
}

fn set_ui_hidden(app: &App, hidden: bool) {
    let Ok(nodes) = app.document.query_selector_all(".ui") else {
        return;
    };
    for position in 0..nodes.length() {
        if let Some(element) = nodes
            .item(position)
            .and_then(|node| node.dyn_into::<Element>().ok())
        {
            toggle_class(&element, "hidden", hidden);
        }
    }
}

fn clear_ui_timer(app: &App) -> bool {
    match app.state.borrow_mut().ui_timer.take() {
        Some(handle) => {
            app.window.clear_timeout_with_handle(handle);
            true
        }
        None => false,
    }
}

/// Reveals the modal controls and hides them again after a quiet period.
pub fn show_ui(app: &Rc<App>) {
    clear_ui_timer(app);
    set_ui_hidden(app, false);
    if app.state.borrow().draw_mode {
        return;
    }
    let app_cb = app.clone();
    let callback = Closure::once_into_js(move || hide_ui(&app_cb));
    let handle = app
        .window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            UI_TIMEOUT_MS,
        )
        .ok();
    app.state.borrow_mut().ui_timer = handle;
}

pub fn hide_ui(app: &App) {
    clear_ui_timer(app);
    set_ui_hidden(app, true);
}

pub fn toggle_ui(app: &Rc<App>) {
    if clear_ui_timer(app) {
        hide_ui(app);
    } else {
        show_ui(app);
    }
}

fn wake_lock_request(app: &App) -> Result<Promise, JsValue> {
    let navigator = app.window.navigator();
    let wake_lock = Reflect::get(navigator.as_ref(), &JsValue::from_str("wakeLock"))?;
    if wake_lock.is_undefined() {
        return Err(JsValue::from_str("Screen wake lock is not supported"));
    }
    let request: Function = Reflect::get(&wake_lock, &JsValue::from_str("request"))?.dyn_into()?;
    request
        .call1(&wake_lock, &JsValue::from_str("screen"))?
        .dyn_into::<Promise>()
}

/// Keeps the screen on while an image is open.
pub fn acquire_wake_lock(app: &Rc<App>) {
    if app.state.borrow().wake_lock.is_some() {
        return;
    }
    let promise = match wake_lock_request(app) {
        Ok(promise) => promise,
        Err(err) => {
            log::warn!("Wake lock unavailable: {err:?}");
            return;
        }
    };
    let app = app.clone();
    spawn_local(async move {
        match JsFuture::from(promise).await {
            Ok(sentinel) => app.state.borrow_mut().wake_lock = Some(sentinel),
            Err(err) => log::error!("Wake lock request failed: {err:?}"),
        }
    });
}

/// The browser drops the lock when the page is hidden; ask again on return.
pub fn reacquire_wake_lock(app: &Rc<App>) {
    if app.state.borrow_mut().wake_lock.take().is_some() {
        acquire_wake_lock(app);
    }
}

pub fn release_wake_lock(app: &App) {
    let Some(sentinel) = app.state.borrow_mut().wake_lock.take() else {
        return;
    };
    let released = Reflect::get(&sentinel, &JsValue::from_str("release"))
        .and_then(|release| release.dyn_into::<Function>())
        .and_then(|release| release.call0(&sentinel));
    if let Err(err) = released {
        log::error!("Releasing wake lock failed: {err:?}");
    }
}

/// Enters or leaves draw mode; `None` flips it. Leaving saves the drawing.
pub fn toggle_drawing(app: &Rc<App>, value: Option<bool>) {
    let (was, now) = {
        let mut state = app.state.borrow_mut();
        let was = state.draw_mode;
        state.draw_mode = value.unwrap_or(!was);
        (was, state.draw_mode)
    };

    set_shown(&app.el.palette_container, now);
    let style = app.el.canvas.style();
    let _ = style.set_property("cursor", if now { "none" } else { "unset" });
    let _ = style.set_property("touch-action", if now { "none" } else { "unset" });
    if now {
        hide_ui(app);
    } else {
        annotate::hide_cursor(app);
    }

    if was && !now {
        save_drawing(app);
        show_ui(app);
    }
    annotate::refresh_controls(app);
}

fn save_drawing(app: &Rc<App>) {
    let request = {
        let mut guard = app.state.borrow_mut();
        guard.save_epoch.bump();
        let state = &*guard;
        let Some(image) = state.current_image() else {
            return;
        };
        DrawingRequest {
            path: Some(image.rel.clone()),
            data: state.recorder.encoded(),
        }
    };
    let app = app.clone();
    spawn_local(async move {
        match net::post_drawing(&app.window, &request).await {
            Ok(listing) => gallery::apply_listing(&app, listing),
            Err(err) => log::error!("Saving drawing failed: {err:?}"),
        }
    });
}

/// Deletes the open image and steps back to its predecessor.
pub fn remove_image(app: &Rc<App>) {
    let (index, rel) = {
        let state = app.state.borrow();
        if state.draw_mode {
            return;
        }
        match (state.current_index, state.current_image()) {
            (Some(index), Some(image)) => (index, image.rel.clone()),
            _ => return,
        }
    };
    let confirmed = app
        .window
        .confirm_with_message("Are you sure you want to delete this file?")
        .unwrap_or(false);
    if !confirmed {
        return;
    }
    let app = app.clone();
    spawn_local(async move {
        match net::delete_images(&app.window, vec![rel]).await {
            Ok(listing) => {
                gallery::apply_listing(&app, listing);
                let count = app.state.borrow().view.images.len();
                if count == 0 {
                    hide_modal(&app);
                } else {
                    show_modal(&app, modulo(index as isize - 1, count));
                }
            }
            Err(err) => log::error!("Deleting image failed: {err:?}"),
        }
    });
}
