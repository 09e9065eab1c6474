use std::rc::Rc;

use web_sys::PointerEvent;

use inkgallery_shared::{Cursor, MoveOutcome, PointerKind, PointerSample, SurfaceScale};

use crate::app::App;
use crate::dom::set_enabled;
use crate::palette::{
    action_button, color_at, highlight, index_of, render_palette, PaletteAction,
    COLOR_STORAGE_KEY, DEFAULT_COLOR,
};
use crate::render::CanvasSurface;
use crate::viewer;

const DEFAULT_SLIDER: f64 = 2.0;

/// Color index remembered from an earlier visit.
pub fn stored_color(window: &web_sys::Window) -> usize {
    window
        .local_storage()
        .ok()
        .flatten()
        .and_then(|storage| storage.get_item(COLOR_STORAGE_KEY).ok().flatten())
        .and_then(|value| index_of(&value))
        .unwrap_or(DEFAULT_COLOR)
}

pub fn init_palette(app: &App) {
    let selected = app.state.borrow().color_index;
    render_palette(&app.document, &app.el.palette, selected);
    refresh_controls(app);
}

fn sample_from_event(event: &PointerEvent) -> PointerSample {
    PointerSample {
        primary: event.is_primary(),
        kind: PointerKind::from_pointer_type(&event.pointer_type()),
        pressure: event.pressure() as f64,
        buttons: event.buttons(),
        offset_x: event.offset_x() as f64,
        offset_y: event.offset_y() as f64,
        timestamp_ms: js_sys::Date::now(),
    }
}

pub fn on_pointer_move(app: &App, event: &PointerEvent) {
    let outcome = {
        let mut state = app.state.borrow_mut();
        if !state.draw_mode {
            return;
        }
        let Some(dimensions) = state.current_image().map(|image| image.dimensions) else {
            return;
        };
        let rect = app.el.canvas.get_bounding_client_rect();
        let scale = SurfaceScale::new(
            dimensions.width as f64,
            dimensions.height as f64,
            rect.width(),
            rect.height(),
        );
        let slider = app
            .el
            .size_slider
            .value()
            .parse::<f64>()
            .unwrap_or(DEFAULT_SLIDER);
        state
            .recorder
            .set_size_context(dimensions.width as f64, slider);

        let sample = sample_from_event(event);
        let mut surface = CanvasSurface::new(&app.el.canvas, &app.el.ctx);
        state.recorder.pointer_move(&sample, scale, &mut surface)
    };

    let cursor = match outcome {
        MoveOutcome::Ignored => return,
        MoveOutcome::Hover(cursor) | MoveOutcome::Drawing(cursor) => cursor,
        MoveOutcome::Finished(cursor) => {
            refresh_controls(app);
            cursor
        }
    };
    place_cursor(app, cursor, event.page_x() as f64, event.page_y() as f64);
    update_stats(app);
}

pub fn on_pointer_leave(app: &App) {
    let finished = app.state.borrow_mut().recorder.pointer_leave();
    hide_cursor(app);
    if finished {
        refresh_controls(app);
    }
}

fn place_cursor(app: &App, cursor: Cursor, page_x: f64, page_y: f64) {
    let color = {
        let state = app.state.borrow();
        if cursor.eraser {
            "black".to_string()
        } else {
            state.recorder.color().as_str().to_string()
        }
    };
    let style = app.el.cursor.style();
    let half = cursor.size / 2.0;
    let _ = style.set_property(
        "transform",
        &format!("translate({}px, {}px)", page_x - half, page_y - half),
    );
    let _ = style.set_property("width", &format!("{}px", cursor.size));
    let _ = style.set_property("height", &format!("{}px", cursor.size));
    let _ = style.set_property("outline-color", &color);
    let _ = style.set_property("opacity", "1");
}

/// Only opacity changes; the cursor must stay transparent to pointer events.
pub fn hide_cursor(app: &App) {
    let _ = app.el.cursor.style().set_property("opacity", "0");
}

fn update_stats(app: &App) {
    let stats = app.state.borrow().recorder.stats();
    app.el.stats.set_text_content(Some(stats.to_string().as_str()));
}

/// Syncs the undo and revert buttons and the stats readout with the recorder.
pub fn refresh_controls(app: &App) {
    let (can_undo, can_revert) = {
        let state = app.state.borrow();
        (state.recorder.can_undo(), state.recorder.can_revert())
    };
    if let Some(button) = action_button(&app.el.palette, "undo") {
        set_enabled(&button, can_undo);
    }
    if let Some(button) = action_button(&app.el.palette, "revert") {
        set_enabled(&button, can_revert);
    }
    update_stats(app);
}

fn confirm(app: &App, message: &str) -> bool {
    app.window
        .confirm_with_message(message)
        .unwrap_or(false)
}

pub fn on_palette(app: &Rc<App>, action: PaletteAction) {
    match action {
        PaletteAction::Select(index) => select_color(app, index),
        PaletteAction::Undo => {
            let mut state = app.state.borrow_mut();
            let mut surface = CanvasSurface::new(&app.el.canvas, &app.el.ctx);
            state.recorder.undo(&mut surface);
        }
        PaletteAction::Clear => {
            if !confirm(app, "Are you sure you want to clear the drawing?") {
                return;
            }
            let mut state = app.state.borrow_mut();
            let mut surface = CanvasSurface::new(&app.el.canvas, &app.el.ctx);
            state.recorder.clear(&mut surface);
        }
        PaletteAction::Revert => {
            if !confirm(app, "Are you sure you want to revert the drawing?") {
                return;
            }
            let mut state = app.state.borrow_mut();
            let mut surface = CanvasSurface::new(&app.el.canvas, &app.el.ctx);
            state.recorder.revert(&mut surface);
        }
        PaletteAction::Save => {
            viewer::toggle_drawing(app, Some(false));
            return;
        }
    }
    refresh_controls(app);
}

fn select_color(app: &App, index: usize) {
    let color = color_at(index);
    {
        let mut state = app.state.borrow_mut();
        state.color_index = index;
        state.recorder.set_color(color.clone());
    }
    highlight(&app.el.palette, index);
    let stored = app
        .window
        .local_storage()
        .ok()
        .flatten()
        .map(|storage| storage.set_item(COLOR_STORAGE_KEY, color.as_str()));
    if let Some(Err(err)) = stored {
        log::warn!("Storing color failed: {err:?}");
    }
}
