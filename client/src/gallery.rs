use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, Event, HtmlElement, HtmlInputElement};

use inkgallery_shared::{child_dir, FolderLink, FolderView, ImageEntry, ImageList};

use crate::app::App;
use crate::dom::{
    card_checkboxes, create, folder_icon, set_display, set_enabled, set_shown, thumbnail,
    toggle_class,
};
use crate::net;
use crate::render::drawing_overlay;
use crate::state::REFRESH_INTERVAL_MS;
use crate::viewer;

/// What a click inside the card grid, pager or folder picker landed on.
pub enum CardTarget {
    Image(usize),
    Folder(String),
    Checkbox,
}

pub fn card_target_from_event(event: &Event) -> Option<CardTarget> {
    let mut current = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok());
    while let Some(element) = current {
        if element.dyn_ref::<HtmlInputElement>().is_some() {
            return Some(CardTarget::Checkbox);
        }
        if let Some(dir) = element.get_attribute("data-dir") {
            return Some(CardTarget::Folder(dir));
        }
        if let Some(index) = element.get_attribute("data-index") {
            return index.parse::<usize>().ok().map(CardTarget::Image);
        }
        current = element.parent_element();
    }
    None
}

/// Fetches the listing now and schedules the next periodic refresh.
pub fn update_images(app: &Rc<App>) {
    schedule_refresh(app);
    let ticket = app.state.borrow().save_epoch.ticket();
    let app = app.clone();
    spawn_local(async move {
        match net::fetch_listing(&app.window).await {
            Ok(listing) if app.state.borrow().save_epoch.is_current(ticket) => {
                apply_listing(&app, listing)
            }
            Ok(_) => log::debug!("Dropping image list requested before the last save"),
            Err(err) => log::error!("Loading image list failed: {err:?}"),
        }
    });
}

fn schedule_refresh(app: &Rc<App>) {
    let mut state = app.state.borrow_mut();
    if let Some(handle) = state.refresh_timer.take() {
        app.window.clear_timeout_with_handle(handle);
    }
    let app_cb = app.clone();
    let callback = Closure::once_into_js(move || update_images(&app_cb));
    state.refresh_timer = app
        .window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            REFRESH_INTERVAL_MS,
        )
        .ok();
}

/// Replaces the listing, re-renders the current folder and keeps the checked cards checked.
pub fn apply_listing(app: &Rc<App>, listing: ImageList) {
    let selected = selected_indices(app);
    {
        let mut guard = app.state.borrow_mut();
        let state = &mut *guard;
        state.view = FolderView::build(&listing.files, &state.current_dir);
        state.listing = listing;
        if state
            .current_index
            .is_some_and(|index| index >= state.view.images.len())
        {
            state.current_index = state.view.images.len().checked_sub(1);
        }
    }
    if let Err(err) = render(app, &selected) {
        log::error!("Rendering image list failed: {err:?}");
    }
    viewer::reload_drawing(app);
    update_checkboxes(app);
}

fn render(app: &Rc<App>, selected: &[usize]) -> Result<(), JsValue> {
    let document = &app.document;
    let state = app.state.borrow();
    let el = &app.el;

    el.cards.set_inner_html("");
    el.pager.set_inner_html("");
    el.folders.set_inner_html("");
    toggle_class(&el.real_root, "write", state.listing.write);

    for link in state.view.links() {
        el.cards.append_child(&folder_card(app, link)?.into())?;
        el.folders.append_child(&folder_item(app, link)?.into())?;
    }
    for (index, image) in state.view.images.iter().enumerate() {
        el.cards
            .append_child(&image_card(app, index, image, selected.contains(&index))?.into())?;
        el.pager.append_child(&pager_item(app, index, image)?.into())?;
    }
    if state.view.images.is_empty() && state.view.dirs.is_empty() {
        let empty: HtmlElement = create(document, "div", "empty")?;
        empty.set_text_content(Some("No images in this folder"));
        el.cards.append_child(&empty)?;
    }
    Ok(())
}

fn folder_card(app: &App, link: &FolderLink) -> Result<HtmlElement, JsValue> {
    let card: HtmlElement = create(&app.document, "div", "card folder")?;
    card.set_attribute("data-dir", &link.path)?;
    card.append_child(&folder_icon(&app.document)?.into())?;
    let label: HtmlElement = create(&app.document, "div", "label")?;
    label.set_text_content(Some(link.label.as_str()));
    card.append_child(&label)?;
    Ok(card)
}

fn folder_item(app: &App, link: &FolderLink) -> Result<HtmlElement, JsValue> {
    let item: HtmlElement = create(&app.document, "div", "dir")?;
    item.set_attribute("data-dir", &link.path)?;
    item.append_child(&folder_icon(&app.document)?.into())?;
    let label: HtmlElement = create(&app.document, "span", "")?;
    label.set_text_content(Some(link.label.as_str()));
    item.append_child(&label)?;
    Ok(item)
}

fn image_card(
    app: &App,
    index: usize,
    image: &ImageEntry,
    checked: bool,
) -> Result<HtmlElement, JsValue> {
    let card: HtmlElement = create(&app.document, "div", "card")?;
    card.set_attribute("data-index", &index.to_string())?;
    card.append_child(&thumbnail(&app.document, &image.thumb)?.into())?;
    if let Some(drawing) = &image.drawing {
        card.append_child(&drawing_overlay(&app.document, image.dimensions, drawing)?.into())?;
    }
    let checkbox: HtmlInputElement = create(&app.document, "input", "")?;
    checkbox.set_type("checkbox");
    checkbox.set_checked(checked);
    card.append_child(&checkbox)?;
    Ok(card)
}

fn pager_item(app: &App, index: usize, image: &ImageEntry) -> Result<HtmlElement, JsValue> {
    let wrapper: HtmlElement = create(&app.document, "div", "pagerWrapper")?;
    wrapper.set_attribute("data-index", &index.to_string())?;
    wrapper.append_child(&thumbnail(&app.document, &image.thumb)?.into())?;
    if let Some(drawing) = &image.drawing {
        wrapper.append_child(&drawing_overlay(&app.document, image.dimensions, drawing)?.into())?;
    }
    Ok(wrapper)
}

pub fn selected_indices(app: &App) -> Vec<usize> {
    card_checkboxes(&app.el.cards)
        .iter()
        .enumerate()
        .filter(|(_, checkbox)| checkbox.checked())
        .map(|(index, _)| index)
        .collect()
}

fn selected_paths(app: &App) -> Vec<String> {
    let state = app.state.borrow();
    selected_indices(app)
        .into_iter()
        .filter_map(|index| state.view.images.get(index))
        .map(|image| image.rel.clone())
        .collect()
}

/// Swaps the toolbar between the plain and the selection buttons.
pub fn update_checkboxes(app: &App) {
    let any = card_checkboxes(&app.el.cards)
        .iter()
        .any(|checkbox| checkbox.checked());
    set_display(&app.el.selection_buttons, if any { "flex" } else { "none" });
    set_display(&app.el.simple_buttons, if any { "none" } else { "flex" });
}

pub fn unselect(app: &App) {
    for checkbox in card_checkboxes(&app.el.cards) {
        checkbox.set_checked(false);
    }
    update_checkboxes(app);
}

pub fn select_dir(app: &Rc<App>, dir: &str, push_history: bool) {
    app.state.borrow_mut().current_dir = dir.to_string();
    if push_history {
        let url = format!(
            "?currentDir={}",
            String::from(js_sys::encode_uri_component(dir))
        );
        let pushed = app
            .window
            .history()
            .and_then(|history| history.push_state_with_url(&JsValue::NULL, "", Some(&url)));
        if let Err(err) = pushed {
            log::warn!("Updating history failed: {err:?}");
        }
    }
    unselect(app);
    update_images(app);
}

fn confirm(app: &App, message: &str) -> bool {
    app.window
        .confirm_with_message(message)
        .unwrap_or(false)
}

pub fn delete_selected(app: &Rc<App>) {
    let paths = selected_paths(app);
    if paths.is_empty() {
        return;
    }
    let plural = if paths.len() == 1 { "" } else { "s" };
    if !confirm(app, &format!("Are you sure you want to delete {} file{plural}?", paths.len())) {
        return;
    }
    unselect(app);
    let app = app.clone();
    spawn_local(async move {
        match net::delete_images(&app.window, paths).await {
            Ok(listing) => apply_listing(&app, listing),
            Err(err) => log::error!("Deleting images failed: {err:?}"),
        }
    });
}

pub fn move_selected(app: &Rc<App>, destination: String) {
    let paths = selected_paths(app);
    hide_folder_modal(app);
    if paths.is_empty() {
        return;
    }
    unselect(app);
    let app = app.clone();
    spawn_local(async move {
        match net::move_images(&app.window, paths, destination).await {
            Ok(listing) => apply_listing(&app, listing),
            Err(err) => log::error!("Moving images failed: {err:?}"),
        }
    });
}

/// Moves the selection into a new sub-folder named in the folder picker.
pub fn create_folder(app: &Rc<App>) {
    let name = app.el.folder_name.value();
    let name = name.trim();
    if name.is_empty() {
        return;
    }
    let destination = child_dir(&app.state.borrow().current_dir, name);
    app.el.folder_name.set_value("");
    move_selected(app, destination);
}

pub fn show_folder_modal(app: &App) {
    set_shown(&app.el.folder_modal, true);
    let _ = app.el.folder_name.focus();
}

pub fn hide_folder_modal(app: &App) {
    set_shown(&app.el.folder_modal, false);
}

/// Asks the server for a screenshot, optionally opening it once listed.
pub fn capture(app: &Rc<App>, focus_new: bool) {
    set_enabled(&app.el.capture_button, false);
    let current_dir = app.state.borrow().current_dir.clone();
    let app = app.clone();
    spawn_local(async move {
        let result = net::capture(&app.window, current_dir).await;
        set_enabled(&app.el.capture_button, true);
        match result {
            Ok(listing) => {
                apply_listing(&app, listing);
                let count = app.state.borrow().view.images.len();
                if focus_new && count > 0 {
                    viewer::show_modal(&app, count - 1);
                }
            }
            Err(err) => log::error!("Capturing screenshot failed: {err:?}"),
        }
    });
}
