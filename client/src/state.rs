use wasm_bindgen::JsValue;
use web_sys::{
    CanvasRenderingContext2d, HtmlButtonElement, HtmlCanvasElement, HtmlElement, HtmlImageElement,
    HtmlInputElement,
};

use inkgallery_shared::{FolderView, ImageEntry, ImageList, Recorder, ROOT_DIR};

use crate::palette::color_at;

pub const REFRESH_INTERVAL_MS: i32 = 60 * 1000;
pub const UI_TIMEOUT_MS: i32 = 5000;

/// Elements of `index.html` the app drives, looked up once at start.
pub struct Elements {
    pub real_root: HtmlElement,
    pub cards: HtmlElement,
    pub selection_buttons: HtmlElement,
    pub simple_buttons: HtmlElement,
    pub capture_button: HtmlButtonElement,
    pub folder_modal: HtmlElement,
    pub folders: HtmlElement,
    pub folder_name: HtmlInputElement,
    pub modal: HtmlElement,
    pub image_container: HtmlElement,
    pub modal_image: HtmlImageElement,
    pub pager: HtmlElement,
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub palette_container: HtmlElement,
    pub palette: HtmlElement,
    pub size_slider: HtmlInputElement,
    pub cursor: HtmlElement,
    pub stats: HtmlElement,
}

/// Orders background listing refreshes against drawing saves.
/// A refresh requested before the latest save went out carries the old
/// drawing and must not replace what the save returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveEpoch(u32);

impl SaveEpoch {
    pub fn ticket(&self) -> u32 {
        self.0
    }

    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    pub fn is_current(&self, ticket: u32) -> bool {
        self.0 == ticket
    }
}

pub struct State {
    pub listing: ImageList,
    pub view: FolderView,
    pub current_dir: String,
    pub current_index: Option<usize>,
    pub draw_mode: bool,
    pub color_index: usize,
    pub recorder: Recorder,
    pub refresh_timer: Option<i32>,
    pub ui_timer: Option<i32>,
    pub wake_lock: Option<JsValue>,
    pub swipe_start: Option<(f64, f64)>,
    pub save_epoch: SaveEpoch,
}

impl State {
    pub fn new(color_index: usize) -> Self {
        Self {
            listing: ImageList::default(),
            view: FolderView::default(),
            current_dir: ROOT_DIR.to_string(),
            current_index: None,
            draw_mode: false,
            color_index,
            recorder: Recorder::new(color_at(color_index)),
            refresh_timer: None,
            ui_timer: None,
            wake_lock: None,
            swipe_start: None,
            save_epoch: SaveEpoch::default(),
        }
    }

    pub fn current_image(&self) -> Option<&ImageEntry> {
        self.current_index
            .and_then(|index| self.view.images.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_sent_before_a_save_is_stale() {
        let mut epoch = SaveEpoch::default();
        let refresh = epoch.ticket();
        assert!(epoch.is_current(refresh));

        epoch.bump();
        assert!(!epoch.is_current(refresh));
        assert!(epoch.is_current(epoch.ticket()));
    }

    #[test]
    fn epoch_wraps() {
        let mut epoch = SaveEpoch(u32::MAX);
        epoch.bump();
        assert_eq!(epoch.ticket(), 0);
    }
}
