mod annotate;
mod app;
mod dom;
mod gallery;
mod net;
mod palette;
mod render;
mod state;
mod util;
mod viewer;

pub use app::run;
