use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use inkgallery_shared::Dimensions;
use tokio::sync::RwLock;

use crate::library::Library;
use crate::storage::{DrawingData, Storage};

#[derive(Clone)]
pub struct AppState {
    pub library: Arc<Library>,
    pub write: bool,
    pub storage: Arc<dyn Storage>,
    pub drawings: Arc<RwLock<DrawingData>>,
    pub dimensions: Arc<RwLock<HashMap<PathBuf, Dimensions>>>,
}

impl AppState {
    pub fn new(library: Library, write: bool, storage: Arc<dyn Storage>, drawings: DrawingData) -> Self {
        Self {
            library: Arc::new(library),
            write,
            storage,
            drawings: Arc::new(RwLock::new(drawings)),
            dimensions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}
