use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The listing root; also the `dir` of images directly inside the served folder.
pub const ROOT_DIR: &str = ".";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// URL of the full image, `/images/<rel>`.
    pub file: String,
    /// URL of the thumbnail, `/thumbs/<rel>`.
    pub thumb: String,
    /// Path relative to the served folder, always `/` separated.
    pub rel: String,
    pub dir: String,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawing: Option<String>,
    pub dimensions: Dimensions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageList {
    pub files: Vec<ImageEntry>,
    pub write: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawingRequest {
    #[serde(default)]
    pub path: Option<String>,
    /// Compressed point stream; absent removes the stored drawing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(default)]
    pub paths: Vec<String>,
    pub destination: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureRequest {
    #[serde(rename = "currentDir", default = "root_dir")]
    pub current_dir: String,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            current_dir: root_dir(),
        }
    }
}

fn root_dir() -> String {
    ROOT_DIR.to_string()
}

/// A folder card: where it leads and what it is called.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderLink {
    pub path: String,
    pub label: String,
}

/// One folder's worth of a flat listing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FolderView {
    pub parent: Option<FolderLink>,
    pub dirs: Vec<FolderLink>,
    pub images: Vec<ImageEntry>,
}

impl FolderView {
    pub fn build(files: &[ImageEntry], current_dir: &str) -> Self {
        let current = normalize_dir(current_dir);
        let prefix = format!("{current}/");

        let mut dirs = BTreeSet::new();
        let mut images = Vec::new();
        for entry in files {
            let dir = normalize_dir(&entry.dir);
            if dir == current {
                images.push(entry.clone());
                continue;
            }
            if current == ROOT_DIR {
                if let Some(first) = dir.split('/').next() {
                    dirs.insert(first.to_string());
                }
            } else if let Some(rest) = dir.strip_prefix(&prefix) {
                if let Some(child) = rest.split('/').next().filter(|child| !child.is_empty()) {
                    dirs.insert(format!("{prefix}{child}"));
                }
            }
        }
        images.sort_by_key(|entry| entry.created);

        let dirs = dirs
            .into_iter()
            .map(|path| FolderLink {
                label: path.strip_prefix(&prefix).unwrap_or(&path).to_string(),
                path,
            })
            .collect();

        Self {
            parent: parent_dir(&current).map(|path| FolderLink {
                path,
                label: "../".to_string(),
            }),
            dirs,
            images,
        }
    }

    /// Parent link followed by the sub-folders, as offered by "move to folder".
    pub fn links(&self) -> impl Iterator<Item = &FolderLink> {
        self.parent.iter().chain(self.dirs.iter())
    }
}

/// `current/name`, or just `name` at the root.
pub fn child_dir(current_dir: &str, name: &str) -> String {
    let current = normalize_dir(current_dir);
    let name = name.trim_matches('/');
    if current == ROOT_DIR {
        name.to_string()
    } else {
        format!("{current}/{name}")
    }
}

pub fn parent_dir(dir: &str) -> Option<String> {
    let dir = normalize_dir(dir);
    if dir == ROOT_DIR {
        return None;
    }
    match dir.rsplit_once('/') {
        Some((parent, _)) => Some(parent.to_string()),
        None => Some(ROOT_DIR.to_string()),
    }
}

fn normalize_dir(dir: &str) -> String {
    let cleaned: Vec<&str> = dir
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();
    if cleaned.is_empty() {
        ROOT_DIR.to_string()
    } else {
        cleaned.join("/")
    }
}
