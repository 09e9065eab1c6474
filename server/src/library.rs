use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::GalleryError;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// The served folder and the directory its thumbnails are mirrored into.
#[derive(Clone, Debug)]
pub struct Library {
    root: PathBuf,
    thumb_dir: PathBuf,
}

impl Library {
    pub fn new(root: PathBuf, thumb_dir: PathBuf) -> Self {
        Self { root, thumb_dir }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn thumb_dir(&self) -> &Path {
        &self.thumb_dir
    }

    /// Joins a client supplied relative path onto the served folder.
    /// Anything that could leave the folder is refused.
    pub fn resolve(&self, rel: &str) -> Result<PathBuf, GalleryError> {
        Ok(self.root.join(normalize_relative(rel)?))
    }

    /// `/`-separated key of an image relative to the served folder.
    pub fn key_of(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    pub fn thumb_path(&self, image: &Path) -> Option<PathBuf> {
        let relative = image.strip_prefix(&self.root).ok()?;
        Some(self.thumb_dir.join(relative))
    }

    /// Every image below the served folder, in directory walk order.
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(error) => {
                    tracing::warn!("Skipping unreadable directory {}: {error}", dir.display());
                    continue;
                }
            };
            let mut entries: Vec<_> = entries.filter_map(Result::ok).collect();
            entries.sort_by_key(|entry| entry.file_name());
            for entry in entries {
                let path = entry.path();
                match entry.file_type() {
                    Ok(kind) if kind.is_dir() => pending.push(path),
                    Ok(_) if is_image(&path) => found.push(path),
                    _ => {}
                }
            }
        }
        found
    }
}

/// Validates a relative path and returns it as a `/`-separated key.
pub fn drawing_key(rel: &str) -> Result<String, GalleryError> {
    let normalized = normalize_relative(rel)?;
    let parts: Vec<_> = normalized
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect();
    if parts.is_empty() {
        return Err(GalleryError::BadRequest(format!("empty image path {rel:?}")));
    }
    Ok(parts.join("/"))
}

fn normalize_relative(rel: &str) -> Result<PathBuf, GalleryError> {
    let unified = rel.replace('\\', "/");
    let mut normalized = PathBuf::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(GalleryError::Forbidden(format!(
                    "path leaves the served folder: {rel}"
                )));
            }
        }
    }
    Ok(normalized)
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Creation time where the filesystem records one, modification time otherwise.
pub fn created_at(path: &Path) -> Result<DateTime<Utc>, GalleryError> {
    let metadata = std::fs::metadata(path)?;
    let time = metadata.created().or_else(|_| metadata.modified())?;
    Ok(DateTime::<Utc>::from(time))
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix('~') {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}
