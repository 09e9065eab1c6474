use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use inkgallery_shared::{Dimensions, DrawingRequest, ImageEntry, ImageList, ROOT_DIR};
use tracing::{debug, error, info, warn};

use crate::capture::{capture_primary, screenshot_name_now};
use crate::error::GalleryError;
use crate::library::{created_at, drawing_key, Library};
use crate::state::AppState;
use crate::thumbs;

struct ScannedImage {
    path: PathBuf,
    key: String,
    created: DateTime<Utc>,
    dimensions: Dimensions,
}

fn scan_images(library: &Library, cached: &HashMap<PathBuf, Dimensions>) -> Vec<ScannedImage> {
    let mut scanned = Vec::new();
    for path in library.scan() {
        let Some(key) = library.key_of(&path) else {
            continue;
        };
        let dimensions = match cached.get(&path) {
            Some(dimensions) => *dimensions,
            None => match thumbs::dimensions(&path) {
                Ok(dimensions) => dimensions,
                Err(error) => {
                    warn!("Skipping {key}: {error}");
                    continue;
                }
            },
        };
        let created = match created_at(&path) {
            Ok(created) => created,
            Err(error) => {
                warn!("Skipping {key}: {error}");
                continue;
            }
        };
        scanned.push(ScannedImage {
            path,
            key,
            created,
            dimensions,
        });
    }
    scanned
}

fn dir_of(key: &str) -> String {
    match key.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => ROOT_DIR.to_string(),
    }
}

pub async fn build_listing(state: &AppState) -> Result<ImageList, GalleryError> {
    let library = state.library.clone();
    let cached = state.dimensions.read().await.clone();
    let scanned = tokio::task::spawn_blocking(move || scan_images(&library, &cached)).await?;

    {
        let mut cache = state.dimensions.write().await;
        for image in &scanned {
            cache.insert(image.path.clone(), image.dimensions);
        }
    }

    let drawings = state.drawings.read().await;
    let files = scanned
        .into_iter()
        .map(|image| ImageEntry {
            file: format!("/images/{}", image.key),
            thumb: format!("/thumbs/{}", image.key),
            dir: dir_of(&image.key),
            created: image.created,
            drawing: drawings.get(&image.key).cloned(),
            dimensions: image.dimensions,
            rel: image.key,
        })
        .collect();

    Ok(ImageList {
        files,
        write: state.write,
    })
}

/// Generates missing thumbnails and forgets drawings whose image is gone.
pub async fn refresh_thumbnails(state: &AppState) {
    let library = state.library.clone();
    let generated = tokio::task::spawn_blocking(move || {
        let mut generated = 0usize;
        for path in library.scan() {
            let Some(thumb) = library.thumb_path(&path) else {
                continue;
            };
            if thumb.exists() {
                continue;
            }
            info!(
                "Generating thumbnail for {}: {}",
                path.display(),
                thumb.display()
            );
            match thumbs::generate(&path, &thumb) {
                Ok(()) => generated += 1,
                Err(error) => error!("Thumbnail for {} failed: {error}", path.display()),
            }
        }
        generated
    })
    .await;
    match generated {
        Ok(0) => {}
        Ok(count) => debug!("Generated {count} thumbnails"),
        Err(error) => error!("Thumbnail task failed: {error}"),
    }

    let mut drawings = state.drawings.write().await;
    let library = &state.library;
    let removed = drawings.prune(|key| {
        library
            .resolve(key)
            .map(|path| path.exists())
            .unwrap_or(false)
    });
    if !removed.is_empty() {
        for key in &removed {
            info!("Removing missing drawing {key}");
        }
        state.storage.save(&drawings).await;
    }
}

pub async fn delete_images(state: &AppState, paths: &[String]) -> Result<(), GalleryError> {
    if paths.is_empty() {
        return Err(GalleryError::Forbidden("expected a list of paths to delete".into()));
    }

    let mut targets = Vec::with_capacity(paths.len());
    for rel in paths {
        let key = drawing_key(rel)?;
        let path = state.library.resolve(&key)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(GalleryError::Forbidden(format!("{rel} does not exist")));
        }
        targets.push((key, path));
    }

    let mut drawings = state.drawings.write().await;
    let mut drawings_changed = false;
    for (key, path) in &targets {
        info!("Removing file {}", path.display());
        if let Err(error) = tokio::fs::remove_file(path).await {
            error!("Failed to remove {}: {error}", path.display());
            continue;
        }
        if let Some(thumb) = state.library.thumb_path(path) {
            if let Err(error) = tokio::fs::remove_file(&thumb).await {
                debug!("No thumbnail removed for {key}: {error}");
            }
        }
        state.dimensions.write().await.remove(path);
        drawings_changed |= drawings.remove(key);
    }
    if drawings_changed {
        state.storage.save(&drawings).await;
    }
    Ok(())
}

pub async fn move_images(
    state: &AppState,
    paths: &[String],
    destination: &str,
) -> Result<(), GalleryError> {
    let destination_dir = state.library.resolve(destination)?;
    let destination_key = drawing_key(destination).ok();

    let mut moves = Vec::with_capacity(paths.len());
    for rel in paths {
        let key = drawing_key(rel)?;
        let source = state.library.resolve(&key)?;
        let name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| GalleryError::BadRequest(format!("{rel} has no file name")))?;
        let target_key = match &destination_key {
            Some(dir) => format!("{dir}/{name}"),
            None => name.clone(),
        };
        moves.push((key, source, destination_dir.join(&name), target_key));
    }

    if !moves.is_empty() && !tokio::fs::try_exists(&destination_dir).await.unwrap_or(false) {
        info!(
            "Destination does not exist, making new directory {}",
            destination_dir.display()
        );
        tokio::fs::create_dir_all(&destination_dir).await?;
    }

    let mut drawings = state.drawings.write().await;
    for (key, source, target, target_key) in moves {
        info!("Moving {} to {}", source.display(), target.display());
        tokio::fs::rename(&source, &target).await?;

        if let (Some(old_thumb), Some(new_thumb)) = (
            state.library.thumb_path(&source),
            state.library.thumb_path(&target),
        ) {
            if let Some(parent) = new_thumb.parent() {
                if let Err(error) = tokio::fs::create_dir_all(parent).await {
                    debug!("Thumbnail dir {} not created: {error}", parent.display());
                }
            }
            if let Err(error) = tokio::fs::rename(&old_thumb, &new_thumb).await {
                debug!("Thumbnail for {key} not moved: {error}");
            }
        }
        {
            let mut cache = state.dimensions.write().await;
            if let Some(dimensions) = cache.remove(&source) {
                cache.insert(target, dimensions);
            }
        }

        if drawings.rename(&key, target_key) {
            state.storage.save(&drawings).await;
        }
    }
    Ok(())
}

pub async fn store_drawing(state: &AppState, request: DrawingRequest) -> Result<(), GalleryError> {
    let rel = request
        .path
        .filter(|path| !path.is_empty())
        .ok_or_else(|| GalleryError::BadRequest("drawing is missing its image path".into()))?;
    let key = drawing_key(&rel)?;

    let mut drawings = state.drawings.write().await;
    match request.data.filter(|data| !data.is_empty()) {
        Some(data) => {
            let image = state.library.resolve(&key)?;
            if !tokio::fs::try_exists(&image).await.unwrap_or(false) {
                return Err(GalleryError::NotFound(format!("no image at {key}")));
            }
            match inkgallery_shared::decode(&data) {
                Ok(points) => debug!("Storing drawing for {key} ({} points)", points.len()),
                Err(error) => warn!("Storing unreadable drawing for {key}: {error}"),
            }
            drawings.set(key, data);
        }
        None => {
            if drawings.remove(&key) {
                debug!("Removed drawing for {key}");
            }
        }
    }
    state.storage.save(&drawings).await;
    Ok(())
}

pub async fn capture_screenshot(state: &AppState, current_dir: &str) -> Result<(), GalleryError> {
    let dir = state.library.resolve(current_dir)?;
    let target = dir.join(screenshot_name_now());
    info!("Taking screenshot {}", target.display());
    tokio::task::spawn_blocking(move || capture_primary(&target)).await??;
    refresh_thumbnails(state).await;
    Ok(())
}
