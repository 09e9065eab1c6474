use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use inkgallery_shared::Dimensions;

use crate::error::GalleryError;

pub const THUMB_WIDTH: u32 = 300;

/// Writes a JPEG thumbnail `THUMB_WIDTH` pixels wide, keeping the aspect ratio.
/// The target keeps the source's file name so `/thumbs/<rel>` mirrors `/images/<rel>`.
pub fn generate(source: &Path, target: &Path) -> Result<(), GalleryError> {
    let image = reader(source)?.decode()?;
    let height = scaled_height(image.width(), image.height());
    let thumb = image.resize_exact(THUMB_WIDTH, height, FilterType::Triangle);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    DynamicImage::ImageRgb8(thumb.to_rgb8()).save_with_format(target, ImageFormat::Jpeg)?;
    Ok(())
}

pub fn dimensions(path: &Path) -> Result<Dimensions, GalleryError> {
    let (width, height) = reader(path)?.into_dimensions()?;
    Ok(Dimensions { width, height })
}

/// Picks the decoder from the file's leading bytes, not its extension.
fn reader(path: &Path) -> Result<ImageReader<BufReader<File>>, GalleryError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

fn scaled_height(width: u32, height: u32) -> u32 {
    if width == 0 {
        return 1;
    }
    let scaled = (height as f64 * THUMB_WIDTH as f64 / width as f64).round() as u32;
    scaled.max(1)
}
