use std::path::Path;

use chrono::{DateTime, Local, TimeZone};

use crate::error::GalleryError;

/// `Screenshot 03_09_2024 14_05_09 PM.png`: 24-hour clock with an AM/PM suffix.
pub fn screenshot_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("Screenshot {}.png", at.format("%m_%d_%Y %H_%M_%S %p"))
}

pub fn screenshot_name_now() -> String {
    screenshot_name(&Local::now())
}

#[cfg(feature = "capture")]
pub fn capture_primary(target: &Path) -> Result<(), GalleryError> {
    let monitors = xcap::Monitor::all().map_err(|error| GalleryError::Capture(error.to_string()))?;
    let monitor = monitors
        .first()
        .ok_or_else(|| GalleryError::Capture("no monitor found".into()))?;
    let image = monitor
        .capture_image()
        .map_err(|error| GalleryError::Capture(error.to_string()))?;
    image
        .save(target)
        .map_err(|error| GalleryError::Capture(error.to_string()))
}

#[cfg(not(feature = "capture"))]
pub fn capture_primary(target: &Path) -> Result<(), GalleryError> {
    tracing::warn!(
        "Cannot capture {}: built without the capture feature",
        target.display()
    );
    Err(GalleryError::CaptureUnavailable)
}
