/// A recorded coordinate on the full-resolution drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

pub fn lerp(v0: f64, v1: f64, t: f64) -> f64 {
    v0 * (1.0 - t) + v1 * t
}

/// Evenly spaced dab centers from `from` towards `to`, excluding `to` itself.
pub fn dab_centers(from: Position, to: Position, steps: usize) -> impl Iterator<Item = (f64, f64)> {
    (0..steps).map(move |index| {
        let t = index as f64 / steps as f64;
        (
            lerp(from.x as f64, to.x as f64, t),
            lerp(from.y as f64, to.y as f64, t),
        )
    })
}

/// Ratio between the logical image resolution and the size the surface is displayed at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceScale {
    pub x_ratio: f64,
    pub y_ratio: f64,
}

impl SurfaceScale {
    pub const IDENTITY: SurfaceScale = SurfaceScale {
        x_ratio: 1.0,
        y_ratio: 1.0,
    };

    pub fn new(logical_width: f64, logical_height: f64, visual_width: f64, visual_height: f64) -> Self {
        Self {
            x_ratio: axis_ratio(logical_width, visual_width),
            y_ratio: axis_ratio(logical_height, visual_height),
        }
    }

    pub fn map(&self, offset_x: f64, offset_y: f64) -> Position {
        Position {
            x: (offset_x * self.x_ratio).floor() as i32,
            y: (offset_y * self.y_ratio).floor() as i32,
        }
    }

    pub fn average(&self) -> f64 {
        (self.x_ratio + self.y_ratio) / 2.0
    }
}

impl Default for SurfaceScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn axis_ratio(logical: f64, visual: f64) -> f64 {
    if visual > 0.0 && logical > 0.0 && visual.is_finite() && logical.is_finite() {
        logical / visual
    } else {
        1.0
    }
}
