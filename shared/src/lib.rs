use std::fmt;

use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

mod codec;
pub mod geometry;
pub mod history;
pub mod listing;
pub mod recorder;
pub mod render;

pub use codec::{
    decode, decode_or_empty, encode, CodecError, CompressionStats, Compressor, LzUtf16, PointCodec,
};
pub use geometry::{lerp, Position, SurfaceScale};
pub use history::{History, Undo, HISTORY_LIMIT};
pub use listing::{
    child_dir, parent_dir, CaptureRequest, DeleteRequest, Dimensions, DrawingRequest, FolderLink,
    FolderView, ImageEntry, ImageList, MoveRequest, ROOT_DIR,
};
pub use recorder::{Cursor, MoveOutcome, PointerKind, PointerSample, PressureProfile, Recorder};
pub use render::{draw_step, replay, replay_encoded, Surface, Tools};

const ERASER: &str = "transparent";

/// A stroke color as stored in the point stream. `transparent` selects the eraser.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorId(String);

impl ColorId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn eraser() -> Self {
        Self(ERASER.to_string())
    }

    pub fn is_eraser(&self) -> bool {
        self.0 == ERASER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ColorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ColorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of a point stream.
///
/// On the wire a sample is `[x, y, pressure]` or `[x, y, pressure, "color"]`
/// and a boundary is `[]`.
#[derive(Clone, Debug, PartialEq)]
pub enum StrokePoint {
    Sample {
        x: i32,
        y: i32,
        pressure: f64,
        color: Option<ColorId>,
    },
    Boundary,
}

pub type PointStream = Vec<StrokePoint>;

impl StrokePoint {
    pub fn sample(x: i32, y: i32, pressure: f64) -> Self {
        StrokePoint::Sample {
            x,
            y,
            pressure,
            color: None,
        }
    }

    pub fn tagged(x: i32, y: i32, pressure: f64, color: impl Into<ColorId>) -> Self {
        StrokePoint::Sample {
            x,
            y,
            pressure,
            color: Some(color.into()),
        }
    }

    pub fn is_boundary(&self) -> bool {
        matches!(self, StrokePoint::Boundary)
    }

    pub fn color(&self) -> Option<&ColorId> {
        match self {
            StrokePoint::Sample { color, .. } => color.as_ref(),
            StrokePoint::Boundary => None,
        }
    }
}

impl Serialize for StrokePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StrokePoint::Boundary => serializer.serialize_seq(Some(0))?.end(),
            StrokePoint::Sample {
                x,
                y,
                pressure,
                color,
            } => {
                let len = if color.is_some() { 4 } else { 3 };
                let mut seq = serializer.serialize_seq(Some(len))?;
                seq.serialize_element(x)?;
                seq.serialize_element(y)?;
                seq.serialize_element(pressure)?;
                if let Some(color) = color {
                    seq.serialize_element(color.as_str())?;
                }
                seq.end()
            }
        }
    }
}

struct StrokePointVisitor;

impl<'de> Visitor<'de> for StrokePointVisitor {
    type Value = StrokePoint;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an empty array or [x, y, pressure, color?]")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<StrokePoint, A::Error> {
        let Some(x) = seq.next_element::<f64>()? else {
            return Ok(StrokePoint::Boundary);
        };
        let y = seq
            .next_element::<f64>()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        // Older drawings may lack a pressure or carry null in its place.
        let pressure = seq
            .next_element::<Option<f64>>()?
            .flatten()
            .filter(|value| value.is_finite())
            .unwrap_or(1.0);
        let color = seq.next_element::<Option<String>>()?.flatten();
        while seq.next_element::<IgnoredAny>()?.is_some() {}

        Ok(StrokePoint::Sample {
            x: x.floor() as i32,
            y: y.floor() as i32,
            pressure,
            color: color.map(ColorId),
        })
    }
}

impl<'de> Deserialize<'de> for StrokePoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(StrokePointVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_matches_nested_arrays() {
        let points = vec![
            StrokePoint::tagged(10, 10, 1.0, "red"),
            StrokePoint::sample(20, 10, 0.5),
            StrokePoint::Boundary,
        ];
        let json = serde_json::to_string(&points).unwrap();
        assert_eq!(json, r#"[[10,10,1.0,"red"],[20,10,0.5],[]]"#);
    }

    #[test]
    fn lenient_decoding_of_legacy_points() {
        let points: PointStream =
            serde_json::from_str(r##"[[1.7,2,null],[3,4],[5,6,1,"#444444",true],[]]"##).unwrap();
        assert_eq!(
            points,
            vec![
                StrokePoint::sample(1, 2, 1.0),
                StrokePoint::sample(3, 4, 1.0),
                StrokePoint::tagged(5, 6, 1.0, "#444444"),
                StrokePoint::Boundary,
            ]
        );
    }

    #[test]
    fn single_coordinate_is_rejected() {
        assert!(serde_json::from_str::<StrokePoint>("[1]").is_err());
    }

    #[test]
    fn eraser_color() {
        assert!(ColorId::eraser().is_eraser());
        assert!(!ColorId::from("#ff6663").is_eraser());
    }
}
