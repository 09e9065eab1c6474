use crate::codec::decode_or_empty;
use crate::geometry::{dab_centers, Position};
use crate::{ColorId, StrokePoint};

pub const MARKER_SIZE: f64 = 4.5;
pub const ERASER_SIZE: f64 = 9.0;
pub const ERASER_STEPS: usize = 10;

/// A raster target for strokes. Implemented by the browser canvas and by test doubles.
pub trait Surface {
    fn clear(&mut self);

    /// Rounded-cap line composited over existing content.
    fn stroke_segment(&mut self, from: Position, to: Position, color: &ColorId, width: f64);

    /// Filled circle that removes existing content (destination-out).
    fn erase_dab(&mut self, x: f64, y: f64, radius: f64);
}

/// Base tool sizes in canvas pixels; the recorded pressure scales them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tools {
    pub marker_size: f64,
    pub eraser_size: f64,
    pub eraser_steps: usize,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            marker_size: MARKER_SIZE,
            eraser_size: ERASER_SIZE,
            eraser_steps: ERASER_STEPS,
        }
    }
}

pub fn draw_step<S: Surface + ?Sized>(
    surface: &mut S,
    tools: &Tools,
    from: Position,
    to: Position,
    color: &ColorId,
    pressure: f64,
) {
    if color.is_eraser() {
        let radius = tools.eraser_size * pressure;
        for (x, y) in dab_centers(from, to, tools.eraser_steps) {
            surface.erase_dab(x, y, radius);
        }
    } else {
        surface.stroke_segment(from, to, color, tools.marker_size * pressure);
    }
}

/// Clears `surface` and redraws `points` in order.
///
/// Samples seen before the first color marker have nothing to draw with and
/// only move the pen.
pub fn replay<S: Surface + ?Sized>(surface: &mut S, points: &[StrokePoint], tools: &Tools) {
    surface.clear();
    let mut color: Option<&ColorId> = None;
    let mut last: Option<Position> = None;
    for point in points {
        match point {
            StrokePoint::Sample {
                x,
                y,
                pressure,
                color: marker,
            } => {
                if let Some(marker) = marker {
                    color = Some(marker);
                }
                let here = Position::new(*x, *y);
                let from = last.unwrap_or(here);
                if let Some(color) = color {
                    draw_step(surface, tools, from, here, color, *pressure);
                }
                last = Some(here);
            }
            StrokePoint::Boundary => last = None,
        }
    }
}

pub fn replay_encoded<S: Surface + ?Sized>(surface: &mut S, encoded: &str, tools: &Tools) {
    let points = decode_or_empty(encoded);
    replay(surface, &points, tools);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::codec::encode;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Op {
        Clear,
        Line {
            from: Position,
            to: Position,
            color: String,
            width: f64,
        },
        Dab {
            x: f64,
            y: f64,
            radius: f64,
        },
    }

    #[derive(Default)]
    pub struct OpLog {
        pub ops: Vec<Op>,
    }

    impl Surface for OpLog {
        fn clear(&mut self) {
            self.ops.clear();
            self.ops.push(Op::Clear);
        }

        fn stroke_segment(&mut self, from: Position, to: Position, color: &ColorId, width: f64) {
            self.ops.push(Op::Line {
                from,
                to,
                color: color.to_string(),
                width,
            });
        }

        fn erase_dab(&mut self, x: f64, y: f64, radius: f64) {
            self.ops.push(Op::Dab { x, y, radius });
        }
    }

    fn two_strokes() -> Vec<StrokePoint> {
        vec![
            StrokePoint::tagged(10, 10, 1.0, "red"),
            StrokePoint::sample(20, 10, 1.0),
            StrokePoint::Boundary,
            StrokePoint::sample(100, 100, 2.0),
            StrokePoint::sample(110, 100, 2.0),
            StrokePoint::Boundary,
        ]
    }

    fn line(from: (i32, i32), to: (i32, i32), color: &str, width: f64) -> Op {
        Op::Line {
            from: Position::new(from.0, from.1),
            to: Position::new(to.0, to.1),
            color: color.to_string(),
            width,
        }
    }

    #[test]
    fn boundary_breaks_continuity() {
        let mut surface = OpLog::default();
        replay(&mut surface, &two_strokes(), &Tools::default());
        assert_eq!(
            surface.ops,
            vec![
                Op::Clear,
                line((10, 10), (10, 10), "red", 4.5),
                line((10, 10), (20, 10), "red", 4.5),
                line((100, 100), (100, 100), "red", 9.0),
                line((100, 100), (110, 100), "red", 9.0),
            ]
        );
    }

    #[test]
    fn replay_is_deterministic() {
        let mut first = OpLog::default();
        let mut second = OpLog::default();
        second.ops.push(Op::Dab {
            x: 1.0,
            y: 1.0,
            radius: 1.0,
        });
        replay(&mut first, &two_strokes(), &Tools::default());
        replay(&mut second, &two_strokes(), &Tools::default());
        assert_eq!(first.ops, second.ops);
    }

    #[test]
    fn eraser_stamps_interpolated_dabs() {
        let points = vec![
            StrokePoint::tagged(0, 0, 0.5, "transparent"),
            StrokePoint::sample(10, 0, 0.5),
        ];
        let mut surface = OpLog::default();
        replay(&mut surface, &points, &Tools::default());
        let dabs: Vec<_> = surface
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Dab { x, radius, .. } => Some((*x, *radius)),
                _ => None,
            })
            .collect();
        assert_eq!(dabs.len(), 20);
        assert!(dabs[..10].iter().all(|(x, _)| *x == 0.0));
        for (index, (x, _)) in dabs[10..].iter().enumerate() {
            assert!((x - index as f64).abs() < 1e-9);
        }
        assert!(dabs.iter().all(|(_, radius)| *radius == 4.5));
    }

    #[test]
    fn unreadable_payload_leaves_blank_surface() {
        let mut surface = OpLog::default();
        replay_encoded(&mut surface, "\u{7}\u{1}garbage", &Tools::default());
        assert_eq!(surface.ops, vec![Op::Clear]);
    }

    #[test]
    fn encoded_replay_matches_in_memory_replay() {
        let mut direct = OpLog::default();
        let mut encoded = OpLog::default();
        replay(&mut direct, &two_strokes(), &Tools::default());
        replay_encoded(&mut encoded, &encode(&two_strokes()), &Tools::default());
        assert_eq!(direct.ops, encoded.ops);
    }
}
