use crate::codec::{encode, CompressionStats};
use crate::geometry::{Position, SurfaceScale};
use crate::history::{History, Undo};
use crate::render::{draw_step, replay, Surface, Tools};
use crate::{ColorId, PointStream, StrokePoint};

/// Samples from a different device arriving sooner than this after the last
/// accepted one are dropped (palm touches while a pen stroke is in progress).
pub const DEVICE_SWITCH_DEBOUNCE_MS: f64 = 1000.0;

const REFERENCE_IMAGE_WIDTH: f64 = 1920.0;
const ERASER_CURSOR_SCALE: f64 = 1.8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Pen,
    Touch,
    Other,
}

impl PointerKind {
    pub fn from_pointer_type(value: &str) -> Self {
        match value {
            "mouse" => PointerKind::Mouse,
            "pen" => PointerKind::Pen,
            "touch" => PointerKind::Touch,
            _ => PointerKind::Other,
        }
    }
}

/// One pointer movement as delivered by the UI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub primary: bool,
    pub kind: PointerKind,
    /// Raw device pressure, nominally in `[0, 1]`.
    pub pressure: f64,
    /// Button bit mask; `1` is the primary button held, `0` nothing held.
    pub buttons: u16,
    /// Position relative to the displayed surface, in CSS pixels.
    pub offset_x: f64,
    pub offset_y: f64,
    pub timestamp_ms: f64,
}

/// Maps raw pen pressure to a stroke weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PressureProfile {
    pub gain: f64,
    pub min: f64,
    pub max: f64,
    /// Weight of the new sample in the exponential smoothing.
    pub smoothing: f64,
}

impl Default for PressureProfile {
    fn default() -> Self {
        Self {
            gain: 3.0,
            min: 0.45,
            max: 1.0,
            smoothing: 0.25,
        }
    }
}

impl PressureProfile {
    fn normalize(&self, raw: f64) -> f64 {
        let raw = if raw.is_finite() { raw } else { 1.0 };
        let clamped = (raw * self.gain).clamp(self.min, self.max);
        (clamped * 100.0).round() / 100.0
    }
}

/// Size of the tool indicator that follows the pointer, in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    pub size: f64,
    pub eraser: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveOutcome {
    /// Not primary, or dropped by the device-switch debounce.
    Ignored,
    Hover(Cursor),
    Drawing(Cursor),
    /// The button was released and the stroke was closed.
    Finished(Cursor),
}

/// Records pointer input into a point stream and keeps its undo history.
pub struct Recorder {
    tools: Tools,
    profile: PressureProfile,
    size_scalar: f64,
    color: ColorId,
    last_color: Option<ColorId>,
    last: Option<Position>,
    last_pressure: f64,
    last_kind: Option<PointerKind>,
    last_time: f64,
    points: PointStream,
    history: History,
    backup: PointStream,
}

impl Recorder {
    pub fn new(color: ColorId) -> Self {
        Self::with_tools(color, Tools::default(), PressureProfile::default())
    }

    pub fn with_tools(color: ColorId, tools: Tools, profile: PressureProfile) -> Self {
        Self {
            tools,
            profile,
            size_scalar: 1.0,
            color,
            last_color: None,
            last: None,
            last_pressure: 1.0,
            last_kind: None,
            last_time: f64::NEG_INFINITY,
            points: Vec::new(),
            history: History::new(),
            backup: Vec::new(),
        }
    }

    pub fn tools(&self) -> &Tools {
        &self.tools
    }

    pub fn color(&self) -> &ColorId {
        &self.color
    }

    pub fn set_color(&mut self, color: ColorId) {
        self.color = color;
    }

    /// Pen strokes scale with the image width (relative to 1920px, clamped to
    /// `[0.5, 1.5]`) and with the pen-size slider.
    pub fn set_size_context(&mut self, image_width: f64, slider: f64) {
        let ratio = if image_width.is_finite() && image_width > 0.0 {
            (image_width / REFERENCE_IMAGE_WIDTH).clamp(0.5, 1.5)
        } else {
            1.0
        };
        let slider = if slider.is_finite() { slider } else { 2.0 };
        self.size_scalar = ratio * 2.0 * (slider * 0.5);
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_revert(&self) -> bool {
        !self.backup.is_empty()
    }

    pub fn in_stroke(&self) -> bool {
        self.last.is_some()
    }

    pub fn stats(&self) -> CompressionStats {
        CompressionStats::measure(&self.points)
    }

    /// The payload to persist, or `None` when the drawing should be deleted.
    pub fn encoded(&self) -> Option<String> {
        if self.points.is_empty() {
            None
        } else {
            Some(encode(&self.points))
        }
    }

    /// Adopts a stream loaded from the server; it also becomes the revert target.
    pub fn load<S: Surface + ?Sized>(&mut self, points: PointStream, surface: &mut S) {
        self.backup = points.clone();
        self.points = points;
        self.history.clear();
        self.last = None;
        self.last_color = None;
        self.redraw(surface);
    }

    /// Forgets the drawing entirely, e.g. when the viewer closes.
    pub fn reset(&mut self) {
        self.points.clear();
        self.backup.clear();
        self.history.clear();
        self.last = None;
        self.last_color = None;
    }

    pub fn redraw<S: Surface + ?Sized>(&self, surface: &mut S) {
        replay(surface, &self.points, &self.tools);
    }

    pub fn pointer_move<S: Surface + ?Sized>(
        &mut self,
        sample: &PointerSample,
        scale: SurfaceScale,
        surface: &mut S,
    ) -> MoveOutcome {
        if !sample.primary {
            return MoveOutcome::Ignored;
        }
        if let Some(kind) = self.last_kind {
            if kind != sample.kind
                && sample.timestamp_ms - self.last_time < DEVICE_SWITCH_DEBOUNCE_MS
            {
                return MoveOutcome::Ignored;
            }
        }
        self.last_time = sample.timestamp_ms;
        self.last_kind = Some(sample.kind);

        let pressure = self.pressure_for(sample);
        let cursor = self.cursor(pressure, scale);
        let here = scale.map(sample.offset_x, sample.offset_y);

        let outcome = match sample.buttons {
            1 => {
                if let Some(last) = self.last {
                    self.push_sample(last, pressure);
                    let color = self.color.clone();
                    draw_step(surface, &self.tools, last, here, &color, pressure);
                }
                self.last = Some(here);
                MoveOutcome::Drawing(cursor)
            }
            0 => {
                if self.finish_stroke() {
                    MoveOutcome::Finished(cursor)
                } else {
                    MoveOutcome::Hover(cursor)
                }
            }
            _ => MoveOutcome::Hover(cursor),
        };

        self.last_pressure = pressure;
        outcome
    }

    /// The pointer left the surface: close any open stroke.
    pub fn pointer_leave(&mut self) -> bool {
        self.finish_stroke()
    }

    pub fn undo<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        match self.history.undo() {
            Undo::Nothing => {}
            Undo::Restore(points) => {
                self.points = points;
                self.redraw(surface);
            }
            Undo::Cleared => {
                self.points.clear();
                surface.clear();
            }
        }
        self.last = None;
    }

    pub fn revert<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        self.history.clear();
        self.points = self.backup.clone();
        self.last = None;
        self.last_color = None;
        self.redraw(surface);
    }

    pub fn clear<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        self.points.clear();
        self.history.clear();
        self.last = None;
        self.last_color = None;
        surface.clear();
    }

    fn pressure_for(&self, sample: &PointerSample) -> f64 {
        if sample.kind != PointerKind::Pen {
            return 1.0;
        }
        let weight = self.profile.normalize(sample.pressure) * self.size_scalar;
        self.profile.smoothing * weight + (1.0 - self.profile.smoothing) * self.last_pressure
    }

    fn cursor(&self, pressure: f64, scale: SurfaceScale) -> Cursor {
        let average = scale.average();
        if self.color.is_eraser() {
            Cursor {
                size: self.tools.eraser_size * pressure * ERASER_CURSOR_SCALE / average,
                eraser: true,
            }
        } else {
            Cursor {
                size: self.tools.marker_size * pressure / average,
                eraser: false,
            }
        }
    }

    fn push_sample(&mut self, at: Position, pressure: f64) {
        let starts_stroke = matches!(self.points.last(), None | Some(StrokePoint::Boundary));
        let color = if starts_stroke || self.last_color.as_ref() != Some(&self.color) {
            self.last_color = Some(self.color.clone());
            Some(self.color.clone())
        } else {
            None
        };
        self.points.push(StrokePoint::Sample {
            x: at.x,
            y: at.y,
            pressure,
            color,
        });
    }

    fn finish_stroke(&mut self) -> bool {
        let Some(last) = self.last.take() else {
            return false;
        };
        self.push_sample(last, self.last_pressure);
        self.points.push(StrokePoint::Boundary);
        self.history.push(&self.points);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::history::HISTORY_LIMIT;
    use crate::render::tests::{Op, OpLog};

    fn mouse(x: f64, y: f64, buttons: u16, timestamp_ms: f64) -> PointerSample {
        PointerSample {
            primary: true,
            kind: PointerKind::Mouse,
            pressure: 0.5,
            buttons,
            offset_x: x,
            offset_y: y,
            timestamp_ms,
        }
    }

    fn pen(x: f64, y: f64, pressure: f64, timestamp_ms: f64) -> PointerSample {
        PointerSample {
            kind: PointerKind::Pen,
            pressure,
            ..mouse(x, y, 1, timestamp_ms)
        }
    }

    fn stroke(recorder: &mut Recorder, surface: &mut OpLog, path: &[(f64, f64)], start_ms: f64) {
        for (index, (x, y)) in path.iter().enumerate() {
            recorder.pointer_move(
                &mouse(*x, *y, 1, start_ms + index as f64),
                SurfaceScale::IDENTITY,
                surface,
            );
        }
        recorder.pointer_move(
            &mouse(0.0, 0.0, 0, start_ms + path.len() as f64),
            SurfaceScale::IDENTITY,
            surface,
        );
    }

    #[test]
    fn records_three_samples_and_release() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        stroke(&mut recorder, &mut surface, &[(10.0, 10.0), (20.0, 10.0), (20.0, 20.0)], 0.0);

        let expected = vec![
            StrokePoint::tagged(10, 10, 1.0, "red"),
            StrokePoint::sample(20, 10, 1.0),
            StrokePoint::sample(20, 20, 1.0),
            StrokePoint::Boundary,
        ];
        assert_eq!(recorder.points(), expected.as_slice());
        assert_eq!(decode(&recorder.encoded().unwrap()).unwrap(), expected);
        assert_eq!(recorder.history().len(), 1);
    }

    #[test]
    fn color_switch_mid_stroke_is_marked_once() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        let scale = SurfaceScale::IDENTITY;
        recorder.pointer_move(&mouse(0.0, 0.0, 1, 0.0), scale, &mut surface);
        recorder.pointer_move(&mouse(5.0, 0.0, 1, 1.0), scale, &mut surface);
        recorder.pointer_move(&mouse(10.0, 0.0, 1, 2.0), scale, &mut surface);
        recorder.set_color(ColorId::eraser());
        recorder.pointer_move(&mouse(15.0, 0.0, 1, 3.0), scale, &mut surface);
        recorder.pointer_move(&mouse(20.0, 0.0, 1, 4.0), scale, &mut surface);
        recorder.pointer_move(&mouse(20.0, 0.0, 0, 5.0), scale, &mut surface);

        assert_eq!(
            recorder.points(),
            &[
                StrokePoint::tagged(0, 0, 1.0, "red"),
                StrokePoint::sample(5, 0, 1.0),
                StrokePoint::tagged(10, 0, 1.0, "transparent"),
                StrokePoint::sample(15, 0, 1.0),
                StrokePoint::sample(20, 0, 1.0),
                StrokePoint::Boundary,
            ]
        );
        assert!(surface
            .ops
            .iter()
            .any(|op| matches!(op, Op::Dab { radius, .. } if *radius == 9.0)));
    }

    #[test]
    fn constant_color_marks_only_the_first_point_of_a_stroke() {
        let mut recorder = Recorder::new(ColorId::from("#9ee09e"));
        let mut surface = OpLog::default();
        let path: Vec<_> = (0..20).map(|i| (i as f64, (i * 2) as f64)).collect();
        stroke(&mut recorder, &mut surface, &path, 0.0);

        let marked: Vec<_> = recorder
            .points()
            .iter()
            .enumerate()
            .filter(|(_, point)| point.color().is_some())
            .map(|(index, _)| index)
            .collect();
        assert_eq!(marked, vec![0]);
    }

    #[test]
    fn live_rendering_matches_replay() {
        let mut recorder = Recorder::new(ColorId::from("#ff6663"));
        let mut live = OpLog::default();
        live.clear();
        stroke(&mut recorder, &mut live, &[(1.0, 1.0), (4.0, 5.0), (9.0, 9.0)], 0.0);
        recorder.set_color(ColorId::eraser());
        stroke(&mut recorder, &mut live, &[(3.0, 3.0), (6.0, 6.0)], 10.0);

        let mut replayed = OpLog::default();
        recorder.redraw(&mut replayed);
        // Replay additionally draws the opening dot of each stroke.
        for op in &live.ops {
            assert!(replayed.ops.contains(op), "{op:?} missing from replay");
        }
    }

    #[test]
    fn new_stroke_never_connects_to_previous_one() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        stroke(&mut recorder, &mut surface, &[(0.0, 0.0), (10.0, 0.0)], 0.0);
        surface.ops.clear();
        stroke(&mut recorder, &mut surface, &[(100.0, 100.0), (110.0, 100.0)], 10.0);

        let mut replayed = OpLog::default();
        recorder.redraw(&mut replayed);
        for ops in [&surface.ops, &replayed.ops] {
            assert!(!ops.iter().any(|op| matches!(
                op,
                Op::Line { from, to, .. } if from.x <= 10 && to.x >= 100
            )));
        }
    }

    #[test]
    fn pointer_leave_closes_the_stroke() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        let scale = SurfaceScale::IDENTITY;
        recorder.pointer_move(&mouse(1.0, 1.0, 1, 0.0), scale, &mut surface);
        recorder.pointer_move(&mouse(2.0, 2.0, 1, 1.0), scale, &mut surface);
        assert!(recorder.pointer_leave());
        assert!(!recorder.in_stroke());
        assert_eq!(recorder.points().last(), Some(&StrokePoint::Boundary));
        assert!(!recorder.pointer_leave());
        assert_eq!(recorder.history().len(), 1);
    }

    #[test]
    fn single_click_records_a_tagged_dot() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        stroke(&mut recorder, &mut surface, &[(7.0, 8.0)], 0.0);
        assert_eq!(
            recorder.points(),
            &[StrokePoint::tagged(7, 8, 1.0, "red"), StrokePoint::Boundary]
        );
    }

    #[test]
    fn device_switch_is_debounced() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        let scale = SurfaceScale::IDENTITY;
        assert!(matches!(
            recorder.pointer_move(&pen(1.0, 1.0, 0.3, 0.0), scale, &mut surface),
            MoveOutcome::Drawing(_)
        ));
        let touch = PointerSample {
            kind: PointerKind::Touch,
            ..mouse(50.0, 50.0, 1, 500.0)
        };
        assert_eq!(recorder.pointer_move(&touch, scale, &mut surface), MoveOutcome::Ignored);
        assert!(recorder.points().is_empty());

        let late_touch = PointerSample {
            timestamp_ms: 1600.0,
            ..touch
        };
        assert!(matches!(
            recorder.pointer_move(&late_touch, scale, &mut surface),
            MoveOutcome::Drawing(_)
        ));
    }

    #[test]
    fn device_switch_after_exactly_the_debounce_is_accepted() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        let scale = SurfaceScale::IDENTITY;
        recorder.pointer_move(&pen(1.0, 1.0, 0.3, 0.0), scale, &mut surface);

        let just_inside = PointerSample {
            kind: PointerKind::Touch,
            ..mouse(5.0, 5.0, 1, DEVICE_SWITCH_DEBOUNCE_MS - 1.0)
        };
        assert_eq!(
            recorder.pointer_move(&just_inside, scale, &mut surface),
            MoveOutcome::Ignored
        );
        let on_boundary = PointerSample {
            timestamp_ms: DEVICE_SWITCH_DEBOUNCE_MS,
            ..just_inside
        };
        assert!(matches!(
            recorder.pointer_move(&on_boundary, scale, &mut surface),
            MoveOutcome::Drawing(_)
        ));
    }

    #[test]
    fn secondary_pointers_are_ignored() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        let sample = PointerSample {
            primary: false,
            ..mouse(1.0, 1.0, 1, 0.0)
        };
        assert_eq!(
            recorder.pointer_move(&sample, SurfaceScale::IDENTITY, &mut surface),
            MoveOutcome::Ignored
        );
        assert!(!recorder.in_stroke());
    }

    #[test]
    fn pen_pressure_is_clamped_scaled_and_smoothed() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        recorder.set_size_context(1920.0, 2.0);
        let mut surface = OpLog::default();
        let scale = SurfaceScale::IDENTITY;

        // 0.1 * 3 clamps up to 0.45; scalar is 1 * 2 * 1 = 2.
        recorder.pointer_move(&pen(0.0, 0.0, 0.1, 0.0), scale, &mut surface);
        recorder.pointer_move(&pen(1.0, 0.0, 0.1, 1.0), scale, &mut surface);
        let first = 0.25 * 0.9 + 0.75 * 1.0;
        let second = 0.25 * 0.9 + 0.75 * first;
        match &recorder.points()[0] {
            StrokePoint::Sample { pressure, .. } => assert!((pressure - second).abs() < 1e-12),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_pen_pressure_counts_as_full() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        recorder.set_size_context(1920.0, 2.0);
        let mut surface = OpLog::default();
        let scale = SurfaceScale::IDENTITY;
        recorder.pointer_move(&pen(0.0, 0.0, f64::NAN, 0.0), scale, &mut surface);
        recorder.pointer_move(&pen(1.0, 0.0, f64::NAN, 1.0), scale, &mut surface);
        match &recorder.points()[0] {
            StrokePoint::Sample { pressure, .. } => assert!(pressure.is_finite()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn coordinates_are_mapped_to_image_resolution() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        let scale = SurfaceScale::new(2000.0, 1000.0, 1000.0, 500.0);
        recorder.pointer_move(&mouse(10.25, 20.0, 1, 0.0), scale, &mut surface);
        match recorder.pointer_move(&mouse(11.0, 21.0, 1, 1.0), scale, &mut surface) {
            MoveOutcome::Drawing(cursor) => assert_eq!(cursor.size, 4.5 / 2.0),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(recorder.points()[0], StrokePoint::tagged(20, 40, 1.0, "red"));
    }

    #[test]
    fn eraser_cursor_is_larger() {
        let mut recorder = Recorder::new(ColorId::eraser());
        let mut surface = OpLog::default();
        match recorder.pointer_move(&mouse(0.0, 0.0, 0, 0.0), SurfaceScale::IDENTITY, &mut surface) {
            MoveOutcome::Hover(cursor) => {
                assert!(cursor.eraser);
                assert!((cursor.size - 9.0 * 1.8).abs() < 1e-12);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn history_is_bounded_after_forty_strokes() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        for index in 0..40 {
            let x = index as f64 * 10.0;
            stroke(&mut recorder, &mut surface, &[(x, 0.0), (x + 1.0, 0.0)], index as f64 * 10.0);
        }
        assert_eq!(recorder.history().len(), HISTORY_LIMIT);
        let lengths: Vec<_> = recorder.history().snapshots().map(Vec::len).collect();
        let expected: Vec<_> = (11..=40).map(|strokes| strokes * 3).collect();
        assert_eq!(lengths, expected);
    }

    #[test]
    fn undo_walks_back_then_clears() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        stroke(&mut recorder, &mut surface, &[(0.0, 0.0), (1.0, 1.0)], 0.0);
        let after_first = recorder.points().to_vec();
        stroke(&mut recorder, &mut surface, &[(5.0, 5.0), (6.0, 6.0)], 10.0);

        recorder.undo(&mut surface);
        assert_eq!(recorder.points(), after_first.as_slice());
        assert!(recorder.can_undo());

        recorder.undo(&mut surface);
        assert!(recorder.points().is_empty());
        assert!(!recorder.can_undo());
        assert_eq!(surface.ops, vec![Op::Clear]);

        recorder.undo(&mut surface);
        assert!(recorder.points().is_empty());
        assert_eq!(recorder.encoded(), None);
    }

    #[test]
    fn revert_restores_loaded_drawing() {
        let loaded = vec![
            StrokePoint::tagged(1, 1, 1.0, "#444444"),
            StrokePoint::sample(2, 2, 1.0),
            StrokePoint::Boundary,
        ];
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        assert!(!recorder.can_revert());
        recorder.load(loaded.clone(), &mut surface);
        assert!(recorder.can_revert());
        assert!(!recorder.can_undo());

        stroke(&mut recorder, &mut surface, &[(50.0, 50.0), (60.0, 60.0)], 0.0);
        assert_eq!(recorder.points().len(), 6);

        recorder.revert(&mut surface);
        assert_eq!(recorder.points(), loaded.as_slice());
        assert!(!recorder.can_undo());
    }

    #[test]
    fn clear_empties_stream_and_history() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        stroke(&mut recorder, &mut surface, &[(0.0, 0.0), (1.0, 1.0)], 0.0);
        recorder.clear(&mut surface);
        assert!(recorder.points().is_empty());
        assert!(!recorder.can_undo());
        assert_eq!(surface.ops, vec![Op::Clear]);
    }

    #[test]
    fn first_stroke_after_undo_is_tagged() {
        let mut recorder = Recorder::new(ColorId::from("red"));
        let mut surface = OpLog::default();
        stroke(&mut recorder, &mut surface, &[(0.0, 0.0), (1.0, 1.0)], 0.0);
        recorder.undo(&mut surface);
        stroke(&mut recorder, &mut surface, &[(3.0, 3.0), (4.0, 4.0)], 10.0);
        assert_eq!(recorder.points()[0], StrokePoint::tagged(3, 3, 1.0, "red"));
    }
}
