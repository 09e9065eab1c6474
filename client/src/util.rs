/// Swipes shorter than this, in CSS pixels, are treated as taps.
pub const SWIPE_THRESHOLD: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Swipe {
    Left,
    Right,
}

/// Euclidean remainder, so stepping back from the first image wraps to the last.
pub fn modulo(n: isize, m: usize) -> usize {
    if m == 0 {
        return 0;
    }
    n.rem_euclid(m as isize) as usize
}

pub fn swipe_direction(dx: f64, dy: f64) -> Option<Swipe> {
    if dx.abs() < SWIPE_THRESHOLD || dx.abs() <= dy.abs() {
        return None;
    }
    if dx > 0.0 {
        Some(Swipe::Right)
    } else {
        Some(Swipe::Left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulo_wraps_both_ways() {
        assert_eq!(modulo(-1, 5), 4);
        assert_eq!(modulo(5, 5), 0);
        assert_eq!(modulo(3, 5), 3);
        assert_eq!(modulo(-1, 0), 0);
    }

    #[test]
    fn swipes_need_horizontal_travel() {
        assert_eq!(swipe_direction(80.0, 10.0), Some(Swipe::Right));
        assert_eq!(swipe_direction(-80.0, 10.0), Some(Swipe::Left));
        assert_eq!(swipe_direction(20.0, 0.0), None);
        assert_eq!(swipe_direction(60.0, 90.0), None);
    }
}
