//! Position selection for new tables.
//!
//! Guards only against exact duplicate coordinates; overlapping boxes are
//! fine.

use crate::model::Position;

const FALLBACK_STEP: f64 = 32.0;

/// Canvas bound for placed tables. Within it a unit-scale step always moves
/// the candidate, so the shift cannot be absorbed by rounding.
pub const CANVAS_LIMIT: f64 = 1.0e9;

pub struct Placer {
    step: f64,
}

impl Default for Placer {
    fn default() -> Self {
        Self {
            step: FALLBACK_STEP,
        }
    }
}

impl Placer {
    /// Non-positive or non-finite steps fall back to the default.
    pub fn new(step: f64) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            FALLBACK_STEP
        };
        Self { step }
    }

    /// Returns `candidate`, shifted diagonally until it no longer coincides
    /// with any occupied position.
    ///
    /// Each occupied position can block at most one of the shifted
    /// candidates, so `occupied.len() + 1` attempts always suffice.
    /// Candidates off the canvas are clamped onto it first, non-finite
    /// coordinates land on the origin axis.
    pub fn place(&self, candidate: Position, occupied: &[Position]) -> Position {
        let mut position = Position::new(clamp_axis(candidate.x), clamp_axis(candidate.y));
        for _ in 0..=occupied.len() {
            if !occupied.iter().any(|p| p.coincides_with(&position)) {
                return position;
            }
            position = self.shift(position);
        }
        position
    }

    fn shift(&self, position: Position) -> Position {
        let next = position.offset(self.step, self.step);
        if next.x > position.x && next.y > position.y {
            next
        } else {
            // Step below the axis' precision.
            Position::new(position.x.next_up(), position.y.next_up())
        }
    }
}

fn clamp_axis(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-CANVAS_LIMIT, CANVAS_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_candidate_is_kept() {
        let placer = Placer::default();
        let occupied = [Position::new(0.0, 0.0)];
        let pos = placer.place(Position::new(10.0, 0.0), &occupied);
        assert_eq!(pos, Position::new(10.0, 0.0));
    }

    #[test]
    fn test_same_axis_is_not_a_collision() {
        let placer = Placer::default();
        let occupied = [Position::new(10.0, 5.0)];
        let pos = placer.place(Position::new(10.0, 6.0), &occupied);
        assert_eq!(pos, Position::new(10.0, 6.0));
    }

    #[test]
    fn test_shifts_past_stacked_tables() {
        let placer = Placer::new(10.0);
        let occupied = [
            Position::new(0.0, 0.0),
            Position::new(10.0, 10.0),
            Position::new(20.0, 20.0),
        ];
        let pos = placer.place(Position::new(0.0, 0.0), &occupied);
        assert_eq!(pos, Position::new(30.0, 30.0));
    }

    #[test]
    fn test_invalid_step_falls_back() {
        let placer = Placer::new(0.0);
        let occupied = [Position::new(1.0, 1.0)];
        let pos = placer.place(Position::new(1.0, 1.0), &occupied);
        assert!(!pos.coincides_with(&occupied[0]));

        let placer = Placer::new(f64::NAN);
        let pos = placer.place(Position::new(1.0, 1.0), &occupied);
        assert!(!pos.coincides_with(&occupied[0]));
    }

    #[test]
    fn test_step_below_precision_still_moves() {
        let placer = Placer::new(1.0e-12);
        let occupied = [Position::new(1.0e6, 1.0e6), Position::new(5.0e8, 5.0e8)];

        let pos = placer.place(occupied[0], &occupied);
        assert!(!pos.coincides_with(&occupied[0]));
        assert!(pos.x > occupied[0].x && pos.y > occupied[0].y);

        let pos = placer.place(occupied[1], &occupied);
        assert!(!occupied.iter().any(|p| p.coincides_with(&pos)));
    }

    #[test]
    fn test_far_candidates_are_clamped() {
        let placer = Placer::default();
        let pos = placer.place(Position::new(1.0e18, -1.0e18), &[]);
        assert_eq!(pos, Position::new(CANVAS_LIMIT, -CANVAS_LIMIT));

        let occupied = [pos];
        let next = placer.place(Position::new(1.0e18, -1.0e18), &occupied);
        assert!(!next.coincides_with(&pos));
        assert!(next.x.is_finite() && next.y.is_finite());
    }

    #[test]
    fn test_non_finite_candidates_are_placed_on_canvas() {
        let placer = Placer::default();
        let first = placer.place(Position::new(f64::INFINITY, f64::NAN), &[]);
        assert_eq!(first, Position::new(CANVAS_LIMIT, 0.0));

        let second = placer.place(Position::new(f64::INFINITY, f64::NAN), &[first]);
        assert!(!second.coincides_with(&first));
        assert!(second.x.is_finite() && second.y.is_finite());
    }
}
