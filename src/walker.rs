use crate::grid::Position;
use crate::rng::SimRng;

/// One particle in flight
#[derive(Debug, Clone, PartialEq)]
pub struct Walker {
    pub position: Position,
    pub stickiness: f64,
    pub stuck: bool,
    /// Accepted moves so far
    pub steps: u64,
}

impl Walker {
    pub fn new(position: Position, stickiness: f64) -> Self {
        Self {
            position,
            stickiness,
            stuck: false,
            steps: 0,
        }
    }

    /// Draw once against the stickiness; freezes the walker on success
    pub fn try_stick(&mut self, rng: &mut SimRng) -> bool {
        if rng.unit() < self.stickiness {
            self.stuck = true;
        }
        self.stuck
    }

    /// Freeze without consulting the stickiness
    pub fn force_stick(&mut self) {
        self.stuck = true;
    }

    pub fn move_to(&mut self, position: Position) {
        self.position = position;
        self.steps += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_stickiness_always_sticks() {
        let mut rng = SimRng::seeded(1);
        for _ in 0..100 {
            let mut w = Walker::new((0, 0), 1.0);
            assert!(w.try_stick(&mut rng));
        }
    }

    #[test]
    fn test_zero_stickiness_never_sticks() {
        let mut rng = SimRng::seeded(1);
        let mut w = Walker::new((0, 0), 0.0);
        for _ in 0..1000 {
            assert!(!w.try_stick(&mut rng));
        }
        w.force_stick();
        assert!(w.stuck);
    }

    #[test]
    fn test_move_counts_steps() {
        let mut w = Walker::new((0, 4), 0.5);
        w.move_to((1, 4));
        w.move_to((1, 3));
        assert_eq!(w.position, (1, 3));
        assert_eq!(w.steps, 2);
        assert!(!w.stuck);
    }
}
