use rand::Rng;

/// A pair of six-sided dice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dice {
    first: u8,
    second: u8,
}

impl Dice {
    /// Builds a pair from given faces, clamped into 1..=6
    pub fn new(first: u8, second: u8) -> Self {
        Self {
            first: first.clamp(1, 6),
            second: second.clamp(1, 6),
        }
    }

    /// Draws two independent faces in 1..=6
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            first: rng.gen_range(1..=6),
            second: rng.gen_range(1..=6),
        }
    }

    pub fn total(&self) -> u8 {
        self.first + self.second
    }

    pub fn faces(&self) -> [u8; 2] {
        [self.first, self.second]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_total_and_faces() {
        let dice = Dice::new(3, 4);
        assert_eq!(dice.total(), 7);
        assert_eq!(dice.faces(), [3, 4]);
    }

    #[test]
    fn test_new_keeps_faces_on_the_die() {
        let dice = Dice::new(200, 100);
        assert_eq!(dice.faces(), [6, 6]);
        assert_eq!(dice.total(), 12);

        assert_eq!(Dice::new(0, 1).faces(), [1, 1]);
    }

    #[test]
    fn test_roll_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; 6];

        for _ in 0..1000 {
            let dice = Dice::roll(&mut rng);
            assert!((1..=6).contains(&dice.first));
            assert!((1..=6).contains(&dice.second));
            assert!((2..=12).contains(&dice.total()));
            seen[(dice.first - 1) as usize] = true;
        }

        assert!(seen.iter().all(|face| *face));
    }
}
