//! Random draws used by the turn engine.
//!
//! Every draw goes through [`RandomSource`] so tests can substitute a seeded or
//! scripted source. Any `rand::Rng` (e.g. `ChaCha8Rng`) is a `RandomSource`.

use bunny_core::{Color, Kind, Sex};
use rand::Rng;

const NAME_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of generated agent names
pub const NAME_LENGTH: usize = 10;

pub trait RandomSource {
    /// Uniform integer in `[0, upper)`; `upper` must be non-zero
    fn uniform_int(&mut self, upper: usize) -> usize;

    /// `true` with the given probability
    fn uniform_bool(&mut self, probability: f64) -> bool;

    /// 128 fresh random bits, used for agent ids
    fn next_u128(&mut self) -> u128;
}

impl<R: Rng> RandomSource for R {
    fn uniform_int(&mut self, upper: usize) -> usize {
        self.gen_range(0..upper)
    }

    fn uniform_bool(&mut self, probability: f64) -> bool {
        self.gen_bool(probability.clamp(0.0, 1.0))
    }

    fn next_u128(&mut self) -> u128 {
        self.gen()
    }
}

/// Uniformly pick one element, `None` when empty
pub fn choose<'a, T, R: RandomSource + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        items.get(rng.uniform_int(items.len()))
    }
}

/// Uniformly pick and take one element out of `items`, `None` when empty
pub fn take_random<T, R: RandomSource + ?Sized>(rng: &mut R, items: &mut Vec<T>) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        let index = rng.uniform_int(items.len());
        Some(items.swap_remove(index))
    }
}

pub fn random_sex<R: RandomSource + ?Sized>(rng: &mut R) -> Sex {
    if rng.uniform_bool(0.5) {
        Sex::Male
    } else {
        Sex::Female
    }
}

pub fn random_color<R: RandomSource + ?Sized>(rng: &mut R) -> Color {
    Color::SEEDABLE[rng.uniform_int(Color::SEEDABLE.len())]
}

pub fn random_house<R: RandomSource + ?Sized>(rng: &mut R) -> Kind {
    Kind::HOUSES[rng.uniform_int(Kind::HOUSES.len())]
}

/// Cosmetic name made of upper-case letters and digits
pub fn random_name<R: RandomSource + ?Sized>(rng: &mut R) -> String {
    (0..NAME_LENGTH)
        .map(|_| NAME_CHARS[rng.uniform_int(NAME_CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::RandomSource;
    use std::collections::VecDeque;

    /// Replays fixed answers; integer answers are reduced modulo `upper`
    pub struct ScriptedRandom {
        pub ints: VecDeque<usize>,
        pub bools: VecDeque<bool>,
        counter: u128,
    }

    impl ScriptedRandom {
        pub fn new(ints: &[usize], bools: &[bool]) -> Self {
            Self {
                ints: ints.iter().copied().collect(),
                bools: bools.iter().copied().collect(),
                counter: 0,
            }
        }
    }

    impl RandomSource for ScriptedRandom {
        fn uniform_int(&mut self, upper: usize) -> usize {
            self.ints.pop_front().unwrap_or(0) % upper
        }

        fn uniform_bool(&mut self, probability: f64) -> bool {
            self.bools.pop_front().unwrap_or(probability >= 1.0)
        }

        fn next_u128(&mut self) -> u128 {
            self.counter += 1;
            self.counter
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedRandom;
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_choose_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let empty: [u8; 0] = [];
        assert!(choose(&mut rng, &empty).is_none());
    }

    #[test]
    fn test_choose_is_uniform_enough() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let items = [0usize, 1, 2, 3];
        let mut hits = [0u32; 4];
        for _ in 0..4000 {
            hits[*choose(&mut rng, &items).unwrap()] += 1;
        }
        assert!(hits.iter().all(|&h| (800..1200).contains(&h)), "{hits:?}");
    }

    #[test]
    fn test_take_random_removes() {
        let mut rng = ScriptedRandom::new(&[1], &[]);
        let mut items = vec!['a', 'b', 'c'];
        assert_eq!(take_random(&mut rng, &mut items), Some('b'));
        assert_eq!(items.len(), 2);
        assert!(!items.contains(&'b'));
    }

    #[test]
    fn test_random_name_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let name = random_name(&mut rng);
        assert_eq!(name.len(), NAME_LENGTH);
        assert!(name.bytes().all(|b| NAME_CHARS.contains(&b)));
    }

    #[test]
    fn test_scripted_source_substitutes() {
        let mut rng = ScriptedRandom::new(&[2], &[false]);
        assert_eq!(random_house(&mut rng), Kind::Lannister);
        assert_eq!(random_sex(&mut rng), Sex::Female);
    }
}
