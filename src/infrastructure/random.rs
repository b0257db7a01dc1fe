//! `rand`-backed random source.

use rand::Rng;

use crate::domain::RandomSource;

/// Characters used for generated nicknames and texts.
const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Random source drawing from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn string(&self, len: usize) -> String {
        let mut rng = rand::rng();
        (0..len)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect()
    }

    fn int_between(&self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        rand::rng().random_range(min..=max)
    }
}
