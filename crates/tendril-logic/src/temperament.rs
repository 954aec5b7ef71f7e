//! Plant temperament: four independent random traits rolled at planting.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::temperament::MAX_VALUE;

/// Personality traits of a plant, each in `0..MAX_VALUE`. Never mutated
/// after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Temperament {
    pub woe: i64,
    pub frolic: i64,
    pub dread: i64,
    pub malice: i64,
}

impl Temperament {
    /// Roll a fresh temperament.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            woe: rng.gen_range(0..MAX_VALUE),
            frolic: rng.gen_range(0..MAX_VALUE),
            dread: rng.gen_range(0..MAX_VALUE),
            malice: rng.gen_range(0..MAX_VALUE),
        }
    }

    pub fn values(&self) -> [i64; 4] {
        [self.woe, self.frolic, self.dread, self.malice]
    }
}
