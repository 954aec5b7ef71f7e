//! Seed catalog, seed issuing, and soil compatibility.
//!
//! Ten species make up the catalog. Each has an optimal soil type; a
//! species is compatible with a soil when the types match or either side is
//! loam.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{plant::SEED_BASE_HP, seeds};
use crate::error::{GardenError, GardenResult};
use crate::ids::random_id;
use crate::soil::SoilType;

/// A plantable species.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeedSpecies {
    pub botanical_name: String,
    pub common_name: String,
    pub optimal_soil: SoilType,
}

/// How well a species suits a soil type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoilMatch {
    Optimal,
    Compatible,
    Incompatible,
}

impl SeedSpecies {
    pub fn is_compatible_with_soil(&self, soil_type: SoilType) -> bool {
        self.optimal_soil == soil_type
            || self.optimal_soil == SoilType::Loam
            || soil_type == SoilType::Loam
    }

    pub fn soil_match(&self, soil_type: SoilType) -> SoilMatch {
        if self.optimal_soil == soil_type {
            SoilMatch::Optimal
        } else if self.is_compatible_with_soil(soil_type) {
            SoilMatch::Compatible
        } else {
            SoilMatch::Incompatible
        }
    }
}

const CATALOG: [(&str, &str, SoilType); 10] = [
    ("Solanum lycopersicum", "Tomato", SoilType::Loam),
    ("Zea mays", "Corn", SoilType::Loam),
    ("Daucus carota", "Carrot", SoilType::Sandy),
    ("Oryza sativa", "Rice", SoilType::Clay),
    ("Cucumis sativus", "Cucumber", SoilType::Loam),
    ("Pisum sativum", "Pea", SoilType::Silt),
    ("Allium cepa", "Onion", SoilType::Sandy),
    ("Glycine max", "Soybean", SoilType::Clay),
    ("Spinacia oleracea", "Spinach", SoilType::Loam),
    ("Helianthus annuus", "Sunflower", SoilType::Sandy),
];

/// Every species in the catalog, in catalog order.
pub fn catalog() -> Vec<SeedSpecies> {
    CATALOG
        .iter()
        .map(|&(botanical, common, optimal_soil)| SeedSpecies {
            botanical_name: botanical.to_string(),
            common_name: common.to_string(),
            optimal_soil,
        })
        .collect()
}

/// Uniformly random catalog species.
pub fn random_species(rng: &mut impl Rng) -> SeedSpecies {
    let (botanical, common, optimal_soil) = CATALOG[rng.gen_range(0..CATALOG.len())];
    SeedSpecies {
        botanical_name: botanical.to_string(),
        common_name: common.to_string(),
        optimal_soil,
    }
}

/// An owned seed waiting to be planted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Starting health of the plant it becomes.
    pub hp: f64,
    pub planted: bool,
    pub species: SeedSpecies,
    pub created_at: DateTime<Utc>,
}

impl Seed {
    /// A fresh, unplanted seed of a random species.
    pub fn new(rng: &mut impl Rng, owner_id: Uuid, now: DateTime<Utc>) -> Self {
        let species = random_species(rng);
        Self {
            id: random_id(rng),
            owner_id,
            hp: SEED_BASE_HP,
            planted: false,
            species,
            created_at: now,
        }
    }

    /// The one-way unplanted → planted transition.
    pub fn mark_planted(&mut self) -> GardenResult<()> {
        if self.planted {
            return Err(GardenError::SeedAlreadyPlanted);
        }
        self.planted = true;
        Ok(())
    }
}

/// How many seeds a single grant hands out (5–10 inclusive).
pub fn random_grant_size(rng: &mut impl Rng) -> usize {
    rng.gen_range(seeds::GRANT_MIN..=seeds::GRANT_MAX)
}

/// Issue `count` new seeds to `owner_id`.
pub fn grant_seeds(
    rng: &mut impl Rng,
    owner_id: Uuid,
    count: usize,
    now: DateTime<Utc>,
) -> Vec<Seed> {
    (0..count).map(|_| Seed::new(rng, owner_id, now)).collect()
}

/// Seeds of one species, as shown in an inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedGroup {
    pub botanical_name: String,
    pub count: usize,
    pub seeds: Vec<Seed>,
}

/// Group seeds by botanical name, ordered by name.
pub fn group_seeds(seeds: &[Seed]) -> Vec<SeedGroup> {
    let mut groups: BTreeMap<&str, Vec<Seed>> = BTreeMap::new();
    for seed in seeds {
        groups
            .entry(seed.species.botanical_name.as_str())
            .or_default()
            .push(seed.clone());
    }

    groups
        .into_iter()
        .map(|(name, seeds)| SeedGroup {
            botanical_name: name.to_string(),
            count: seeds.len(),
            seeds,
        })
        .collect()
}
