//! In-memory stand-in for the garden database.
//!
//! Offers the two proximity queries the planting workflow needs and applies
//! the results of a planting back to its tables.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use tendril_logic::constants::{plant as plant_consts, soil_radius};
use tendril_logic::garden::plant_seed;
use tendril_logic::geometry::Coordinates;
use tendril_logic::plant::Plant;
use tendril_logic::seeds::Seed;
use tendril_logic::soil::Soil;
use tendril_logic::GardenResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GardenStore {
    pub soils: Vec<Soil>,
    pub seeds: Vec<Seed>,
    pub plants: Vec<Plant>,
}

/// Headline counts over a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GardenStats {
    pub plant_count: usize,
    pub living_count: usize,
    pub dead_count: usize,
    pub seed_count: usize,
    pub soil_count: usize,
}

impl std::fmt::Display for GardenStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} soils, {} seeds, {} plants ({} alive, {} dead)",
            self.soil_count, self.seed_count, self.plant_count, self.living_count, self.dead_count
        )
    }
}

impl GardenStore {
    pub fn insert_seeds(&mut self, seeds: Vec<Seed>) {
        self.seeds.extend(seeds);
    }

    /// Soils whose edge lies within `radius_m` of `point`.
    pub fn soils_in_proximity(&self, point: &Coordinates, radius_m: f64) -> Vec<Soil> {
        self.soils
            .iter()
            .filter(|s| s.centre().distance_m(point) - s.radius_m() <= radius_m)
            .cloned()
            .collect()
    }

    /// Plants in `soil_id` whose interaction circle lies within `radius_m`
    /// of `point`.
    pub fn plants_by_soil_and_proximity(
        &self,
        soil_id: Uuid,
        point: &Coordinates,
        radius_m: f64,
    ) -> Vec<Plant> {
        self.plants
            .iter()
            .filter(|p| p.soil_id == soil_id)
            .filter(|p| p.centre().distance_m(point) - p.circle.radius_m <= radius_m)
            .cloned()
            .collect()
    }

    pub fn plant_mut(&mut self, id: Uuid) -> Option<&mut Plant> {
        self.plants.iter_mut().find(|p| p.id == id)
    }

    /// Unplanted seeds held by `owner`.
    pub fn inventory(&self, owner: Uuid) -> Vec<Seed> {
        self.seeds
            .iter()
            .filter(|s| s.owner_id == owner && !s.planted)
            .cloned()
            .collect()
    }

    pub fn plants_of(&self, owner: Uuid) -> impl Iterator<Item = &Plant> {
        self.plants.iter().filter(move |p| p.owner_id == owner)
    }

    /// Plant the seed at `seed_index` at `target`, persisting any new soil
    /// and the plant. Returns the new plant's id.
    ///
    /// Panics if `seed_index` is out of range.
    pub fn plant(
        &mut self,
        rng: &mut impl Rng,
        seed_index: usize,
        target: Coordinates,
        now: DateTime<Utc>,
    ) -> GardenResult<Uuid> {
        let nearby_soils = self.soils_in_proximity(&target, soil_radius::NEIGHBOUR_QUERY_M);
        let nearby_plants: HashMap<Uuid, Vec<Plant>> = nearby_soils
            .iter()
            .map(|s| {
                let plants =
                    self.plants_by_soil_and_proximity(s.id, &target, plant_consts::NEIGHBOUR_QUERY_M);
                (s.id, plants)
            })
            .collect();

        let seed = &mut self.seeds[seed_index];
        let planting = plant_seed(
            rng,
            seed,
            target,
            &nearby_soils,
            |soil| nearby_plants.get(&soil.id).map(Vec::as_slice).unwrap_or(&[]),
            now,
        )?;

        if let Some(soil) = planting.new_soil {
            debug!("new {} soil {} ({}m)", soil.soil_type(), soil.id, soil.radius_m());
            self.soils.push(soil);
        }
        let id = planting.plant.id;
        self.plants.push(planting.plant);
        Ok(id)
    }

    pub fn stats(&self) -> GardenStats {
        let living_count = self.plants.iter().filter(|p| !p.dead).count();
        GardenStats {
            plant_count: self.plants.len(),
            living_count,
            dead_count: self.plants.len() - living_count,
            seed_count: self.seeds.len(),
            soil_count: self.soils.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tendril_logic::seeds::grant_seeds;
    use tendril_logic::GardenError;

    use crate::scenario::offset;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn origin() -> Coordinates {
        Coordinates::new(48.8584, 2.2945)
    }

    fn seeded_store(rng: &mut StdRng, owner: Uuid, count: usize) -> GardenStore {
        let mut store = GardenStore::default();
        store.insert_seeds(grant_seeds(rng, owner, count, now()));
        store
    }

    #[test]
    fn test_first_planting_creates_soil() {
        let mut rng = StdRng::seed_from_u64(1);
        let owner = Uuid::from_u128(5);
        let mut store = seeded_store(&mut rng, owner, 2);

        let id = store.plant(&mut rng, 0, origin(), now()).unwrap();
        assert_eq!(store.soils.len(), 1);
        assert_eq!(store.plants.len(), 1);
        assert_eq!(store.plants[0].id, id);
        assert_eq!(store.plants[0].soil_id, store.soils[0].id);
        assert!(store.seeds[0].planted);
        assert_eq!(store.inventory(owner).len(), 1);
    }

    #[test]
    fn test_second_planting_reuses_soil_or_rejects_overlap() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut store = seeded_store(&mut rng, Uuid::nil(), 2);
        store.plant(&mut rng, 0, origin(), now()).unwrap();

        let crowded = store.plant(&mut rng, 1, offset(origin(), 3.0, 0.0), now());
        assert_eq!(crowded, Err(GardenError::SiteOccupied));
        assert!(!store.seeds[1].planted);
        assert_eq!(store.soils.len(), 1);
    }

    #[test]
    fn test_planting_same_seed_twice_fails() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut store = seeded_store(&mut rng, Uuid::nil(), 1);
        store.plant(&mut rng, 0, origin(), now()).unwrap();

        let far = offset(origin(), 500.0, 0.0);
        assert_eq!(
            store.plant(&mut rng, 0, far, now()),
            Err(GardenError::SeedAlreadyPlanted)
        );
        assert_eq!(store.plants.len(), 1);
    }

    #[test]
    fn test_proximity_queries() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut store = seeded_store(&mut rng, Uuid::nil(), 2);
        store.plant(&mut rng, 0, origin(), now()).unwrap();
        store.plant(&mut rng, 1, offset(origin(), 1000.0, 0.0), now()).unwrap();

        assert_eq!(store.soils_in_proximity(&origin(), 35.0).len(), 1);
        assert_eq!(store.soils_in_proximity(&origin(), 2000.0).len(), 2);

        let soil_id = store.soils[0].id;
        assert_eq!(
            store
                .plants_by_soil_and_proximity(soil_id, &origin(), 6.0)
                .len(),
            1
        );
        assert!(store
            .plants_by_soil_and_proximity(store.soils[1].id, &origin(), 6.0)
            .is_empty());
    }

    #[test]
    fn test_stats_count_living_and_dead() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut store = seeded_store(&mut rng, Uuid::nil(), 3);
        store.plant(&mut rng, 0, origin(), now()).unwrap();
        store.plant(&mut rng, 1, offset(origin(), 800.0, 0.0), now()).unwrap();
        store.plants[1].kill(now()).unwrap();

        let stats = store.stats();
        assert_eq!(
            stats,
            GardenStats {
                plant_count: 2,
                living_count: 1,
                dead_count: 1,
                seed_count: 3,
                soil_count: 2,
            }
        );
        assert_eq!(stats.to_string(), "2 soils, 3 seeds, 2 plants (1 alive, 1 dead)");
    }
}
