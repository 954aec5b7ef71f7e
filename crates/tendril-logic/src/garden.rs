//! Caller-side workflows composed from the core.
//!
//! These functions mirror what the planting and listing services do, minus
//! the persistence: they take the values the store already loaded and hand
//! back the values the store should write. Wrapping them in a transaction
//! is the caller's responsibility.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GardenError, GardenResult};
use crate::geometry::{Circle, Coordinates};
use crate::plant::{interaction_circle, Plant};
use crate::seeds::Seed;
use crate::soil::{allocate_soil, Soil};

/// True iff no living plant in `nearby` overlaps `circle`.
///
/// `nearby` is expected to come from a same-soil proximity query. A single
/// overlapping neighbour is enough to reject the site.
pub fn site_is_clear(circle: &Circle, nearby: &[Plant]) -> bool {
    !nearby
        .iter()
        .filter(|p| !p.dead)
        .any(|p| circle.overlaps_with(&p.circle))
}

/// The first soil in `soils` that fully contains `circle`.
pub fn find_host_soil<'a>(soils: &'a [Soil], circle: &Circle) -> Option<&'a Soil> {
    soils.iter().find(|s| s.circle.contains_full_circle(circle))
}

/// What a successful planting produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Planting {
    pub plant: Plant,
    /// Set when no soil existed near the target and one had to be created.
    pub new_soil: Option<Soil>,
}

impl Planting {
    pub fn soil_id(&self) -> uuid::Uuid {
        self.plant.soil_id
    }
}

/// Plant `seed` at `target`.
///
/// - `nearby_soils`: soils around the target (see
///   [`crate::constants::soil_radius::NEIGHBOUR_QUERY_M`]).
/// - `nearby_plants`: a lookup from soil to the plants near the target in
///   that soil (see [`crate::constants::plant::NEIGHBOUR_QUERY_M`]).
///
/// When no soil exists nearby one is allocated first. The seed is marked
/// planted only when everything succeeds.
pub fn plant_seed<'p>(
    rng: &mut impl Rng,
    seed: &mut Seed,
    target: Coordinates,
    nearby_soils: &[Soil],
    nearby_plants: impl Fn(&Soil) -> &'p [Plant],
    now: DateTime<Utc>,
) -> GardenResult<Planting> {
    if seed.planted {
        return Err(GardenError::SeedAlreadyPlanted);
    }

    let new_soil = if nearby_soils.is_empty() {
        Some(allocate_soil(rng, target, nearby_soils, None, now)?)
    } else {
        None
    };

    let circle = interaction_circle(target);
    let host = match &new_soil {
        Some(soil) => find_host_soil(std::slice::from_ref(soil), &circle),
        None => find_host_soil(nearby_soils, &circle),
    };
    let Some(host) = host else {
        warn!("no soil near {:?} can hold a plant", target);
        return Err(GardenError::InvalidSpatialFit);
    };

    if !site_is_clear(&circle, nearby_plants(host)) {
        debug!("site {:?} overlaps a plant in soil {}", target, host.id);
        return Err(GardenError::SiteOccupied);
    }

    let plant = Plant::new(rng, seed, host, target, now)?;
    Ok(Planting { plant, new_soil })
}

/// A plant paired with its distance from the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantWithDistance {
    pub plant: Plant,
    pub distance_m: f64,
}

/// Pair every plant with its distance from `point`, in input order.
pub fn with_distances(plants: &[Plant], point: &Coordinates) -> Vec<PlantWithDistance> {
    plants
        .iter()
        .map(|p| PlantWithDistance {
            plant: p.clone(),
            distance_m: p.centre().distance_m(point),
        })
        .collect()
}

/// Up to `n` plants nearest to `point`, closest first.
pub fn closest_plants(plants: &[Plant], point: &Coordinates, n: usize) -> Vec<PlantWithDistance> {
    let mut all = with_distances(plants, point);
    all.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    all.truncate(n);
    all
}
