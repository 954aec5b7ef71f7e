//! Soil patches and the allocation algorithm that packs them.
//!
//! A soil is a circular patch of one [`SoilType`] that plants must sit
//! entirely inside. Soils are created on demand when a planting target has
//! no suitable patch nearby, and are never resized afterwards.
//!
//! # Allocation
//!
//! [`allocate_soil`] is a single-shot heuristic:
//!
//! 1. Draw a radius uniformly from the fixed [`SoilSize`] set.
//! 2. Find every nearby soil the candidate circle would overlap.
//! 3. No overlaps: keep the radius.
//! 4. Overlaps: for each, the largest radius that stays clear is
//!    `d − r − 0.1` (floored at 0). Redraw from the sizes that fit under the
//!    smallest such bound.
//! 5. Nothing fits: [`GardenError::NoSoilGenerated`].
//!
//! Serialising concurrent allocations at the same spot is left to the
//! caller's transaction.

use chrono::{DateTime, Utc};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{soil_attributes, soil_radius};
use crate::error::{GardenError, GardenResult};
use crate::geometry::{Circle, Coordinates};
use crate::ids::random_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilType {
    Loam,
    Sandy,
    Silt,
    Clay,
}

impl SoilType {
    pub const ALL: [SoilType; 4] = [
        SoilType::Loam,
        SoilType::Sandy,
        SoilType::Silt,
        SoilType::Clay,
    ];

    /// Baseline (water retention, nutrient richness) before jitter.
    pub fn baseline(self) -> (f64, f64) {
        match self {
            SoilType::Loam => (0.6, 0.7),
            SoilType::Sandy => (0.25, 0.35),
            SoilType::Silt => (0.7, 0.6),
            SoilType::Clay => (0.85, 0.5),
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl std::fmt::Display for SoilType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoilType::Loam => write!(f, "loam"),
            SoilType::Sandy => write!(f, "sandy"),
            SoilType::Silt => write!(f, "silt"),
            SoilType::Clay => write!(f, "clay"),
        }
    }
}

/// The discrete set of radii a soil may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilSize {
    Small,
    Medium,
    Large,
}

impl SoilSize {
    pub const ALL: [SoilSize; 3] = [SoilSize::Small, SoilSize::Medium, SoilSize::Large];

    pub fn radius_m(self) -> f64 {
        match self {
            SoilSize::Small => soil_radius::SMALL_M,
            SoilSize::Medium => soil_radius::MEDIUM_M,
            SoilSize::Large => soil_radius::LARGE_M,
        }
    }

    /// Sizes whose radius does not exceed `max_radius_m`.
    pub fn fitting(max_radius_m: f64) -> Vec<SoilSize> {
        Self::ALL
            .into_iter()
            .filter(|s| s.radius_m() <= max_radius_m)
            .collect()
    }

    /// Uniform draw among the sizes that fit, or `None` if none do.
    pub fn random(rng: &mut impl Rng, max_radius_m: f64) -> Option<SoilSize> {
        Self::fitting(max_radius_m).choose(rng).copied()
    }
}

/// Physical character of a soil: its type and two jittered attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilMeta {
    pub soil_type: SoilType,
    pub water_retention: f64,
    pub nutrient_richness: f64,
}

impl SoilMeta {
    /// The unjittered attributes of `soil_type`.
    pub fn baseline(soil_type: SoilType) -> Self {
        let (water_retention, nutrient_richness) = soil_type.baseline();
        Self {
            soil_type,
            water_retention,
            nutrient_richness,
        }
    }

    /// `soil_type`'s baseline with each attribute nudged by up to ±0.1 and
    /// clamped to [0.05, 1.00].
    pub fn jittered(rng: &mut impl Rng, soil_type: SoilType) -> Self {
        let (water, nutrients) = soil_type.baseline();
        Self {
            soil_type,
            water_retention: jitter(rng, water),
            nutrient_richness: jitter(rng, nutrients),
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        let soil_type = SoilType::random(rng);
        Self::jittered(rng, soil_type)
    }
}

fn jitter(rng: &mut impl Rng, base: f64) -> f64 {
    let offset = rng.gen_range(-soil_attributes::JITTER..=soil_attributes::JITTER);
    (base + offset).clamp(soil_attributes::MIN, soil_attributes::MAX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Soil {
    pub id: Uuid,
    pub circle: Circle,
    pub meta: SoilMeta,
    pub created_at: DateTime<Utc>,
}

impl Soil {
    pub fn new(id: Uuid, circle: Circle, meta: SoilMeta, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            circle,
            meta,
            created_at,
        }
    }

    pub fn soil_type(&self) -> SoilType {
        self.meta.soil_type
    }

    pub fn centre(&self) -> Coordinates {
        self.circle.centre
    }

    pub fn radius_m(&self) -> f64 {
        self.circle.radius_m
    }
}

/// Largest radius a soil centred on `target` can take without touching
/// `neighbour`, never negative.
pub fn max_clear_radius(target: &Coordinates, neighbour: &Soil) -> f64 {
    let d = target.distance_m(&neighbour.centre());
    (d - neighbour.radius_m() - soil_radius::ALLOCATION_MARGIN_M).max(0.0)
}

/// Produce a soil centred on `target` that overlaps none of `nearby`.
///
/// `nearby` should already be filtered by the caller to soils within
/// [`soil_radius::NEIGHBOUR_QUERY_M`] or so of the target. `max_radius_m`
/// caps every size drawn; `None` leaves the first draw open to all sizes.
pub fn allocate_soil(
    rng: &mut impl Rng,
    target: Coordinates,
    nearby: &[Soil],
    max_radius_m: Option<f64>,
    now: DateTime<Utc>,
) -> GardenResult<Soil> {
    let meta = SoilMeta::random(rng);
    let cap = max_radius_m.unwrap_or(f64::INFINITY);
    let Some(size) = SoilSize::random(rng, cap) else {
        return Err(GardenError::NoSoilGenerated);
    };
    let candidate = Circle::new(target, size.radius_m());

    let overlapping: Vec<&Soil> = nearby
        .iter()
        .filter(|s| candidate.overlaps_with(&s.circle))
        .collect();

    if overlapping.is_empty() {
        debug!("allocated {:?} {} soil without conflicts", size, meta.soil_type);
        return Ok(Soil::new(random_id(rng), candidate, meta, now));
    }

    let bound = overlapping
        .iter()
        .map(|s| max_clear_radius(&target, s))
        .fold(f64::INFINITY, f64::min);

    let Some(size) = SoilSize::random(rng, bound) else {
        debug!(
            "no soil size fits under {:.2}m among {} overlapping soils",
            bound,
            overlapping.len()
        );
        return Err(GardenError::NoSoilGenerated);
    };

    debug!(
        "shrunk soil to {:?} (bound {:.2}m, {} overlapping)",
        size,
        bound,
        overlapping.len()
    );
    Ok(Soil::new(
        random_id(rng),
        Circle::new(target, size.radius_m()),
        meta,
        now,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::geo::EARTH_RADIUS_M;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    fn north_of(origin: Coordinates, metres: f64) -> Coordinates {
        Coordinates::new(origin.lat + (metres / EARTH_RADIUS_M).to_degrees(), origin.lng)
    }

    fn soil_at(centre: Coordinates, radius_m: f64) -> Soil {
        Soil::new(
            Uuid::nil(),
            Circle::new(centre, radius_m),
            SoilMeta::baseline(SoilType::Loam),
            now(),
        )
    }

    #[test]
    fn test_fitting_sizes() {
        assert_eq!(SoilSize::fitting(f64::INFINITY), SoilSize::ALL.to_vec());
        assert_eq!(SoilSize::fitting(22.0), vec![SoilSize::Small, SoilSize::Medium]);
        assert_eq!(SoilSize::fitting(9.9), Vec::<SoilSize>::new());
        assert!(SoilSize::random(&mut StdRng::seed_from_u64(1), 0.0).is_none());
    }

    #[test]
    fn test_random_size_respects_bound() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let size = SoilSize::random(&mut rng, 15.0).unwrap();
            assert_eq!(size, SoilSize::Small);
        }
    }

    #[test]
    fn test_jittered_attributes_in_range() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..500 {
            let meta = SoilMeta::random(&mut rng);
            let (water, nutrients) = meta.soil_type.baseline();
            assert!((0.05..=1.0).contains(&meta.water_retention));
            assert!((0.05..=1.0).contains(&meta.nutrient_richness));
            assert!((meta.water_retention - water).abs() <= 0.1 + 1e-12);
            assert!((meta.nutrient_richness - nutrients).abs() <= 0.1 + 1e-12);
        }
    }

    #[test]
    fn test_soil_type_display() {
        let names: Vec<String> = SoilType::ALL.iter().map(|t| t.to_string()).collect();
        assert_eq!(names, vec!["loam", "sandy", "silt", "clay"]);
    }

    #[test]
    fn test_allocate_without_neighbours_uses_full_set() {
        let mut rng = StdRng::seed_from_u64(21);
        let target = Coordinates::new(40.7828, -73.9653);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let soil = allocate_soil(&mut rng, target, &[], None, now()).unwrap();
            assert_eq!(soil.centre(), target);
            assert_eq!(soil.created_at, now());
            seen.insert(soil.radius_m().to_bits());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_allocate_respects_radius_cap() {
        let target = Coordinates::new(40.7828, -73.9653);
        let mut rng = StdRng::seed_from_u64(21);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let soil = allocate_soil(&mut rng, target, &[], Some(soil_radius::MEDIUM_M), now())
                .unwrap();
            assert!(soil.radius_m() <= soil_radius::MEDIUM_M);
            seen.insert(soil.radius_m().to_bits());
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_allocate_cap_below_smallest_size_fails() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(
            allocate_soil(&mut rng, Coordinates::default(), &[], Some(5.0), now()),
            Err(GardenError::NoSoilGenerated)
        );
    }

    #[test]
    fn test_allocate_far_neighbour_not_shrunk() {
        let origin = Coordinates::new(0.0, 0.0);
        let far = soil_at(north_of(origin, 500.0), soil_radius::LARGE_M);

        let mut with = StdRng::seed_from_u64(77);
        let mut without = StdRng::seed_from_u64(77);
        for _ in 0..50 {
            let a = allocate_soil(&mut with, origin, std::slice::from_ref(&far), None, now())
                .unwrap();
            let b = allocate_soil(&mut without, origin, &[], None, now()).unwrap();
            assert_eq!(a.radius_m(), b.radius_m());
        }
    }

    #[test]
    fn test_allocate_shrinks_to_clear_neighbour() {
        // Neighbour edge sits 20m from the target: only Small (10m) fits.
        let origin = Coordinates::new(0.0, 0.0);
        let neighbour = soil_at(north_of(origin, 30.0), 10.0);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            let soil = allocate_soil(
                &mut rng,
                origin,
                std::slice::from_ref(&neighbour),
                None,
                now(),
            )
            .unwrap();
            assert!(!soil.circle.overlaps_with(&neighbour.circle));
            assert!(soil.radius_m() < 20.0);
        }
    }

    #[test]
    fn test_allocate_never_overlaps_any_input() {
        let origin = Coordinates::new(51.5, -0.12);
        let nearby = vec![
            soil_at(north_of(origin, 45.0), 10.0),
            soil_at(north_of(origin, -60.0), 22.0),
            soil_at(Coordinates::new(51.5, -0.1196), 10.0),
        ];
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..200 {
            if let Ok(soil) = allocate_soil(&mut rng, origin, &nearby, None, now()) {
                for n in &nearby {
                    assert!(!soil.circle.overlaps_with(&n.circle));
                }
            }
        }
    }

    #[test]
    fn test_allocate_fails_when_gap_too_small() {
        let origin = Coordinates::new(0.0, 0.0);
        let crowding = soil_at(north_of(origin, 15.0), 10.0);
        let mut rng = StdRng::seed_from_u64(8);
        let result = allocate_soil(&mut rng, origin, &[crowding], None, now());
        assert_eq!(result, Err(GardenError::NoSoilGenerated));
    }

    #[test]
    fn test_allocate_fails_inside_existing_soil() {
        let origin = Coordinates::new(0.0, 0.0);
        let enclosing = soil_at(origin, soil_radius::LARGE_M);
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(
            allocate_soil(&mut rng, origin, &[enclosing], None, now()),
            Err(GardenError::NoSoilGenerated)
        );
    }

    #[test]
    fn test_max_clear_radius_floors_at_zero() {
        let origin = Coordinates::new(0.0, 0.0);
        let covering = soil_at(north_of(origin, 5.0), 20.0);
        assert_eq!(max_clear_radius(&origin, &covering), 0.0);

        let clear = soil_at(north_of(origin, 40.0), 10.0);
        assert!((max_clear_radius(&origin, &clear) - 29.9).abs() < 1e-6);
    }
}
