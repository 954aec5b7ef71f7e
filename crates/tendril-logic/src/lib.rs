//! Pure garden simulation logic for Tendril.
//!
//! Users place virtual plants on circular soil patches anchored to real
//! coordinates, water them, and watch them decay when neglected. This crate
//! holds everything about that which is independent of HTTP, storage, or
//! the wall clock: functions take plain data plus an explicit `now` and an
//! injected RNG, and return plain data for the caller to persist.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | Radii, lifecycle timings, XP rewards, trait bounds |
//! | [`error`] | Typed, recoverable outcomes of rejected operations |
//! | [`garden`] | Planting workflow, overlap checks, nearest-plant listing |
//! | [`geometry`] | Coordinates, haversine distance, circle predicates |
//! | [`ids`] | RNG-driven entity identities |
//! | [`leveling`] | XP accumulation and the quadratic level curve |
//! | [`plant`] | Plant lifecycle: watering, decay, grace periods, death |
//! | [`seeds`] | Seed catalog, issuing, grouping, soil compatibility |
//! | [`soil`] | Soil types, jittered attributes, non-overlapping allocation |
//! | [`temperament`] | Four random personality traits per plant |

pub mod constants;
pub mod error;
pub mod garden;
pub mod geometry;
pub mod ids;
pub mod leveling;
pub mod plant;
pub mod seeds;
pub mod soil;
pub mod temperament;

pub use error::{GardenError, GardenResult};
