//! Scenario configuration and the simulated players that drive a run.
//!
//! A scenario drops a handful of players around a centre point, grants each
//! of them seeds, lets them plant everything they can within `spread_m`, and
//! then steps the clock forward in fixed ticks while every player tends their
//! plants according to a [`CareStyle`].

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use tendril_logic::constants::geo::EARTH_RADIUS_M;
use tendril_logic::geometry::Coordinates;
use tendril_logic::ids::random_id;
use tendril_logic::plant::{refresh_all, PlantAction};
use tendril_logic::seeds::{grant_seeds, random_grant_size};

use crate::store::GardenStore;

/// How a simulated player looks after their plants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareStyle {
    /// Waters whenever the cooldown allows.
    Diligent,
    /// Waters every `casual_interval_hours`.
    Casual,
    /// Never comes back.
    Neglectful,
}

/// 2025-01-01T00:00:00Z
const DEFAULT_START_TS: i64 = 1_735_689_600;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub seed: u64,
    pub players: u32,
    pub days: u32,
    /// Clock step between care rounds, in minutes.
    pub tick_minutes: i64,
    pub centre: Coordinates,
    /// Players plant within this distance of `centre`.
    pub spread_m: f64,
    pub casual_interval_hours: i64,
    /// Assigned to players round-robin.
    pub care_styles: Vec<CareStyle>,
    pub start: DateTime<Utc>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            players: 6,
            days: 20,
            tick_minutes: 30,
            centre: Coordinates::new(40.782865, -73.965355),
            spread_m: 120.0,
            casual_interval_hours: 8,
            care_styles: vec![CareStyle::Diligent, CareStyle::Casual, CareStyle::Neglectful],
            start: DateTime::<Utc>::from_timestamp(DEFAULT_START_TS, 0).unwrap_or_default(),
        }
    }
}

impl ScenarioConfig {
    pub fn tick(&self) -> Duration {
        Duration::minutes(self.tick_minutes)
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::days(self.days as i64)
    }
}

/// Scenario validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NoPlayers,
    NoDays,
    /// Tick must be positive and divide an hour, or be whole hours.
    InvalidTick(i64),
    NonPositiveSpread(f64),
    InvalidCentre { lat: f64, lng: f64 },
    NonPositiveCasualInterval(i64),
    NoCareStyles,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoPlayers => write!(f, "scenario needs at least one player"),
            ConfigError::NoDays => write!(f, "scenario needs at least one day"),
            ConfigError::InvalidTick(m) => write!(f, "tick of {} minutes does not fit an hour", m),
            ConfigError::NonPositiveSpread(s) => write!(f, "spread must be positive, got {}", s),
            ConfigError::InvalidCentre { lat, lng } => {
                write!(f, "centre ({}, {}) is not a valid coordinate", lat, lng)
            }
            ConfigError::NonPositiveCasualInterval(h) => {
                write!(f, "casual interval must be positive, got {}h", h)
            }
            ConfigError::NoCareStyles => write!(f, "at least one care style is required"),
        }
    }
}

/// Validate a scenario, returning every problem found.
pub fn validate_scenario(config: &ScenarioConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.players == 0 {
        errors.push(ConfigError::NoPlayers);
    }
    if config.days == 0 {
        errors.push(ConfigError::NoDays);
    }
    let m = config.tick_minutes;
    if m <= 0 || (60 % m != 0 && m % 60 != 0) {
        errors.push(ConfigError::InvalidTick(m));
    }
    if config.spread_m.is_nan() || config.spread_m <= 0.0 {
        errors.push(ConfigError::NonPositiveSpread(config.spread_m));
    }
    let Coordinates { lat, lng } = config.centre;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        errors.push(ConfigError::InvalidCentre { lat, lng });
    }
    if config.casual_interval_hours <= 0 {
        errors.push(ConfigError::NonPositiveCasualInterval(
            config.casual_interval_hours,
        ));
    }
    if config.care_styles.is_empty() {
        errors.push(ConfigError::NoCareStyles);
    }

    errors
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: Uuid,
    pub style: CareStyle,
}

/// Point `north_m` metres north and `east_m` metres east of `origin`.
pub fn offset(origin: Coordinates, north_m: f64, east_m: f64) -> Coordinates {
    let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
    let dlng = (east_m / (EARTH_RADIUS_M * origin.lat_rad().cos())).to_degrees();
    Coordinates::new(origin.lat + dlat, origin.lng + dlng)
}

/// Uniform point inside the disc of radius `spread_m` around `centre`.
fn random_target(rng: &mut impl Rng, centre: Coordinates, spread_m: f64) -> Coordinates {
    let bearing = rng.gen_range(0.0..std::f64::consts::TAU);
    let distance = spread_m * rng.gen::<f64>().sqrt();
    offset(centre, distance * bearing.cos(), distance * bearing.sin())
}

/// What happened during a run.
#[derive(Debug, Clone, Default)]
pub struct ScenarioOutcome {
    pub players: Vec<Player>,
    pub seeds_granted: usize,
    pub planting_attempts: usize,
    /// Rejected plantings keyed by error message.
    pub rejections: BTreeMap<String, usize>,
    pub waterings: usize,
    pub cooldown_hits: usize,
    /// Plants confirmed right after planting.
    pub activations: usize,
    pub ticks: usize,
    /// HP each plant had right after planting.
    pub initial_hp: BTreeMap<Uuid, f64>,
}

impl ScenarioOutcome {
    pub fn style_of(&self, owner: Uuid) -> Option<CareStyle> {
        self.players.iter().find(|p| p.id == owner).map(|p| p.style)
    }
}

/// Plant every granted seed, then tend the garden until the scenario ends.
///
/// `config` is expected to have passed [`validate_scenario`].
pub fn run_scenario(
    config: &ScenarioConfig,
    rng: &mut impl Rng,
    store: &mut GardenStore,
) -> ScenarioOutcome {
    let mut outcome = ScenarioOutcome::default();
    let start = config.start;

    for i in 0..config.players as usize {
        let style = config.care_styles[i % config.care_styles.len()];
        let player = Player {
            id: random_id(rng),
            style,
        };
        let count = random_grant_size(rng);
        store.insert_seeds(grant_seeds(rng, player.id, count, start));
        outcome.seeds_granted += count;
        outcome.players.push(player);
    }
    info!(
        "granted {} seeds to {} players",
        outcome.seeds_granted,
        outcome.players.len()
    );

    // Planting round
    for index in 0..store.seeds.len() {
        let target = random_target(rng, config.centre, config.spread_m);
        outcome.planting_attempts += 1;
        match store.plant(rng, index, target, start) {
            Ok(plant_id) => {
                if let Some(plant) = store.plant_mut(plant_id) {
                    outcome.initial_hp.insert(plant.id, plant.hp);
                    match plant.activate() {
                        Ok(()) => outcome.activations += 1,
                        Err(e) => debug!("plant {} not activated: {}", plant.id, e),
                    }
                }
            }
            Err(e) => *outcome.rejections.entry(e.to_string()).or_default() += 1,
        }
    }
    info!(
        "planted {} of {} seeds",
        store.plants.len(),
        outcome.planting_attempts
    );

    // Care rounds
    let casual = Duration::hours(config.casual_interval_hours);
    let ticks_per_day = (24 * 60 / config.tick_minutes).max(1) as usize;
    let mut now = start;
    while now < config.end() {
        now += config.tick();
        outcome.ticks += 1;

        for plant in store.plants.iter_mut() {
            let Some(style) = outcome.style_of(plant.owner_id) else {
                continue;
            };
            let wants_water = match style {
                CareStyle::Diligent => plant.can_be_watered(now),
                CareStyle::Casual => plant
                    .last_watered_at
                    .map_or(true, |last| now - last >= casual),
                CareStyle::Neglectful => false,
            };
            if !wants_water {
                continue;
            }

            // Players water standing right on top of their plant.
            match plant.interact(PlantAction::Water, plant.centre(), now) {
                Ok(true) => outcome.waterings += 1,
                Ok(false) => {}
                Err(e) => {
                    debug!("watering {} rejected: {}", plant.id, e);
                    outcome.cooldown_hits += 1;
                }
            }
        }

        let alive = refresh_all(&mut store.plants, now);
        if outcome.ticks % ticks_per_day == 0 {
            debug!("{}: {} of {} plants alive", now, alive, store.plants.len());
        }
    }

    info!(
        "ran {} ticks: {} waterings, {} cooldown hits",
        outcome.ticks, outcome.waterings, outcome.cooldown_hits
    );
    outcome
}
