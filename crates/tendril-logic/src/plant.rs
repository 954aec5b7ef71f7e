//! Plant lifecycle: planting, watering, passive decay, grace periods, death.
//!
//! A plant is in one of three states:
//!
//! - **Alive, in grace**: watered recently; decay intervals that end on or
//!   before `grace_period_ends_at` cost nothing.
//! - **Alive, normal**: loses 1 HP per complete 4-hour decay interval.
//! - **Dead**: terminal. HP is 0 and nothing changes it again.
//!
//! Grace is derived from the stored timestamps, not stored as a state.
//! Every time-dependent operation takes `now` explicitly, and every action
//! catches decay up before doing anything else.
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use rand::{rngs::StdRng, SeedableRng};
//! use tendril_logic::geometry::{Circle, Coordinates};
//! use tendril_logic::plant::Plant;
//! use tendril_logic::seeds::Seed;
//! use tendril_logic::soil::{Soil, SoilMeta, SoilType};
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let t0 = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
//! let spot = Coordinates::new(51.5, -0.12);
//! let soil = Soil::new(
//!     uuid::Uuid::nil(),
//!     Circle::new(spot, 22.0),
//!     SoilMeta::baseline(SoilType::Loam),
//!     t0,
//! );
//! let mut seed = Seed::new(&mut rng, uuid::Uuid::nil(), t0);
//!
//! let mut plant = Plant::new(&mut rng, &mut seed, &soil, spot, t0).unwrap();
//! assert!(seed.planted);
//! assert!(plant.water(t0 + Duration::hours(1)).unwrap());
//! assert!(!plant.can_be_watered(t0 + Duration::hours(2)));
//! ```

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{lifecycle, plant as consts};
use crate::error::{GardenError, GardenResult};
use crate::geometry::{Circle, Coordinates};
use crate::ids::random_id;
use crate::leveling::LevelMeta;
use crate::seeds::{Seed, SeedSpecies, SoilMatch};
use crate::soil::Soil;
use crate::temperament::Temperament;

/// Something a user can do to a plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlantAction {
    Water,
}

impl PlantAction {
    /// Wire code used by clients.
    pub fn code(self) -> i64 {
        match self {
            PlantAction::Water => 1,
        }
    }

    pub fn from_code(code: i64) -> GardenResult<Self> {
        match code {
            1 => Ok(PlantAction::Water),
            other => Err(GardenError::InvalidAction(other)),
        }
    }
}

/// Lifecycle state derived from a plant's fields at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantState {
    AliveInGrace,
    AliveNormal,
    Dead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: Uuid,
    pub nickname: String,
    pub owner_id: Uuid,
    pub soil_id: Uuid,
    /// Interaction footprint, always [`consts::INTERACTION_RADIUS_M`] wide.
    pub circle: Circle,
    pub hp: f64,
    pub dead: bool,
    pub activated: bool,
    pub species: SeedSpecies,
    pub level: LevelMeta,
    pub temperament: Temperament,
    pub time_planted: DateTime<Utc>,
    pub last_watered_at: Option<DateTime<Utc>>,
    pub last_action_at: DateTime<Utc>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub grace_period_ends_at: Option<DateTime<Utc>>,
    pub time_of_death: Option<DateTime<Utc>>,
}

/// The interaction circle a plant centred on `centre` would have.
pub fn interaction_circle(centre: Coordinates) -> Circle {
    Circle::new(centre, consts::INTERACTION_RADIUS_M)
}

impl Plant {
    /// Plant `seed` at `centre` inside `soil`.
    ///
    /// Fails with [`GardenError::SeedAlreadyPlanted`] if the seed was used
    /// before, or [`GardenError::InvalidSpatialFit`] if the interaction
    /// circle is not fully inside the soil. On success the seed is marked
    /// planted. Overlap with neighbouring plants is the caller's check; see
    /// [`crate::garden::site_is_clear`].
    pub fn new(
        rng: &mut impl Rng,
        seed: &mut Seed,
        soil: &Soil,
        centre: Coordinates,
        now: DateTime<Utc>,
    ) -> GardenResult<Self> {
        if seed.planted {
            return Err(GardenError::SeedAlreadyPlanted);
        }

        let circle = interaction_circle(centre);
        if !soil.circle.contains_full_circle(&circle) {
            return Err(GardenError::InvalidSpatialFit);
        }

        let (hp_offset, bonus_xp) = match seed.species.soil_match(soil.soil_type()) {
            SoilMatch::Optimal => (consts::OPTIMAL_SOIL_HP_BONUS, consts::OPTIMAL_SOIL_XP_BONUS),
            SoilMatch::Compatible => (consts::COMPATIBLE_SOIL_HP_BONUS, 0),
            SoilMatch::Incompatible => (consts::INCOMPATIBLE_SOIL_HP_PENALTY, 0),
        };

        let plant = Self {
            id: random_id(rng),
            nickname: seed.species.common_name.clone(),
            owner_id: seed.owner_id,
            soil_id: soil.id,
            circle,
            hp: (seed.hp + hp_offset).clamp(consts::MIN_HP, consts::MAX_HP),
            dead: false,
            activated: false,
            species: seed.species.clone(),
            level: LevelMeta::with_bonus(bonus_xp),
            temperament: Temperament::random(rng),
            time_planted: now,
            last_watered_at: None,
            last_action_at: now,
            last_refreshed_at: None,
            grace_period_ends_at: None,
            time_of_death: None,
        };

        seed.mark_planted()?;
        info!(
            "planted {} ({}) in {} soil with {} hp",
            plant.id,
            plant.species.botanical_name,
            soil.soil_type(),
            plant.hp
        );
        Ok(plant)
    }

    pub fn centre(&self) -> Coordinates {
        self.circle.centre
    }

    pub fn state(&self, now: DateTime<Utc>) -> PlantState {
        if self.dead {
            PlantState::Dead
        } else if self.is_in_grace_period(now) {
            PlantState::AliveInGrace
        } else {
            PlantState::AliveNormal
        }
    }

    // ── Derived queries ─────────────────────────────────────────────────

    pub fn is_in_grace_period(&self, now: DateTime<Utc>) -> bool {
        self.grace_period_ends_at.is_some_and(|end| now < end)
    }

    /// True when alive and either never watered or off cooldown.
    pub fn can_be_watered(&self, now: DateTime<Utc>) -> bool {
        !self.dead && self.time_until_next_watering(now) == Duration::zero()
    }

    /// Remaining cooldown, zero once watering is allowed again.
    pub fn time_until_next_watering(&self, now: DateTime<Utc>) -> Duration {
        match self.last_watered_at {
            Some(last) => (last + lifecycle::watering_cooldown() - now).max(Duration::zero()),
            None => Duration::zero(),
        }
    }

    /// Remaining grace, zero when none is open.
    pub fn time_until_grace_period_ends(&self, now: DateTime<Utc>) -> Duration {
        match self.grace_period_ends_at {
            Some(end) => (end - now).max(Duration::zero()),
            None => Duration::zero(),
        }
    }

    // ── Health ──────────────────────────────────────────────────────────

    /// Apply `delta` to HP, clamped to [0, 100]. Hitting 0 kills the plant.
    fn change_hp(&mut self, delta: f64, now: DateTime<Utc>) {
        if self.dead {
            return;
        }
        self.hp = (self.hp + delta).clamp(consts::MIN_HP, consts::MAX_HP);
        if self.hp <= consts::MIN_HP {
            self.die(now);
        }
    }

    fn die(&mut self, now: DateTime<Utc>) {
        self.hp = consts::MIN_HP;
        self.dead = true;
        self.time_of_death = Some(now);
        self.grace_period_ends_at = None;
        info!("plant {} died at {}", self.id, now);
    }

    /// Explicitly kill the plant. Killing twice is rejected.
    pub fn kill(&mut self, now: DateTime<Utc>) -> GardenResult<()> {
        if self.dead {
            return Err(GardenError::AlreadyDead);
        }
        self.die(now);
        Ok(())
    }

    // ── Decay ───────────────────────────────────────────────────────────

    /// Catch passive decay up to `now`.
    ///
    /// No-op when dead, or when the previous refresh was less than the
    /// minimum refresh interval ago. Otherwise charges every decay interval
    /// that completed since the last checkpoint and ends after the open
    /// grace period. Returns whether the plant is alive.
    ///
    /// Interval boundaries sit on a fixed grid anchored at `time_planted`, so
    /// frequent refreshes never swallow partially elapsed intervals.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        if self.dead {
            return false;
        }
        if let Some(last) = self.last_refreshed_at {
            if now - last < lifecycle::min_refresh_interval() {
                return true;
            }
        }
        self.catch_up(now)
    }

    /// Unthrottled decay walk from the checkpoint (`last_refreshed_at`, else
    /// `time_planted`) to `now`. Does nothing when `now` is before the
    /// checkpoint.
    fn catch_up(&mut self, now: DateTime<Utc>) -> bool {
        if self.dead {
            return false;
        }
        let checkpoint = self.last_refreshed_at.unwrap_or(self.time_planted);
        if now < checkpoint {
            return true;
        }

        let interval = lifecycle::decay_interval();
        let step = interval.num_seconds();
        let completed = (checkpoint - self.time_planted).num_seconds().max(0) / step;
        let mut boundary = self.time_planted + Duration::seconds((completed + 1) * step);
        let mut charged = 0;
        let mut shielded = 0;
        while boundary <= now {
            if self.grace_period_ends_at.is_some_and(|end| boundary <= end) {
                shielded += 1;
            } else {
                self.change_hp(-consts::DECAY_HP_PER_INTERVAL, now);
                charged += 1;
                if self.dead {
                    break;
                }
            }
            boundary += interval;
        }

        if charged > 0 || shielded > 0 {
            debug!(
                "plant {} decay: {} intervals charged, {} shielded, hp now {}",
                self.id, charged, shielded, self.hp
            );
        }
        self.last_refreshed_at = Some(now);
        !self.dead
    }

    // ── Actions ─────────────────────────────────────────────────────────

    /// Water the plant.
    ///
    /// Decay is caught up first, ignoring the refresh throttle. Returns `Ok(false)` if the plant is (or
    /// has just become) dead, `Ok(true)` on success, or
    /// [`GardenError::InCooldown`] with the remaining wait. A rejected
    /// watering changes nothing beyond the caught-up decay.
    pub fn water(&mut self, now: DateTime<Utc>) -> GardenResult<bool> {
        if !self.catch_up(now) {
            return Ok(false);
        }

        let remaining = self.time_until_next_watering(now);
        if remaining > Duration::zero() {
            return Err(GardenError::InCooldown { remaining });
        }

        self.level.add_xp(consts::WATERING_XP_GAIN);
        self.change_hp(consts::WATERING_HP_GAIN, now);
        self.last_watered_at = Some(now);
        self.grace_period_ends_at = Some(now + lifecycle::grace_period());
        self.last_action_at = now;
        Ok(true)
    }

    pub fn act(&mut self, action: PlantAction, now: DateTime<Utc>) -> GardenResult<bool> {
        match action {
            PlantAction::Water => self.water(now),
        }
    }

    /// Perform `action` on behalf of a user standing at `user_position`,
    /// who must be strictly inside the plant's interaction circle.
    pub fn interact(
        &mut self,
        action: PlantAction,
        user_position: Coordinates,
        now: DateTime<Utc>,
    ) -> GardenResult<bool> {
        if !self.circle.contains_point(&user_position) {
            return Err(GardenError::OutsideInteractionRadius);
        }
        self.act(action, now)
    }

    /// Confirm a freshly planted plant. Only allowed once.
    pub fn activate(&mut self) -> GardenResult<()> {
        if self.activated {
            return Err(GardenError::AlreadyActivated);
        }
        self.activated = true;
        Ok(())
    }

    pub fn rename(&mut self, nickname: &str) -> GardenResult<()> {
        let trimmed = nickname.trim();
        if trimmed.is_empty() {
            return Err(GardenError::EmptyNickname);
        }
        self.nickname = trimmed.to_string();
        Ok(())
    }
}

/// Refresh every plant to `now`. Returns how many are still alive.
pub fn refresh_all(plants: &mut [Plant], now: DateTime<Utc>) -> usize {
    plants
        .iter_mut()
        .map(|p| p.refresh(now))
        .filter(|&alive| alive)
        .count()
}
