//! Game constants: radii, lifecycle timings, XP rewards, trait bounds.
//!
//! These are plain numeric constants with no database dependency. Both the
//! planting workflow and the headless simtest read them from here. Time
//! spans are stored as whole seconds; use the accessor functions in
//! [`lifecycle`] when a [`chrono::Duration`] is needed.

pub mod geo {
    /// Earth radius used by the haversine formula, in metres.
    pub const EARTH_RADIUS_M: f64 = 6.378e6;
}

pub mod soil_radius {
    pub const SMALL_M: f64 = 10.0;
    pub const MEDIUM_M: f64 = 22.0;
    pub const LARGE_M: f64 = 35.0;

    /// Gap kept between a freshly allocated soil and its neighbours so the
    /// two footprints never end up tangential.
    pub const ALLOCATION_MARGIN_M: f64 = 0.1;

    /// Radius callers should use when loading soils around a planting target.
    pub const NEIGHBOUR_QUERY_M: f64 = LARGE_M;
}

pub mod soil_attributes {
    /// Maximum random offset applied to a soil type's baseline attributes.
    pub const JITTER: f64 = 0.1;
    pub const MIN: f64 = 0.05;
    pub const MAX: f64 = 1.0;
}

pub mod plant {
    /// Radius of the circle a user must stand inside to act on a plant.
    pub const INTERACTION_RADIUS_M: f64 = 5.0;

    /// Radius callers should use when loading plants around a planting target.
    pub const NEIGHBOUR_QUERY_M: f64 = INTERACTION_RADIUS_M + 1.0;

    pub const MAX_HP: f64 = 100.0;
    pub const MIN_HP: f64 = 0.0;

    /// Starting health of a freshly issued seed.
    pub const SEED_BASE_HP: f64 = 50.0;

    // Soil compatibility adjustments applied at planting.
    pub const OPTIMAL_SOIL_HP_BONUS: f64 = 15.0;
    pub const OPTIMAL_SOIL_XP_BONUS: i64 = 25;
    pub const COMPATIBLE_SOIL_HP_BONUS: f64 = 5.0;
    pub const INCOMPATIBLE_SOIL_HP_PENALTY: f64 = -5.0;

    pub const WATERING_XP_GAIN: i64 = 30;
    pub const WATERING_HP_GAIN: f64 = 5.0;
    pub const DECAY_HP_PER_INTERVAL: f64 = 1.0;
}

pub mod lifecycle {
    use chrono::Duration;

    const HOUR_SECS: i64 = 60 * 60;

    pub const DECAY_INTERVAL_SECS: i64 = 4 * HOUR_SECS;
    pub const WATERING_COOLDOWN_SECS: i64 = 3 * HOUR_SECS;
    pub const GRACE_PERIOD_SECS: i64 = 4 * HOUR_SECS;
    pub const MIN_REFRESH_INTERVAL_SECS: i64 = 5 * 60;

    pub fn decay_interval() -> Duration {
        Duration::seconds(DECAY_INTERVAL_SECS)
    }

    pub fn watering_cooldown() -> Duration {
        Duration::seconds(WATERING_COOLDOWN_SECS)
    }

    pub fn grace_period() -> Duration {
        Duration::seconds(GRACE_PERIOD_SECS)
    }

    pub fn min_refresh_interval() -> Duration {
        Duration::seconds(MIN_REFRESH_INTERVAL_SECS)
    }
}

pub mod leveling {
    pub const STARTING_LEVEL: i64 = 1;
    /// Coefficient of the quadratic XP curve `round(k * (n² − n))`.
    pub const XP_CURVE_COEFFICIENT: f64 = 75.0;
}

pub mod temperament {
    /// Exclusive upper bound for every temperament trait.
    pub const MAX_VALUE: i64 = 6;
}

pub mod seeds {
    /// Inclusive bounds on how many seeds a single grant hands out.
    pub const GRANT_MIN: usize = 5;
    pub const GRANT_MAX: usize = 10;
}
