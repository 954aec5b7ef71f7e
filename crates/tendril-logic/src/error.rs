//! Typed outcomes for rejected garden operations.
//!
//! Every variant is an expected, recoverable condition. Callers map them to
//! user-facing responses; none of them indicates a programming error.

use chrono::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GardenError {
    #[error("planting target is not fully inside the chosen soil")]
    InvalidSpatialFit,

    #[error("planting target overlaps an existing plant")]
    SiteOccupied,

    #[error("seed already planted")]
    SeedAlreadyPlanted,

    #[error("plant is in cooldown for another {}s", remaining.num_seconds())]
    InCooldown { remaining: Duration },

    #[error("no soil could be generated at this location")]
    NoSoilGenerated,

    #[error("plant already dead")]
    AlreadyDead,

    #[error("user is not within the plant's interaction radius")]
    OutsideInteractionRadius,

    #[error("plant already activated")]
    AlreadyActivated,

    #[error("invalid plant action: {0}")]
    InvalidAction(i64),

    #[error("nickname must not be empty")]
    EmptyNickname,
}

pub type GardenResult<T> = Result<T, GardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_message_reports_seconds() {
        let err = GardenError::InCooldown {
            remaining: Duration::minutes(90),
        };
        assert_eq!(err.to_string(), "plant is in cooldown for another 5400s");
    }

    #[test]
    fn test_invalid_action_message() {
        assert_eq!(
            GardenError::InvalidAction(7).to_string(),
            "invalid plant action: 7"
        );
    }
}
