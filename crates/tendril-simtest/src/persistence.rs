//! Save/load for harness garden snapshots.
//!
//! Uses bincode for a compact binary dump of the whole store. Soils, seeds,
//! and plants are written as-is; the snapshot carries a format version and
//! the simulated instant it was taken at.

use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tendril_logic::plant::Plant;
use tendril_logic::seeds::Seed;
use tendril_logic::soil::Soil;

use crate::store::GardenStore;

/// Version number for snapshot format (increment when format changes)
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Simulated time the snapshot was taken at
    pub taken_at: DateTime<Utc>,
    pub soils: Vec<Soil>,
    pub seeds: Vec<Seed>,
    pub plants: Vec<Plant>,
}

/// Write `store` to `writer` as a snapshot taken at `taken_at`.
pub fn save_garden<W: Write>(
    writer: W,
    store: &GardenStore,
    taken_at: DateTime<Utc>,
) -> Result<(), SaveError> {
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        taken_at,
        soils: store.soils.clone(),
        seeds: store.seeds.clone(),
        plants: store.plants.clone(),
    };

    bincode::serialize_into(writer, &snapshot)?;
    Ok(())
}

/// Result of loading a snapshot
#[derive(Debug)]
pub struct LoadedGarden {
    pub store: GardenStore,
    pub taken_at: DateTime<Utc>,
}

/// Load a snapshot from a reader
pub fn load_garden<R: Read>(reader: R) -> Result<LoadedGarden, SaveError> {
    let snapshot: Snapshot = bincode::deserialize_from(reader)?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found: snapshot.version,
        });
    }

    Ok(LoadedGarden {
        store: GardenStore {
            soils: snapshot.soils,
            seeds: snapshot.seeds,
            plants: snapshot.plants,
        },
        taken_at: snapshot.taken_at,
    })
}

/// Errors that can occur during save/load
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("Snapshot version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tendril_logic::geometry::Coordinates;
    use tendril_logic::seeds::grant_seeds;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, 18, 0, 0).unwrap()
    }

    fn sample_store() -> GardenStore {
        let mut rng = StdRng::seed_from_u64(11);
        let mut store = GardenStore::default();
        store.insert_seeds(grant_seeds(&mut rng, Uuid::from_u128(3), 4, now()));
        store
            .plant(&mut rng, 0, Coordinates::new(35.6586, 139.7454), now())
            .unwrap();
        store.plants[0].water(now() + Duration::hours(1)).unwrap();
        store
    }

    #[test]
    fn test_save_load_roundtrip() {
        let store = sample_store();

        let mut buffer = Vec::new();
        save_garden(&mut buffer, &store, now()).expect("Save failed");
        let loaded = load_garden(&buffer[..]).expect("Load failed");

        assert_eq!(loaded.taken_at, now());
        assert_eq!(loaded.store, store);
        assert_eq!(loaded.store.stats(), store.stats());
    }

    #[test]
    fn test_unknown_version_rejected() {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION + 1,
            taken_at: now(),
            soils: vec![],
            seeds: vec![],
            plants: vec![],
        };
        let buffer = bincode::serialize(&snapshot).unwrap();

        match load_garden(&buffer[..]) {
            Err(SaveError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SNAPSHOT_VERSION);
                assert_eq!(found, SNAPSHOT_VERSION + 1);
            }
            other => panic!("expected version mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_save_error_messages() {
        let mismatch = SaveError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found: 7,
        };
        assert_eq!(
            mismatch.to_string(),
            "Snapshot version mismatch: expected 1, found 7"
        );

        let io: SaveError =
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read").into();
        assert!(matches!(io, SaveError::Io(_)));
        assert_eq!(io.to_string(), "IO error: short read");
    }

    #[test]
    fn test_truncated_snapshot_is_an_error() {
        let mut buffer = Vec::new();
        save_garden(&mut buffer, &sample_store(), now()).unwrap();
        buffer.truncate(buffer.len() / 2);
        assert!(matches!(load_garden(&buffer[..]), Err(SaveError::Bincode(_))));
    }
}
