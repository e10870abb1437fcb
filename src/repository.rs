//! Storage of siege records, one per target room.
//!
//! Records are stored as JSON strings under the target room's name so the host
//! can keep them in its persistent memory segment and reload them after a
//! restart.

use crate::record::*;
use fnv::FnvHashMap;
use log::*;
use screeps::RoomName;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("failed to encode siege record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Typed access to campaign records.
pub trait CampaignRepository {
    fn get(&self, target: RoomName) -> Option<SiegeRecord>;

    fn put(&mut self, record: &SiegeRecord) -> Result<(), RepositoryError>;

    fn remove(&mut self, target: RoomName) -> Option<SiegeRecord>;

    /// Target rooms with a stored record, in a stable order.
    fn keys(&self) -> Vec<RoomName>;
}

/// Repository backed by a string map, as held in the host's memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryRepository {
    entries: FnvHashMap<String, String>,
}

impl MemoryRepository {
    pub fn new() -> MemoryRepository {
        MemoryRepository::default()
    }

    /// Wrap previously persisted entries.
    pub fn from_entries(entries: FnvHashMap<String, String>) -> MemoryRepository {
        MemoryRepository { entries }
    }

    pub fn entries(&self) -> &FnvHashMap<String, String> {
        &self.entries
    }

    pub fn into_entries(self) -> FnvHashMap<String, String> {
        self.entries
    }

    fn decode(key: &str, raw: &str) -> Option<SiegeRecord> {
        match serde_json::from_str(raw) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("Ignoring unreadable siege record for {}: {}", key, err);
                None
            }
        }
    }
}

impl CampaignRepository for MemoryRepository {
    fn get(&self, target: RoomName) -> Option<SiegeRecord> {
        let key = target.to_string();
        self.entries.get(&key).and_then(|raw| Self::decode(&key, raw))
    }

    fn put(&mut self, record: &SiegeRecord) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(record)?;
        self.entries.insert(record.target_room.to_string(), raw);
        Ok(())
    }

    fn remove(&mut self, target: RoomName) -> Option<SiegeRecord> {
        let key = target.to_string();
        self.entries.remove(&key).and_then(|raw| Self::decode(&key, &raw))
    }

    fn keys(&self) -> Vec<RoomName> {
        let mut keys: Vec<RoomName> = self
            .entries
            .keys()
            .filter_map(|key| match RoomName::new(key) {
                Ok(name) => Some(name),
                Err(_) => {
                    warn!("Ignoring siege record with invalid room key {}", key);
                    None
                }
            })
            .collect();
        keys.sort_by_key(|name| name.to_string());
        keys
    }
}

/// Declare a campaign against `target`. An existing campaign is left untouched.
/// Returns true if a new campaign was created.
pub fn declare_campaign<R: CampaignRepository + ?Sized>(
    repository: &mut R,
    target: RoomName,
    source: RoomName,
) -> Result<bool, RepositoryError> {
    if repository.get(target).is_some() {
        return Ok(false);
    }

    info!("Declaring siege of {} from {}", target, source);
    repository.put(&SiegeRecord::new(target, source))?;
    Ok(true)
}

/// Remove a campaign declaration and its record. This is the only way to
/// cancel a siege.
pub fn abandon_campaign<R: CampaignRepository + ?Sized>(repository: &mut R, target: RoomName) -> bool {
    let removed = repository.remove(target).is_some();
    if removed {
        info!("Abandoned siege of {}", target);
    }
    removed
}
