//! Radiosonde profile database.
//!
//! The database is a JSON array of soundings, each carrying its key next to
//! the profile arrays:
//!
//! ```json
//! [
//!   {
//!     "year": 2021, "month": 7, "day": 14, "label": 0,
//!     "temperature": [15.0, 10.0], "pressure": [1000.0, 900.0],
//!     "relative_humidity": [80.0, 70.0], "altitude": [0.1, 1.0]
//!   }
//! ]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::RtmError;
use crate::profile::RawProfile;

/// Identifies one sounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileKey {
    /// Year
    pub year: u16,
    /// Month, 1 to 12
    pub month: u8,
    /// Day of the month
    pub day: u8,
    /// Launch label within the day
    pub label: u32,
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}/{:02}",
            self.year, self.month, self.day, self.label
        )
    }
}

/// Anything that can look up soundings by key.
pub trait ProfileSource {
    /// The sounding for `key`, if there is one.
    fn profile(&self, key: &ProfileKey) -> Option<&RawProfile>;

    /// Every available key, in ascending order.
    fn keys(&self) -> Vec<ProfileKey>;

    /// The sounding for `key`, or an error naming the key.
    fn require(&self, key: &ProfileKey) -> Result<&RawProfile, RtmError> {
        self.profile(key)
            .ok_or_else(|| RtmError::ProfileNotFound(key.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileRecord {
    #[serde(flatten)]
    key: ProfileKey,
    #[serde(flatten)]
    profile: RawProfile,
}

/// Soundings loaded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct ProfileDatabase {
    profiles: BTreeMap<ProfileKey, RawProfile>,
}

impl ProfileDatabase {
    /// Parse the JSON text of a database. A later duplicate key replaces an
    /// earlier one.
    pub fn from_json(text: &str) -> Result<Self, RtmError> {
        let records: Vec<ProfileRecord> = serde_json::from_str(text)?;
        Ok(Self {
            profiles: records.into_iter().map(|r| (r.key, r.profile)).collect(),
        })
    }

    /// Read a database file.
    pub fn load(path: &Path) -> Result<Self, RtmError> {
        let database = Self::from_json(&std::fs::read_to_string(path)?)?;
        debug!(
            "loaded {} profiles from {}",
            database.len(),
            path.display()
        );
        Ok(database)
    }

    /// Add or replace a sounding.
    pub fn insert(&mut self, key: ProfileKey, profile: RawProfile) {
        self.profiles.insert(key, profile);
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &ProfileKey) -> bool {
        self.profiles.contains_key(key)
    }

    /// Number of soundings.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// `true` if there are no soundings.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Encode the database as JSON.
    pub fn to_json(&self) -> Result<String, RtmError> {
        let records: Vec<ProfileRecord> = self
            .profiles
            .iter()
            .map(|(key, profile)| ProfileRecord {
                key: *key,
                profile: profile.clone(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }
}

impl ProfileSource for ProfileDatabase {
    fn profile(&self, key: &ProfileKey) -> Option<&RawProfile> {
        self.profiles.get(key)
    }

    fn keys(&self) -> Vec<ProfileKey> {
        self.profiles.keys().copied().collect()
    }
}
