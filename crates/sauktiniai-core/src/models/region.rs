//! Upstream regions.
//!
//! The upstream service partitions its roster into six independent regions.
//! Data never crosses regions and each one is fetched and cached on its own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("Unknown region: {0} (expected 1-6)")]
    Unknown(i64),

    #[error("Invalid region identifier: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Region {
    Alytus,
    Kaunas,
    Klaipeda,
    Panevezys,
    Siauliai,
    #[default]
    Vilnius,
}

impl Region {
    pub const ALL: [Region; 6] = [
        Region::Alytus,
        Region::Kaunas,
        Region::Klaipeda,
        Region::Panevezys,
        Region::Siauliai,
        Region::Vilnius,
    ];

    pub fn id(self) -> u8 {
        match self {
            Region::Alytus => 1,
            Region::Kaunas => 2,
            Region::Klaipeda => 3,
            Region::Panevezys => 4,
            Region::Siauliai => 5,
            Region::Vilnius => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::Alytus => "Alytus",
            Region::Kaunas => "Kaunas",
            Region::Klaipeda => "Klaipėda",
            Region::Panevezys => "Panevėžys",
            Region::Siauliai => "Šiauliai",
            Region::Vilnius => "Vilnius",
        }
    }

    /// Parse a user-supplied region id, falling back to the default region
    /// for anything missing or out of range.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.trim().parse().unwrap_or_default()
    }

    pub fn info(self) -> RegionInfo {
        RegionInfo {
            id: self.id(),
            name: self.name().to_string(),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}

impl TryFrom<i64> for Region {
    type Error = RegionError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Region::ALL
            .into_iter()
            .find(|r| i64::from(r.id()) == id)
            .ok_or(RegionError::Unknown(id))
    }
}

impl TryFrom<u8> for Region {
    type Error = RegionError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Region::try_from(i64::from(id))
    }
}

impl From<Region> for u8 {
    fn from(region: Region) -> Self {
        region.id()
    }
}

impl std::str::FromStr for Region {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: i64 = s
            .trim()
            .parse()
            .map_err(|_| RegionError::Invalid(s.to_string()))?;
        Region::try_from(id)
    }
}

/// Region id and display name, as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RegionInfo {
    pub id: u8,
    pub name: String,
}
