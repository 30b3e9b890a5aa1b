//! Query results handed to the routing layer.
//!
//! Field names match the JSON the web frontend already consumes.

use serde::{Deserialize, Serialize};

use super::{Person, Region};

/// One page of a region listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ListResponse {
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub region: Region,
    pub start: usize,
    pub count: usize,
    pub total: usize,
    pub persons: Vec<Person>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SearchResponse {
    pub query: String,
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub region: Region,
    pub count: usize,
    pub persons: Vec<Person>,
}
