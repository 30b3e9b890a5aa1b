//! Data models for the conscript roster.
//!
//! - `Person`: one upstream record, all string fields
//! - `Region`: the six upstream partitions
//! - `ListResponse`, `SearchResponse`: query results

pub mod person;
pub mod region;
pub mod response;

pub use person::Person;
pub use region::{Region, RegionError, RegionInfo};
pub use response::{ListResponse, SearchResponse};
