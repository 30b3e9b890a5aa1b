use async_trait::async_trait;

use crate::models::{Person, Region};

use super::ApiError;

/// Anything that can answer a single item window for a region.
///
/// `start` and `end` are 0-based item offsets, both inclusive. Implementations
/// must be safe to call from many tasks at once.
#[async_trait]
pub trait WindowSource: Send + Sync {
    async fn fetch_window(
        &self,
        region: Region,
        start: u32,
        end: u32,
    ) -> Result<Vec<Person>, ApiError>;
}
