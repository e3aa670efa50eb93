//! Storage port.
//!
//! Projects and playthroughs persist as JSON documents under string keys; the
//! backend only needs save/load/delete and a prefix listing.

use async_trait::async_trait;
use serde_json::Value;

use super::error::RepoError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<Value>, RepoError>;
    async fn save(&self, key: &str, value: Value) -> Result<(), RepoError>;
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), RepoError>;
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, RepoError>;
}
