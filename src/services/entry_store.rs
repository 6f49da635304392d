//! Port for substitution entries.

use crate::db::EntryInput;
use crate::domain::EntryId;
use crate::entities::entries;

#[async_trait::async_trait]
pub trait EntryStore: Send + Sync {
    async fn add(&self, input: EntryInput) -> anyhow::Result<EntryId>;

    async fn get(&self, id: EntryId) -> anyhow::Result<Option<entries::Model>>;

    /// Replaces all nine fields; `false` if the id is unknown.
    async fn update(&self, id: EntryId, input: EntryInput) -> anyhow::Result<bool>;

    async fn delete(&self, id: EntryId) -> anyhow::Result<bool>;

    async fn list(&self) -> anyhow::Result<Vec<entries::Model>>;
}
