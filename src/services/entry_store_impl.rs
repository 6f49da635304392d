//! `SeaORM` implementation of the `EntryStore` trait.

use crate::db::{EntryInput, Store};
use crate::domain::EntryId;
use crate::entities::entries;
use crate::services::entry_store::EntryStore;
use async_trait::async_trait;

pub struct SeaOrmEntryStore {
    store: Store,
}

impl SeaOrmEntryStore {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EntryStore for SeaOrmEntryStore {
    async fn add(&self, input: EntryInput) -> anyhow::Result<EntryId> {
        self.store.add_entry(input).await
    }

    async fn get(&self, id: EntryId) -> anyhow::Result<Option<entries::Model>> {
        self.store.get_entry(id).await
    }

    async fn update(&self, id: EntryId, input: EntryInput) -> anyhow::Result<bool> {
        self.store.update_entry(id, input).await
    }

    async fn delete(&self, id: EntryId) -> anyhow::Result<bool> {
        self.store.delete_entry(id).await
    }

    async fn list(&self) -> anyhow::Result<Vec<entries::Model>> {
        self.store.list_entries().await
    }
}
