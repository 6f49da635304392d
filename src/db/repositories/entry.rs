use crate::domain::EntryId;
use crate::entities::{entries, prelude::*};
use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::Serialize;
use tracing::info;

/// The nine text columns of an entry, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryInput {
    pub time: String,
    pub teacher: String,
    pub course: String,
    pub subject: String,
    pub duration: String,
    pub sub: String,
    pub change: String,
    pub oldroom: String,
    pub newroom: String,
}

impl EntryInput {
    pub const FIELDS: [&'static str; 9] = [
        "time", "teacher", "course", "subject", "duration", "sub", "change", "oldroom", "newroom",
    ];

    fn apply(self, active: &mut entries::ActiveModel) {
        active.time = Set(Some(self.time));
        active.teacher = Set(Some(self.teacher));
        active.course = Set(Some(self.course));
        active.subject = Set(Some(self.subject));
        active.duration = Set(Some(self.duration));
        active.sub = Set(Some(self.sub));
        active.change = Set(Some(self.change));
        active.oldroom = Set(Some(self.oldroom));
        active.newroom = Set(Some(self.newroom));
    }
}

/// Repository for substitution entries
pub struct EntryRepository {
    conn: DatabaseConnection,
}

impl EntryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(&self, input: EntryInput) -> Result<EntryId> {
        let mut active = entries::ActiveModel::default();
        input.apply(&mut active);

        let res = Entries::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to insert entry")?;
        info!(entry_id = res.last_insert_id, "Added entry");
        Ok(EntryId::new(res.last_insert_id))
    }

    pub async fn get(&self, id: EntryId) -> Result<Option<entries::Model>> {
        Entries::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query entry")
    }

    /// Replaces all nine fields. Returns `false` if the id is unknown.
    pub async fn update(&self, id: EntryId, input: EntryInput) -> Result<bool> {
        let Some(existing) = self.get(id).await? else {
            return Ok(false);
        };

        let mut active: entries::ActiveModel = existing.into();
        input.apply(&mut active);
        Entries::update(active)
            .exec(&self.conn)
            .await
            .context("Failed to update entry")?;

        Ok(true)
    }

    pub async fn delete(&self, id: EntryId) -> Result<bool> {
        let res = Entries::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete entry")?;

        Ok(res.rows_affected > 0)
    }

    pub async fn list(&self) -> Result<Vec<entries::Model>> {
        Entries::find()
            .order_by_asc(entries::Column::Time)
            .order_by_asc(entries::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list entries")
    }
}
