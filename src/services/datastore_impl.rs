//! `SeaORM` implementation of the `DatastoreAdmin` trait.

use anyhow::Context;
use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use tracing::{info, warn};

use crate::config::{DatabaseConfig, GeneralConfig, SecurityConfig};
use crate::db::Store;
use crate::services::datastore::{DatastoreAdmin, DatastoreError};

pub struct SeaOrmDatastoreAdmin {
    store: Store,
    general: GeneralConfig,
    security: SecurityConfig,
}

impl SeaOrmDatastoreAdmin {
    #[must_use]
    pub const fn new(store: Store, general: GeneralConfig, security: SecurityConfig) -> Self {
        Self {
            store,
            general,
            security,
        }
    }
}

/// Quotes a MySQL identifier.
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

async fn select_database(conn: &DatabaseConnection, base: &str) -> anyhow::Result<()> {
    let backend = conn.get_database_backend();
    conn.execute(Statement::from_string(
        backend,
        format!("USE {}", quote_identifier(base)),
    ))
    .await
    .with_context(|| format!("USE {base} failed"))?;
    Ok(())
}

/// Connects to the server of `target`, then selects its database when one
/// is named.
pub async fn probe(target: &DatabaseConfig) -> Result<(), DatastoreError> {
    let conn = Store::connect(&target.server_url(), 1, 1)
        .await
        .map_err(DatastoreError::Connect)?;

    let selected = if target.is_sqlite() || target.base.is_empty() {
        Ok(())
    } else {
        select_database(&conn, &target.base)
            .await
            .map_err(DatastoreError::SelectDatabase)
    };

    if let Err(e) = conn.close().await {
        warn!(error = %e, "Failed to close probe connection");
    }

    selected
}

#[async_trait]
impl DatastoreAdmin for SeaOrmDatastoreAdmin {
    async fn check(&self, target: &DatabaseConfig) -> Result<(), DatastoreError> {
        probe(target).await
    }

    async fn initialize(&self, target: &DatabaseConfig) -> Result<(), DatastoreError> {
        let conn = Store::connect(
            &target.database_url(),
            self.general.max_db_connections,
            self.general.min_db_connections,
        )
        .await
        .map_err(DatastoreError::Connect)?;

        Store::reset_tables(
            &conn,
            &self.security.bootstrap_admin_password,
            &self.security,
        )
        .await
        .map_err(|e| DatastoreError::Initialize(format!("{e:#}")))?;

        self.store.replace(conn).await;
        info!(host = %target.host, base = %target.base, "Switched to new datastore");
        Ok(())
    }
}
