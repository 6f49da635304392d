use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use crate::auth::{BoundAddress, Privilege};
use crate::config::SecurityConfig;
use crate::domain::{EntryId, UserId};
use crate::entities::entries;
use crate::services::credential_store::UserRecord;

pub mod migrator;
pub mod repositories;

pub use repositories::entry::EntryInput;

/// Name of the account seeded into an empty user table.
pub const BOOTSTRAP_ADMIN_NAME: &str = "admin";

/// Handle to the relational store.
///
/// Clones share the live connection, so [`Store::replace`] switches every
/// holder to the new target at once.
#[derive(Clone)]
pub struct Store {
    conn: Arc<RwLock<DatabaseConnection>>,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        let conn = Self::connect(db_url, max_connections, min_connections).await?;

        migrator::Migrator::up(&conn, None)
            .await
            .context("Failed to apply migrations")?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self {
            conn: Arc::new(RwLock::new(conn)),
        })
    }

    /// Opens a pool without touching the schema.
    pub async fn connect(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<DatabaseConnection> {
        if let Some(path_str) = db_url.strip_prefix("sqlite:")
            && !path_str.starts_with(":memory:")
        {
            let path_str = path_str.trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file {path_str}"))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        Ok(Database::connect(opt).await?)
    }

    pub async fn conn(&self) -> DatabaseConnection {
        self.conn.read().await.clone()
    }

    /// Swaps the live connection. Requests already holding a clone of the
    /// old pool finish against it.
    pub async fn replace(&self, conn: DatabaseConnection) {
        *self.conn.write().await = conn;
        info!("Live datastore connection replaced");
    }

    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn().await;
        let backend = conn.get_database_backend();
        conn.query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Creates the `admin` account if the user table is empty.
    pub async fn bootstrap_admin(&self, password: &str, security: &SecurityConfig) -> Result<bool> {
        if self.count_users().await? > 0 {
            return Ok(false);
        }

        self.user_repo()
            .await
            .create(BOOTSTRAP_ADMIN_NAME, password, Privilege::Admin, security)
            .await
            .context("Failed to seed admin account")?;

        info!("Seeded bootstrap admin account");
        Ok(true)
    }

    /// Drops and recreates every table on `conn`, then seeds the admin
    /// account. Used when a new datastore is configured during setup.
    pub async fn reset_tables(
        conn: &DatabaseConnection,
        admin_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        migrator::Migrator::fresh(conn)
            .await
            .context("Failed to recreate tables")?;

        repositories::user::UserRepository::new(conn.clone())
            .create(BOOTSTRAP_ADMIN_NAME, admin_password, Privilege::Admin, security)
            .await
            .context("Failed to seed admin account")?;

        info!("Tables recreated on new datastore");
        Ok(())
    }

    async fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn().await)
    }

    async fn entry_repo(&self) -> repositories::entry::EntryRepository {
        repositories::entry::EntryRepository::new(self.conn().await)
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<UserRecord>> {
        self.user_repo().await.get_by_token(token).await
    }

    pub async fn get_user_by_name(&self, name: &str) -> Result<Option<UserRecord>> {
        self.user_repo().await.get_by_name(name).await
    }

    pub async fn get_user_by_name_with_password(
        &self,
        name: &str,
    ) -> Result<Option<(UserRecord, String)>> {
        self.user_repo().await.get_by_name_with_password(name).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>> {
        self.user_repo().await.get_by_id(id).await
    }

    pub async fn get_user_password_hash(&self, id: UserId) -> Result<Option<String>> {
        self.user_repo().await.get_password_hash(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        self.user_repo().await.list().await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().await.count().await
    }

    pub async fn create_user(
        &self,
        name: &str,
        password: &str,
        privilege: Privilege,
        security: &SecurityConfig,
    ) -> Result<UserId> {
        self.user_repo()
            .await
            .create(name, password, privilege, security)
            .await
    }

    pub async fn update_user_name(&self, id: UserId, name: &str) -> Result<bool> {
        self.user_repo().await.update_name(id, name).await
    }

    pub async fn update_user_password(
        &self,
        id: UserId,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<bool> {
        self.user_repo()
            .await
            .update_password(id, password, security)
            .await
    }

    pub async fn update_user_privilege(&self, id: UserId, privilege: Privilege) -> Result<bool> {
        self.user_repo().await.update_privilege(id, privilege).await
    }

    pub async fn delete_user(&self, id: UserId) -> Result<bool> {
        self.user_repo().await.delete(id).await
    }

    pub async fn set_user_session(
        &self,
        id: UserId,
        token: &str,
        address: BoundAddress,
    ) -> Result<bool> {
        self.user_repo().await.set_session(id, token, address).await
    }

    pub async fn clear_user_session(&self, id: UserId) -> Result<bool> {
        self.user_repo().await.clear_session(id).await
    }

    pub async fn clear_session_by_token(&self, token: &str) -> Result<u64> {
        self.user_repo().await.clear_session_by_token(token).await
    }

    // ========================================================================
    // Entries
    // ========================================================================

    pub async fn add_entry(&self, input: EntryInput) -> Result<EntryId> {
        self.entry_repo().await.add(input).await
    }

    pub async fn get_entry(&self, id: EntryId) -> Result<Option<entries::Model>> {
        self.entry_repo().await.get(id).await
    }

    pub async fn update_entry(&self, id: EntryId, input: EntryInput) -> Result<bool> {
        self.entry_repo().await.update(id, input).await
    }

    pub async fn delete_entry(&self, id: EntryId) -> Result<bool> {
        self.entry_repo().await.delete(id).await
    }

    pub async fn list_entries(&self) -> Result<Vec<entries::Model>> {
        self.entry_repo().await.list().await
    }
}
