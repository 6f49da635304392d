//! Reachability probing and re-initialisation of the relational store.

use thiserror::Error;

use crate::config::DatabaseConfig;

/// The messages mirror what the board shows on the datastore setup page.
#[derive(Debug, Error)]
pub enum DatastoreError {
    #[error("could not connect to database server")]
    Connect(#[source] anyhow::Error),

    #[error("could not select database")]
    SelectDatabase(#[source] anyhow::Error),

    #[error("could not initialise database: {0}")]
    Initialize(String),
}

#[async_trait::async_trait]
pub trait DatastoreAdmin: Send + Sync {
    /// Connects to the server of `target`, then selects its database when
    /// one is named. Never changes any state.
    async fn check(&self, target: &DatabaseConfig) -> Result<(), DatastoreError>;

    /// Recreates the schema on `target`, seeds the admin account and makes
    /// it the live store.
    async fn initialize(&self, target: &DatabaseConfig) -> Result<(), DatastoreError>;
}
