use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::actions::{Dispatcher, Handlers};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    ConfigFile, CredentialStore, DatastoreAdmin, EntryStore, SeaOrmCredentialStore,
    SeaOrmDatastoreAdmin, SeaOrmEntryStore, SettingsStore,
};

/// Everything a request needs, wired once at startup.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub credentials: Arc<dyn CredentialStore>,

    pub entries: Arc<dyn EntryStore>,

    pub datastore: Arc<dyn DatastoreAdmin>,

    pub settings: Arc<dyn SettingsStore>,

    pub dispatcher: Dispatcher,
}

impl SharedState {
    /// Connects to the configured datastore, applies migrations and seeds
    /// the admin account into an empty user table.
    ///
    /// `config_path` is where settings changes are written back to; `None`
    /// keeps them in memory only.
    pub async fn new(config: Config, config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.database.database_url(),
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        store
            .bootstrap_admin(&config.security.bootstrap_admin_password, &config.security)
            .await?;

        Ok(Self::with_store(config, config_path, store))
    }

    #[must_use]
    pub fn with_store(config: Config, config_path: Option<PathBuf>, store: Store) -> Self {
        let credentials: Arc<dyn CredentialStore> = Arc::new(SeaOrmCredentialStore::new(
            store.clone(),
            config.security.clone(),
        ));
        let entries: Arc<dyn EntryStore> = Arc::new(SeaOrmEntryStore::new(store.clone()));
        let datastore: Arc<dyn DatastoreAdmin> = Arc::new(SeaOrmDatastoreAdmin::new(
            store.clone(),
            config.general.clone(),
            config.security.clone(),
        ));

        let timeout = Duration::from_secs(config.general.store_timeout_seconds);
        let config = Arc::new(RwLock::new(config));
        let settings: Arc<dyn SettingsStore> =
            Arc::new(ConfigFile::new(config.clone(), config_path));

        let handlers = Handlers::new(
            credentials.clone(),
            entries.clone(),
            datastore.clone(),
            settings.clone(),
        );

        Self {
            config,
            store,
            credentials,
            entries,
            datastore,
            settings,
            dispatcher: Dispatcher::new(handlers, timeout),
        }
    }
}
