//! Shared fixtures for action tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use super::fields::Fields;
use super::handlers::Handlers;
use crate::auth::{BoundAddress, Privilege};
use crate::config::{Config, DatabaseConfig, SecurityConfig};
use crate::db::{EntryInput, Store};
use crate::domain::{EntryId, UserId};
use crate::entities::entries;
use crate::services::{
    ConfigFile, CredentialError, CredentialStore, DatastoreAdmin, DatastoreError, EntryStore,
    SeaOrmCredentialStore, SeaOrmEntryStore, Setting, SettingsError, SettingsStore, UserRecord,
};

pub struct FakeDatastore {
    reachable: bool,
    initializable: bool,
    checks: AtomicUsize,
    initializations: AtomicUsize,
}

#[async_trait::async_trait]
impl DatastoreAdmin for FakeDatastore {
    async fn check(&self, _target: &DatabaseConfig) -> Result<(), DatastoreError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if self.reachable {
            Ok(())
        } else {
            Err(DatastoreError::Connect(anyhow::anyhow!("connection refused")))
        }
    }

    async fn initialize(&self, _target: &DatabaseConfig) -> Result<(), DatastoreError> {
        self.initializations.fetch_add(1, Ordering::SeqCst);
        if self.initializable {
            Ok(())
        } else {
            Err(DatastoreError::Initialize("table creation denied".to_string()))
        }
    }
}

/// Counts every call that reaches the wrapped entry store.
pub struct CountingEntries {
    inner: Arc<dyn EntryStore>,
    pub calls: AtomicUsize,
}

impl CountingEntries {
    pub fn new(inner: Arc<dyn EntryStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl EntryStore for CountingEntries {
    async fn add(&self, input: EntryInput) -> anyhow::Result<EntryId> {
        self.hit();
        self.inner.add(input).await
    }

    async fn get(&self, id: EntryId) -> anyhow::Result<Option<entries::Model>> {
        self.hit();
        self.inner.get(id).await
    }

    async fn update(&self, id: EntryId, input: EntryInput) -> anyhow::Result<bool> {
        self.hit();
        self.inner.update(id, input).await
    }

    async fn delete(&self, id: EntryId) -> anyhow::Result<bool> {
        self.hit();
        self.inner.delete(id).await
    }

    async fn list(&self) -> anyhow::Result<Vec<entries::Model>> {
        self.hit();
        self.inner.list().await
    }
}

/// Counts every call that reaches the wrapped credential store.
pub struct CountingCredentials {
    inner: Arc<dyn CredentialStore>,
    calls: AtomicUsize,
}

impl CountingCredentials {
    pub fn new(inner: Arc<dyn CredentialStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl CredentialStore for CountingCredentials {
    async fn find_by_session(&self, token: &str) -> Result<Option<UserRecord>, CredentialError> {
        self.hit();
        self.inner.find_by_session(token).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<UserRecord>, CredentialError> {
        self.hit();
        self.inner.find_by_name(name).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, CredentialError> {
        self.hit();
        self.inner.find_by_id(id).await
    }

    async fn list(&self) -> Result<Vec<UserRecord>, CredentialError> {
        self.hit();
        self.inner.list().await
    }

    async fn count(&self) -> Result<u64, CredentialError> {
        self.hit();
        self.inner.count().await
    }

    async fn verify_credentials(
        &self,
        name: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, CredentialError> {
        self.hit();
        self.inner.verify_credentials(name, password).await
    }

    async fn verify_password(&self, id: UserId, password: &str) -> Result<bool, CredentialError> {
        self.hit();
        self.inner.verify_password(id, password).await
    }

    async fn create(
        &self,
        name: &str,
        password: &str,
        privilege: Privilege,
    ) -> Result<UserId, CredentialError> {
        self.hit();
        self.inner.create(name, password, privilege).await
    }

    async fn update_name(&self, id: UserId, name: &str) -> Result<(), CredentialError> {
        self.hit();
        self.inner.update_name(id, name).await
    }

    async fn update_password(&self, id: UserId, password: &str) -> Result<(), CredentialError> {
        self.hit();
        self.inner.update_password(id, password).await
    }

    async fn update_privilege(
        &self,
        id: UserId,
        privilege: Privilege,
    ) -> Result<(), CredentialError> {
        self.hit();
        self.inner.update_privilege(id, privilege).await
    }

    async fn delete(&self, id: UserId) -> Result<bool, CredentialError> {
        self.hit();
        self.inner.delete(id).await
    }

    async fn set_session(
        &self,
        id: UserId,
        token: &str,
        address: BoundAddress,
    ) -> Result<(), CredentialError> {
        self.hit();
        self.inner.set_session(id, token, address).await
    }

    async fn clear_session(&self, id: UserId) -> Result<(), CredentialError> {
        self.hit();
        self.inner.clear_session(id).await
    }

    async fn clear_session_by_token(&self, token: &str) -> Result<u64, CredentialError> {
        self.hit();
        self.inner.clear_session_by_token(token).await
    }
}

/// Counts every call that reaches the wrapped settings.
pub struct CountingSettings {
    inner: Arc<dyn SettingsStore>,
    calls: AtomicUsize,
}

impl CountingSettings {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SettingsStore for CountingSettings {
    async fn snapshot(&self) -> Config {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.snapshot().await
    }

    async fn apply(&self, changes: &[(Setting, &str)]) -> Result<(), SettingsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.apply(changes).await
    }
}

/// Entry store that never answers in time.
pub struct StalledEntries;

#[async_trait::async_trait]
impl EntryStore for StalledEntries {
    async fn add(&self, _input: EntryInput) -> anyhow::Result<EntryId> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(EntryId::new(1))
    }

    async fn get(&self, _id: EntryId) -> anyhow::Result<Option<entries::Model>> {
        Ok(None)
    }

    async fn update(&self, _id: EntryId, _input: EntryInput) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn delete(&self, _id: EntryId) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn list(&self) -> anyhow::Result<Vec<entries::Model>> {
        Ok(Vec::new())
    }
}

pub struct Harness {
    pub handlers: Handlers,
    pub credentials: Arc<dyn CredentialStore>,
    pub entries: Arc<CountingEntries>,
    pub settings: Arc<dyn SettingsStore>,
    pub datastore: Arc<FakeDatastore>,
    pub admin_id: UserId,
    counting_credentials: Arc<CountingCredentials>,
    counting_settings: Arc<CountingSettings>,
}

impl Harness {
    pub const ADMIN_PASSWORD: &'static str = "tafel";

    pub async fn new() -> Self {
        Self::with_datastore(true).await
    }

    pub async fn with_datastore(reachable: bool) -> Self {
        Self::build(reachable, true, None).await
    }

    /// Datastore that answers the probe but refuses to create tables.
    pub async fn with_failing_initialization() -> Self {
        Self::build(true, false, None).await
    }

    pub async fn with_entries(entries: Arc<dyn EntryStore>) -> Self {
        Self::build(true, true, Some(entries)).await
    }

    async fn build(
        reachable: bool,
        initializable: bool,
        entries: Option<Arc<dyn EntryStore>>,
    ) -> Self {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let security = fast_hashing();
        store
            .bootstrap_admin(Self::ADMIN_PASSWORD, &security)
            .await
            .unwrap();
        let admin_id = store.get_user_by_name("admin").await.unwrap().unwrap().id;

        let counting_credentials = Arc::new(CountingCredentials::new(Arc::new(
            SeaOrmCredentialStore::new(store.clone(), security),
        )));
        let credentials: Arc<dyn CredentialStore> = counting_credentials.clone();
        let inner = entries.unwrap_or_else(|| Arc::new(SeaOrmEntryStore::new(store)));
        let entries = Arc::new(CountingEntries::new(inner));
        let counting_settings = Arc::new(CountingSettings {
            inner: Arc::new(ConfigFile::new(
                Arc::new(RwLock::new(Config::default())),
                None,
            )),
            calls: AtomicUsize::new(0),
        });
        let settings: Arc<dyn SettingsStore> = counting_settings.clone();
        let datastore = Arc::new(FakeDatastore {
            reachable,
            initializable,
            checks: AtomicUsize::new(0),
            initializations: AtomicUsize::new(0),
        });

        let handlers = Handlers::new(
            credentials.clone(),
            entries.clone(),
            datastore.clone(),
            settings.clone(),
        );

        Self {
            handlers,
            credentials,
            entries,
            settings,
            datastore,
            admin_id,
            counting_credentials,
            counting_settings,
        }
    }

    /// Calls that reached any store behind the handlers, lookups included.
    pub fn store_calls(&self) -> usize {
        self.counting_credentials.calls()
            + self.counting_settings.calls()
            + self.entries.calls()
            + self.datastore.checks.load(Ordering::SeqCst)
            + self.datastore_initializations()
    }

    pub fn datastore_initializations(&self) -> usize {
        self.datastore.initializations.load(Ordering::SeqCst)
    }

    pub async fn user(&self, name: &str, privilege: Privilege) -> UserId {
        self.credentials.create(name, "pw", privilege).await.unwrap()
    }
}

pub fn fast_hashing() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        ..SecurityConfig::default()
    }
}

/// A complete entry form, optionally with an id for updates.
pub fn entry_fields(id: Option<&str>) -> Fields {
    let mut pairs = Vec::new();
    if let Some(id) = id {
        pairs.push(("id", id));
    }
    pairs.extend([
        ("time", "2"),
        ("teacher", "Hu"),
        ("course", "7a"),
        ("subject", "De"),
        ("duration", "1"),
        ("sub", "Ro"),
        ("change", "Vertretung"),
        ("oldroom", "A 1.02"),
        ("newroom", "B 2.14"),
    ]);
    pairs.into_iter().collect()
}
