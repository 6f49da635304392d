pub mod credential_store;
pub mod credential_store_impl;
pub use credential_store::{CredentialError, CredentialStore, UserRecord};
pub use credential_store_impl::SeaOrmCredentialStore;

pub mod entry_store;
pub mod entry_store_impl;
pub use entry_store::EntryStore;
pub use entry_store_impl::SeaOrmEntryStore;

pub mod datastore;
pub mod datastore_impl;
pub use datastore::{DatastoreAdmin, DatastoreError};
pub use datastore_impl::SeaOrmDatastoreAdmin;

pub mod settings;
pub use settings::{ConfigFile, Setting, SettingsError, SettingsStore};
