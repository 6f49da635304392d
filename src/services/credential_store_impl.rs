//! `SeaORM` implementation of the `CredentialStore` trait.

use crate::auth::{BoundAddress, Privilege};
use crate::config::SecurityConfig;
use crate::db::Store;
use crate::db::repositories::user::{hash_password_blocking, verify_password};
use crate::domain::UserId;
use crate::services::credential_store::{CredentialError, CredentialStore, UserRecord};
use async_trait::async_trait;
use tokio::sync::OnceCell;

/// Password that no account can have; only its hash is ever used.
const DUMMY_PASSWORD: &str = "subplan-unknown-account";

pub struct SeaOrmCredentialStore {
    store: Store,
    security: SecurityConfig,
    /// Hash with the configured cost, verified against for unknown names so
    /// both login failures take the same time.
    dummy_hash: OnceCell<String>,
}

impl SeaOrmCredentialStore {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self {
            store,
            security,
            dummy_hash: OnceCell::const_new(),
        }
    }

    async fn dummy_hash(&self) -> Result<String, CredentialError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| hash_password_blocking(DUMMY_PASSWORD, &self.security))
            .await?;
        Ok(hash.clone())
    }

    async fn ensure_exists(&self, id: UserId) -> Result<(), CredentialError> {
        match self.store.get_user(id).await? {
            Some(_) => Ok(()),
            None => Err(CredentialError::NotFound(id)),
        }
    }
}

#[async_trait]
impl CredentialStore for SeaOrmCredentialStore {
    async fn find_by_session(&self, token: &str) -> Result<Option<UserRecord>, CredentialError> {
        Ok(self.store.get_user_by_token(token).await?)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<UserRecord>, CredentialError> {
        Ok(self.store.get_user_by_name(name).await?)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, CredentialError> {
        Ok(self.store.get_user(id).await?)
    }

    async fn list(&self) -> Result<Vec<UserRecord>, CredentialError> {
        Ok(self.store.list_users().await?)
    }

    async fn count(&self) -> Result<u64, CredentialError> {
        Ok(self.store.count_users().await?)
    }

    async fn verify_credentials(
        &self,
        name: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, CredentialError> {
        let Some((user, hash)) = self.store.get_user_by_name_with_password(name).await? else {
            verify_password(self.dummy_hash().await?, password).await?;
            return Ok(None);
        };

        if verify_password(hash, password).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    async fn verify_password(&self, id: UserId, password: &str) -> Result<bool, CredentialError> {
        let hash = self
            .store
            .get_user_password_hash(id)
            .await?
            .ok_or(CredentialError::NotFound(id))?;

        Ok(verify_password(hash, password).await?)
    }

    async fn create(
        &self,
        name: &str,
        password: &str,
        privilege: Privilege,
    ) -> Result<UserId, CredentialError> {
        if name.trim().is_empty() {
            return Err(CredentialError::Validation("name must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(CredentialError::Validation(
                "password must not be empty".to_string(),
            ));
        }

        if self.store.get_user_by_name(name).await?.is_some() {
            return Err(CredentialError::Duplicate);
        }

        Ok(self
            .store
            .create_user(name, password, privilege, &self.security)
            .await?)
    }

    async fn update_name(&self, id: UserId, name: &str) -> Result<(), CredentialError> {
        if name.trim().is_empty() {
            return Err(CredentialError::Validation("name must not be empty".to_string()));
        }

        if let Some(owner) = self.store.get_user_by_name(name).await? {
            if owner.id == id {
                return Ok(());
            }
            return Err(CredentialError::Duplicate);
        }

        if self.store.update_user_name(id, name).await? {
            Ok(())
        } else {
            Err(CredentialError::NotFound(id))
        }
    }

    async fn update_password(&self, id: UserId, password: &str) -> Result<(), CredentialError> {
        if password.is_empty() {
            return Err(CredentialError::Validation(
                "password must not be empty".to_string(),
            ));
        }

        if self
            .store
            .update_user_password(id, password, &self.security)
            .await?
        {
            Ok(())
        } else {
            Err(CredentialError::NotFound(id))
        }
    }

    async fn update_privilege(
        &self,
        id: UserId,
        privilege: Privilege,
    ) -> Result<(), CredentialError> {
        if self.store.update_user_privilege(id, privilege).await? {
            Ok(())
        } else {
            // MySQL reports zero affected rows for a no-op update
            self.ensure_exists(id).await
        }
    }

    async fn delete(&self, id: UserId) -> Result<bool, CredentialError> {
        Ok(self.store.delete_user(id).await?)
    }

    async fn set_session(
        &self,
        id: UserId,
        token: &str,
        address: BoundAddress,
    ) -> Result<(), CredentialError> {
        if self.store.set_user_session(id, token, address).await? {
            Ok(())
        } else {
            self.ensure_exists(id).await
        }
    }

    async fn clear_session(&self, id: UserId) -> Result<(), CredentialError> {
        if self.store.clear_user_session(id).await? {
            Ok(())
        } else {
            self.ensure_exists(id).await
        }
    }

    async fn clear_session_by_token(&self, token: &str) -> Result<u64, CredentialError> {
        Ok(self.store.clear_session_by_token(token).await?)
    }
}
