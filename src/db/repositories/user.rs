use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, sea_query::Expr,
};
use tokio::task;
use tracing::warn;

use crate::auth::{BoundAddress, Privilege};
use crate::config::SecurityConfig;
use crate::domain::UserId;
use crate::entities::{prelude::*, users};
use crate::services::credential_store::UserRecord;

impl From<users::Model> for UserRecord {
    fn from(model: users::Model) -> Self {
        let privilege = Privilege::try_from(model.privilege).unwrap_or_else(|e| {
            // Treat a corrupt level as suspended rather than guessing upwards
            warn!(user_id = model.id, error = %e, "Stored privilege out of range");
            Privilege::None
        });

        let bound_address = BoundAddress::merge(model.ip_low, model.ip_high);

        Self {
            id: UserId::new(model.id),
            name: model.name,
            privilege,
            // Half a binding is no binding
            session_token: model.session_token.filter(|_| bound_address.is_some()),
            bound_address,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_token(&self, token: &str) -> Result<Option<UserRecord>> {
        let user = Users::find()
            .filter(users::Column::SessionToken.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query user by session token")?;

        Ok(user.map(UserRecord::from))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<UserRecord>> {
        let user = Users::find()
            .filter(users::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query user by name")?;

        Ok(user.map(UserRecord::from))
    }

    /// Get user by name together with the password hash (for login)
    pub async fn get_by_name_with_password(
        &self,
        name: &str,
    ) -> Result<Option<(UserRecord, String)>> {
        let user = Users::find()
            .filter(users::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query user by name")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (UserRecord::from(u), password_hash)
        }))
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(UserRecord::from))
    }

    pub async fn get_password_hash(&self, id: UserId) -> Result<Option<String>> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        Ok(user.map(|u| u.password_hash))
    }

    pub async fn list(&self) -> Result<Vec<UserRecord>> {
        let rows = Users::find()
            .order_by_asc(users::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Users::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")
    }

    /// Inserts a user; the caller checks the name first, the unique index
    /// catches the race.
    pub async fn create(
        &self,
        name: &str,
        password: &str,
        privilege: Privilege,
        security: &SecurityConfig,
    ) -> Result<UserId> {
        let password_hash = hash_password_blocking(password, security).await?;
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            name: Set(name.to_string()),
            password_hash: Set(password_hash),
            privilege: Set(privilege.code()),
            ip_low: Set(None),
            ip_high: Set(None),
            session_token: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let res = Users::insert(active).exec(&self.conn).await?;
        Ok(UserId::new(res.last_insert_id))
    }

    /// Returns `false` if no row has this id.
    pub async fn update_name(&self, id: UserId, name: &str) -> Result<bool> {
        let Some(user) = Users::find_by_id(id.value()).one(&self.conn).await? else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.name = Set(name.to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn update_password(
        &self,
        id: UserId,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<bool> {
        let Some(user) = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
        else {
            return Ok(false);
        };

        let new_hash = hash_password_blocking(new_password, security).await?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn update_privilege(&self, id: UserId, privilege: Privilege) -> Result<bool> {
        let res = Users::update_many()
            .col_expr(users::Column::Privilege, Expr::value(privilege.code()))
            .col_expr(
                users::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(users::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to update privilege")?;

        Ok(res.rows_affected == 1)
    }

    pub async fn delete(&self, id: UserId) -> Result<bool> {
        let res = Users::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(res.rows_affected > 0)
    }

    /// Writes token and both address halves in one UPDATE statement.
    pub async fn set_session(&self, id: UserId, token: &str, address: BoundAddress) -> Result<bool> {
        let (low, high) = address.split();

        let res = Users::update_many()
            .col_expr(users::Column::SessionToken, Expr::value(token))
            .col_expr(users::Column::IpLow, Expr::value(low))
            .col_expr(users::Column::IpHigh, Expr::value(high))
            .filter(users::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to bind session")?;

        Ok(res.rows_affected == 1)
    }

    pub async fn clear_session(&self, id: UserId) -> Result<bool> {
        let res = Self::clear_binding()
            .filter(users::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to clear session")?;

        Ok(res.rows_affected == 1)
    }

    pub async fn clear_session_by_token(&self, token: &str) -> Result<u64> {
        let res = Self::clear_binding()
            .filter(users::Column::SessionToken.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to clear session")?;

        Ok(res.rows_affected)
    }

    fn clear_binding() -> sea_orm::UpdateMany<Users> {
        Users::update_many()
            .col_expr(users::Column::SessionToken, Expr::value(Option::<String>::None))
            .col_expr(users::Column::IpLow, Expr::value(Option::<i64>::None))
            .col_expr(users::Column::IpHigh, Expr::value(Option::<i64>::None))
    }
}

/// Verify a password against a stored PHC hash.
/// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
/// and would block the async runtime if run directly.
pub async fn verify_password(password_hash: String, password: &str) -> Result<bool> {
    let password = password.to_string();

    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        // Parameters are read back from the hash itself
        Ok::<bool, anyhow::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")?
}

pub async fn hash_password_blocking(password: &str, security: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = security.clone();
    task::spawn_blocking(move || hash_password(&password, Some(&config)))
        .await
        .context("Password hashing task panicked")?
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the library default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate an opaque session token (64 character hex string)
#[must_use]
pub fn generate_session_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_tokens_are_hex_and_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn hash_then_verify() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        let hash = hash_password("geheim", Some(&config)).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(hash.clone(), "geheim").await.unwrap());
        assert!(!verify_password(hash, "falsch").await.unwrap());
    }
}
