use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Privilege code, 0 (none) to 4 (admin)
    pub privilege: i32,

    /// Low 64 bits of the bound client address
    pub ip_low: Option<i64>,

    /// High 64 bits of the bound client address, NULL for IPv4
    pub ip_high: Option<i64>,

    pub session_token: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
