use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One line of the substitution board.
///
/// All columns are free text and stored exactly as submitted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub time: Option<String>,

    pub teacher: Option<String>,

    pub course: Option<String>,

    pub subject: Option<String>,

    pub duration: Option<String>,

    /// Substitute teacher
    pub sub: Option<String>,

    pub change: Option<String>,

    pub oldroom: Option<String>,

    pub newroom: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
