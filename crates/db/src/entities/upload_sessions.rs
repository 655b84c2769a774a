//! `SeaORM` Entity for upload_sessions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "upload_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub instance_id: String,
    pub component_id: String,
    pub state: String,
    pub upload_size_limit: i64,
    pub accumulated_size: i64,
    pub created_at: DateTimeWithTimeZone,
    pub expires_at: DateTimeWithTimeZone,
    pub committed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session_files::Entity")]
    SessionFiles,
}

impl Related<super::session_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionFiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
