//! Owner settings per widget.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(UP_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DOWN_SQL).await?;
        Ok(())
    }
}

const UP_SQL: &str = r"
CREATE TABLE widget_settings (
    instance_id VARCHAR(255) NOT NULL,
    component_id VARCHAR(255) NOT NULL,
    user_email VARCHAR(255) NOT NULL DEFAULT '',
    provider VARCHAR(64),
    settings JSONB NOT NULL DEFAULT '{}'::jsonb,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (instance_id, component_id),
    CONSTRAINT chk_settings_object CHECK (jsonb_typeof(settings) = 'object')
);
";

const DOWN_SQL: &str = r"
DROP TABLE IF EXISTS widget_settings CASCADE;
";
