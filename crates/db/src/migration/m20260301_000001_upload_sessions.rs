//! Upload sessions, their files, and widget provider tokens.

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
-- Upload sessions: one bounded batch of files per widget visit
CREATE TABLE upload_sessions (
    id BIGSERIAL PRIMARY KEY,
    instance_id VARCHAR(255) NOT NULL,
    component_id VARCHAR(255) NOT NULL,
    state VARCHAR(16) NOT NULL DEFAULT 'open',
    upload_size_limit BIGINT NOT NULL,
    accumulated_size BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    expires_at TIMESTAMPTZ NOT NULL,
    committed_at TIMESTAMPTZ,
    CONSTRAINT chk_state CHECK (state IN ('open', 'committed', 'expired')),
    CONSTRAINT chk_limit_positive CHECK (upload_size_limit > 0),
    CONSTRAINT chk_accumulated_within_limit
        CHECK (accumulated_size >= 0 AND accumulated_size <= upload_size_limit),
    CONSTRAINT chk_expires_after_created CHECK (expires_at > created_at)
);

-- Widget-scoped lookups
CREATE INDEX idx_upload_sessions_widget ON upload_sessions(instance_id, component_id);

-- Reaper sweep over open sessions
CREATE INDEX idx_upload_sessions_expiry ON upload_sessions(expires_at) WHERE state = 'open';

-- Files registered against a session
CREATE TABLE session_files (
    id BIGSERIAL PRIMARY KEY,
    session_id BIGINT NOT NULL REFERENCES upload_sessions(id) ON DELETE CASCADE,
    filename TEXT NOT NULL,
    mime_type VARCHAR(255) NOT NULL,
    size BIGINT NOT NULL,
    storage_ref TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_size_positive CHECK (size > 0)
);

CREATE INDEX idx_session_files_session ON session_files(session_id);

-- Provider credentials per widget
CREATE TABLE widget_tokens (
    instance_id VARCHAR(255) NOT NULL,
    component_id VARCHAR(255) NOT NULL,
    access_token TEXT NOT NULL,
    refresh_token TEXT,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (instance_id, component_id)
);
";

const DOWN_SQL: &str = r"
DROP TABLE IF EXISTS session_files CASCADE;
DROP TABLE IF EXISTS upload_sessions CASCADE;
DROP TABLE IF EXISTS widget_tokens CASCADE;
";
