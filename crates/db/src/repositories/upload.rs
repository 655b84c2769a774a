//! Upload session repository for database operations.
//!
//! Implements the core persistence traits using SeaORM. State transitions are
//! either row-locked inside a transaction (file admission) or expressed as a
//! single `UPDATE ... WHERE state = 'open'` (commit, expiry), so concurrent
//! callers can never both win.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use tracing::debug;

use crate::entities::{session_files, upload_sessions, widget_tokens};
use parcel_core::provider::Credential;
use parcel_core::upload::{
    CredentialStore, FileStore, NewFile, NewSession, Session, SessionState, SessionStore,
    UploadError, UploadFile,
};
use parcel_shared::{FileId, SessionId, WidgetIdentity};

/// Upload repository implementation.
#[derive(Debug, Clone)]
pub struct UploadRepository {
    db: DatabaseConnection,
}

impl UploadRepository {
    /// Create a new upload repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Store or replace the provider tokens of a widget.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub async fn store_credential(
        &self,
        widget: &WidgetIdentity,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), DbErr> {
        let model = widget_tokens::ActiveModel {
            instance_id: Set(widget.instance_id.clone()),
            component_id: Set(widget.component_id.clone()),
            access_token: Set(access_token.to_string()),
            refresh_token: Set(refresh_token.map(String::from)),
            updated_at: Set(Utc::now().into()),
        };

        widget_tokens::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    widget_tokens::Column::InstanceId,
                    widget_tokens::Column::ComponentId,
                ])
                .update_columns([
                    widget_tokens::Column::AccessToken,
                    widget_tokens::Column::RefreshToken,
                    widget_tokens::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }
}

impl SessionStore for UploadRepository {
    async fn create_session(&self, input: NewSession) -> Result<Session, UploadError> {
        let model = upload_sessions::ActiveModel {
            instance_id: Set(input.widget.instance_id),
            component_id: Set(input.widget.component_id),
            state: Set(SessionState::Open.as_str().to_string()),
            upload_size_limit: Set(to_db_size(input.upload_size_limit)?),
            accumulated_size: Set(0),
            created_at: Set(input.created_at.into()),
            expires_at: Set(input.expires_at.into()),
            committed_at: Set(None),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        to_session(model)
    }

    async fn find_session(
        &self,
        widget: &WidgetIdentity,
        id: SessionId,
    ) -> Result<Option<Session>, UploadError> {
        upload_sessions::Entity::find_by_id(id.into_inner())
            .filter(upload_sessions::Column::InstanceId.eq(widget.instance_id.as_str()))
            .filter(upload_sessions::Column::ComponentId.eq(widget.component_id.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(to_session)
            .transpose()
    }

    async fn close_session(
        &self,
        widget: &WidgetIdentity,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<Session, UploadError> {
        let updated = upload_sessions::Entity::update_many()
            .col_expr(
                upload_sessions::Column::State,
                Expr::value(SessionState::Committed.as_str()),
            )
            .col_expr(upload_sessions::Column::CommittedAt, Expr::value(now))
            .filter(upload_sessions::Column::Id.eq(id.into_inner()))
            .filter(upload_sessions::Column::InstanceId.eq(widget.instance_id.as_str()))
            .filter(upload_sessions::Column::ComponentId.eq(widget.component_id.as_str()))
            .filter(upload_sessions::Column::State.eq(SessionState::Open.as_str()))
            .filter(upload_sessions::Column::ExpiresAt.gt(now))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;

        if let Some(model) = updated.into_iter().next() {
            return to_session(model);
        }

        // Nothing matched: report why.
        let session = self.find_session(widget, id).await?;
        Err(closure_failure(session, id, now))
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<Vec<SessionId>, UploadError> {
        let expired = upload_sessions::Entity::update_many()
            .col_expr(
                upload_sessions::Column::State,
                Expr::value(SessionState::Expired.as_str()),
            )
            .filter(upload_sessions::Column::State.eq(SessionState::Open.as_str()))
            .filter(upload_sessions::Column::ExpiresAt.lte(now))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;

        Ok(expired
            .into_iter()
            .map(|m| SessionId::from_raw(m.id))
            .collect())
    }
}

impl FileStore for UploadRepository {
    async fn admit_file(
        &self,
        widget: &WidgetIdentity,
        input: NewFile,
        now: DateTime<Utc>,
    ) -> Result<UploadFile, UploadError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        // Row lock serialises admissions to the same session.
        let locked = upload_sessions::Entity::find_by_id(input.session_id.into_inner())
            .filter(upload_sessions::Column::InstanceId.eq(widget.instance_id.as_str()))
            .filter(upload_sessions::Column::ComponentId.eq(widget.component_id.as_str()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(UploadError::SessionNotFound(input.session_id))?;

        let session = to_session(locked)?;
        session.check_admission(input.size, now)?;

        let size = to_db_size(input.size)?;
        let file = session_files::ActiveModel {
            session_id: Set(input.session_id.into_inner()),
            filename: Set(input.filename),
            mime_type: Set(input.mime_type),
            size: Set(size),
            storage_ref: Set(input.storage_ref),
            created_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        upload_sessions::Entity::update_many()
            .col_expr(
                upload_sessions::Column::AccumulatedSize,
                Expr::col(upload_sessions::Column::AccumulatedSize).add(size),
            )
            .filter(upload_sessions::Column::Id.eq(input.session_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        debug!(session_id = %input.session_id, file_id = file.id, "File row inserted");
        to_file(file)
    }

    async fn files_by_ids(
        &self,
        widget: &WidgetIdentity,
        session_id: SessionId,
        ids: &[FileId],
    ) -> Result<Vec<UploadFile>, UploadError> {
        if self.find_session(widget, session_id).await?.is_none() {
            return Ok(Vec::new());
        }

        session_files::Entity::find()
            .filter(session_files::Column::SessionId.eq(session_id.into_inner()))
            .filter(session_files::Column::Id.is_in(ids.iter().map(|id| id.into_inner())))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(to_file)
            .collect()
    }

    async fn remove_session_files(
        &self,
        session_ids: &[SessionId],
    ) -> Result<Vec<UploadFile>, UploadError> {
        let raw: Vec<i64> = session_ids.iter().map(|id| id.into_inner()).collect();

        let txn = self.db.begin().await.map_err(db_err)?;

        let removed = session_files::Entity::find()
            .filter(session_files::Column::SessionId.is_in(raw.clone()))
            .all(&txn)
            .await
            .map_err(db_err)?;

        session_files::Entity::delete_many()
            .filter(session_files::Column::SessionId.is_in(raw))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        removed.into_iter().map(to_file).collect()
    }
}

impl CredentialStore for UploadRepository {
    async fn credential(&self, widget: &WidgetIdentity) -> Result<Option<Credential>, UploadError> {
        let model = widget_tokens::Entity::find()
            .filter(widget_tokens::Column::InstanceId.eq(widget.instance_id.as_str()))
            .filter(widget_tokens::Column::ComponentId.eq(widget.component_id.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(|m| Credential::new(m.access_token)))
    }
}

/// Explain why the guarded `Open -> Committed` update matched no row.
fn closure_failure(session: Option<Session>, id: SessionId, now: DateTime<Utc>) -> UploadError {
    let Some(session) = session else {
        return UploadError::SessionNotFound(id);
    };
    match session.ensure_open(now) {
        Err(e) => e,
        Ok(()) => UploadError::repository("close_session matched no row"),
    }
}

fn db_err(e: DbErr) -> UploadError {
    UploadError::repository(e.to_string())
}

fn to_db_size(size: u64) -> Result<i64, UploadError> {
    i64::try_from(size).map_err(|_| UploadError::repository(format!("size {size} out of range")))
}

fn from_db_size(size: i64) -> Result<u64, UploadError> {
    u64::try_from(size).map_err(|_| UploadError::repository(format!("negative size {size}")))
}

fn to_session(model: upload_sessions::Model) -> Result<Session, UploadError> {
    let state = SessionState::parse(&model.state)
        .ok_or_else(|| UploadError::repository(format!("unknown session state {}", model.state)))?;

    Ok(Session {
        id: SessionId::from_raw(model.id),
        widget: WidgetIdentity::new(model.instance_id, model.component_id),
        state,
        upload_size_limit: from_db_size(model.upload_size_limit)?,
        accumulated_size: from_db_size(model.accumulated_size)?,
        created_at: model.created_at.with_timezone(&Utc),
        expires_at: model.expires_at.with_timezone(&Utc),
    })
}

fn to_file(model: session_files::Model) -> Result<UploadFile, UploadError> {
    Ok(UploadFile {
        id: FileId::from_raw(model.id),
        session_id: SessionId::from_raw(model.session_id),
        filename: model.filename,
        mime_type: model.mime_type,
        size: from_db_size(model.size)?,
        storage_ref: model.storage_ref,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
