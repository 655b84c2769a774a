//! Persistence seams for sessions, files, and credentials.
//!
//! These traits are implemented by the db crate. Every method is scoped by
//! widget identity; a session owned by another widget is indistinguishable
//! from a missing one.

use std::future::Future;

use chrono::{DateTime, Utc};
use parcel_shared::{FileId, SessionId, WidgetIdentity};

use super::error::UploadError;
use super::types::{NewFile, NewSession, Session, UploadFile};
use crate::provider::Credential;

/// Session persistence.
pub trait SessionStore: Send + Sync {
    /// Persist a new `Open` session.
    fn create_session(
        &self,
        input: NewSession,
    ) -> impl Future<Output = Result<Session, UploadError>> + Send;

    /// Fetch a session owned by `widget`.
    fn find_session(
        &self,
        widget: &WidgetIdentity,
        id: SessionId,
    ) -> impl Future<Output = Result<Option<Session>, UploadError>> + Send;

    /// Atomically move a session from `Open` to `Committed`.
    ///
    /// Must fail with `SessionNotFound`, `SessionExpired`, or
    /// `AlreadyCommitted` when the transition does not apply; concurrent
    /// callers see exactly one success.
    fn close_session(
        &self,
        widget: &WidgetIdentity,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Session, UploadError>> + Send;

    /// Move every `Open` session whose deadline is at or before `now` to
    /// `Expired`, returning their ids.
    fn expire_stale(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<SessionId>, UploadError>> + Send;
}

/// File persistence.
pub trait FileStore: Send + Sync {
    /// Record a file against a session.
    ///
    /// Implementations lock the session, run
    /// [`Session::check_admission`], insert the file and grow the
    /// accumulated size as one atomic step.
    fn admit_file(
        &self,
        widget: &WidgetIdentity,
        input: NewFile,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<UploadFile, UploadError>> + Send;

    /// Fetch files of a session by id. Ids that do not resolve are omitted.
    fn files_by_ids(
        &self,
        widget: &WidgetIdentity,
        session_id: SessionId,
        ids: &[FileId],
    ) -> impl Future<Output = Result<Vec<UploadFile>, UploadError>> + Send;

    /// Delete every file of the given sessions, returning the removed records.
    fn remove_session_files(
        &self,
        session_ids: &[SessionId],
    ) -> impl Future<Output = Result<Vec<UploadFile>, UploadError>> + Send;
}

/// Provider credential lookup.
pub trait CredentialStore: Send + Sync {
    /// Stored credential for a widget, if it has signed in.
    fn credential(
        &self,
        widget: &WidgetIdentity,
    ) -> impl Future<Output = Result<Option<Credential>, UploadError>> + Send;
}
