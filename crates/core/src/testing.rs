//! In-memory collaborators for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration, Utc};
use parcel_shared::{FileId, SessionId, WidgetIdentity};
use tokio::sync::mpsc;

use crate::delivery::DeliveryBundle;
use crate::provider::{
    CapacityOracle, Credential, DeliveryReport, DeliverySink, ProviderError,
};
use crate::settings::{SettingsError, SettingsStore, SettingsUpdate, WidgetSettings};
use crate::upload::{
    CredentialStore, FileStore, NewFile, NewSession, Session, SessionState, SessionStore,
    UploadError, UploadFile,
};

#[derive(Default)]
struct Tables {
    sessions: HashMap<SessionId, Session>,
    files: Vec<UploadFile>,
    credentials: HashMap<WidgetIdentity, Credential>,
    settings: HashMap<WidgetIdentity, WidgetSettings>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Mutex-guarded store implementing every persistence trait.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn with_credential(widget: &WidgetIdentity) -> Self {
        let store = Self::default();
        store
            .tables
            .lock()
            .unwrap()
            .credentials
            .insert(widget.clone(), Credential::new("test-token"));
        store
    }

    /// Number of trait calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn insert_open_session(&self, widget: &WidgetIdentity, limit: u64) -> SessionId {
        let mut tables = self.tables.lock().unwrap();
        let id = SessionId::from_raw(tables.next_id());
        let now = Utc::now();
        tables.sessions.insert(
            id,
            Session {
                id,
                widget: widget.clone(),
                state: SessionState::Open,
                upload_size_limit: limit,
                accumulated_size: 0,
                created_at: now,
                expires_at: now + Duration::hours(1),
            },
        );
        id
    }

    pub fn insert_file(&self, session_id: SessionId, size: u64, storage_ref: &str) -> FileId {
        let mut tables = self.tables.lock().unwrap();
        let id = FileId::from_raw(tables.next_id());
        tables.files.push(UploadFile {
            id,
            session_id,
            filename: "f.bin".into(),
            mime_type: "application/octet-stream".into(),
            size,
            storage_ref: storage_ref.into(),
            created_at: Utc::now(),
        });
        id
    }

    pub fn session(&self, id: SessionId) -> Option<Session> {
        self.tables.lock().unwrap().sessions.get(&id).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().unwrap().sessions.len()
    }

    pub fn file_count(&self) -> usize {
        self.tables.lock().unwrap().files.len()
    }

    pub fn set_state(&self, id: SessionId, state: SessionState) {
        if let Some(s) = self.tables.lock().unwrap().sessions.get_mut(&id) {
            s.state = state;
        }
    }

    pub fn set_provider(&self, widget: &WidgetIdentity, provider: &str) {
        self.tables
            .lock()
            .unwrap()
            .settings
            .entry(widget.clone())
            .or_default()
            .provider = provider.to_string();
    }

    pub fn set_expires_at(&self, id: SessionId, at: DateTime<Utc>) {
        if let Some(s) = self.tables.lock().unwrap().sessions.get_mut(&id) {
            s.expires_at = at;
        }
    }
}

impl SessionStore for MemoryStore {
    async fn create_session(&self, input: NewSession) -> Result<Session, UploadError> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        let id = SessionId::from_raw(tables.next_id());
        let session = Session {
            id,
            widget: input.widget,
            state: SessionState::Open,
            upload_size_limit: input.upload_size_limit,
            accumulated_size: 0,
            created_at: input.created_at,
            expires_at: input.expires_at,
        };
        tables.sessions.insert(id, session.clone());
        Ok(session)
    }

    async fn find_session(
        &self,
        widget: &WidgetIdentity,
        id: SessionId,
    ) -> Result<Option<Session>, UploadError> {
        self.touch();
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .sessions
            .get(&id)
            .filter(|s| &s.widget == widget)
            .cloned())
    }

    async fn close_session(
        &self,
        widget: &WidgetIdentity,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<Session, UploadError> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        let session = tables
            .sessions
            .get_mut(&id)
            .filter(|s| &s.widget == widget)
            .ok_or(UploadError::SessionNotFound(id))?;
        session.ensure_open(now)?;
        session.state = SessionState::Committed;
        Ok(session.clone())
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<Vec<SessionId>, UploadError> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        let mut expired = Vec::new();
        for session in tables.sessions.values_mut() {
            if session.state == SessionState::Open && session.expires_at <= now {
                session.state = SessionState::Expired;
                expired.push(session.id);
            }
        }
        Ok(expired)
    }
}

impl FileStore for MemoryStore {
    async fn admit_file(
        &self,
        widget: &WidgetIdentity,
        input: NewFile,
        now: DateTime<Utc>,
    ) -> Result<UploadFile, UploadError> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        let id = FileId::from_raw(tables.next_id());
        let session = tables
            .sessions
            .get_mut(&input.session_id)
            .filter(|s| &s.widget == widget)
            .ok_or(UploadError::SessionNotFound(input.session_id))?;
        session.check_admission(input.size, now)?;
        session.accumulated_size += input.size;

        let file = UploadFile {
            id,
            session_id: input.session_id,
            filename: input.filename,
            mime_type: input.mime_type,
            size: input.size,
            storage_ref: input.storage_ref,
            created_at: now,
        };
        tables.files.push(file.clone());
        Ok(file)
    }

    async fn files_by_ids(
        &self,
        widget: &WidgetIdentity,
        session_id: SessionId,
        ids: &[FileId],
    ) -> Result<Vec<UploadFile>, UploadError> {
        self.touch();
        let tables = self.tables.lock().unwrap();
        let owned = tables
            .sessions
            .get(&session_id)
            .is_some_and(|s| &s.widget == widget);
        if !owned {
            return Ok(Vec::new());
        }
        Ok(tables
            .files
            .iter()
            .filter(|f| f.session_id == session_id && ids.contains(&f.id))
            .cloned()
            .collect())
    }

    async fn remove_session_files(
        &self,
        session_ids: &[SessionId],
    ) -> Result<Vec<UploadFile>, UploadError> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        let (removed, kept): (Vec<_>, Vec<_>) = tables
            .files
            .drain(..)
            .partition(|f| session_ids.contains(&f.session_id));
        tables.files = kept;
        Ok(removed)
    }
}

impl SettingsStore for MemoryStore {
    async fn widget_settings(
        &self,
        widget: &WidgetIdentity,
    ) -> Result<Option<WidgetSettings>, SettingsError> {
        self.touch();
        Ok(self.tables.lock().unwrap().settings.get(widget).cloned())
    }

    async fn save_widget_settings(
        &self,
        widget: &WidgetIdentity,
        update: SettingsUpdate,
        _now: DateTime<Utc>,
    ) -> Result<(), SettingsError> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        let entry = tables.settings.entry(widget.clone()).or_default();
        entry.user_email = update.user_email;
        entry.settings = update.settings;
        Ok(())
    }
}

impl CredentialStore for MemoryStore {
    async fn credential(&self, widget: &WidgetIdentity) -> Result<Option<Credential>, UploadError> {
        self.touch();
        Ok(self.tables.lock().unwrap().credentials.get(widget).cloned())
    }
}

/// Oracle answering from a script, one entry per call.
pub struct ScriptedOracle {
    script: Mutex<VecDeque<Result<u64, ProviderError>>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(script: impl IntoIterator<Item = Result<u64, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CapacityOracle for ScriptedOracle {
    async fn available_capacity(&self, _credential: &Credential) -> Result<u64, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::unavailable("script exhausted")))
    }
}

/// Sink that forwards every bundle to a channel.
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<DeliveryBundle>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeliveryBundle>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, fail: false }, rx)
    }

    /// A sink that records bundles and then reports failure.
    pub fn failing() -> (Self, mpsc::UnboundedReceiver<DeliveryBundle>) {
        let (mut sink, rx) = Self::new();
        sink.fail = true;
        (sink, rx)
    }
}

impl DeliverySink for RecordingSink {
    async fn deliver(&self, bundle: &DeliveryBundle) -> Result<DeliveryReport, ProviderError> {
        let _ = self.tx.send(bundle.clone());
        if self.fail {
            return Err(ProviderError::unavailable("sink configured to fail"));
        }
        Ok(DeliveryReport {
            folder_id: Some("folder".into()),
            remote_ids: bundle.files.iter().map(|f| f.file.id.to_string()).collect(),
        })
    }
}
