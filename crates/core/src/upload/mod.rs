//! Bounded upload session protocol.
//!
//! A widget opens a session whose ceiling is fixed from the local maximum and
//! the provider's remaining quota, registers files against it, and finally
//! commits a selection of them for delivery.
//!
//! # Modules
//!
//! - `types` - Session, file, and limit types
//! - `error` - Protocol error taxonomy
//! - `store` - Persistence traits implemented by the db crate
//! - `visitor` - Commit payload parsing
//! - `manager` - Opening sessions
//! - `registry` - Registering files
//! - `commit` - Committing sessions
//! - `reaper` - Expiring abandoned sessions

pub mod commit;
pub mod error;
pub mod manager;
pub mod reaper;
pub mod registry;
pub mod store;
pub mod types;
pub mod visitor;

#[cfg(test)]
mod admission_props;

pub use commit::CommitOrchestrator;
pub use error::UploadError;
pub use manager::SessionManager;
pub use reaper::ExpiryReaper;
pub use registry::FileRegistry;
pub use store::{CredentialStore, FileStore, SessionStore};
pub use types::{
    Accepted, IncomingFile, NewFile, NewSession, OpenedSession, Session, SessionState, UploadFile,
    UploadLimits,
};
pub use visitor::{CommitRequest, Visitor};
