//! Staging area for uploaded bytes, backed by Apache OpenDAL.
//!
//! A file's bytes are staged when it is registered and stay here until the
//! bundle is delivered, the registration is rejected, or the owning session
//! expires. Keys are laid out per widget:
//!
//! ```text
//! {instance_id}/{component_id}/{upload_id}/{sanitized_filename}
//! ```

mod error;
mod service;

pub use error::StagingError;
pub use service::{StagingArea, StagingBackend};
