//! Google Drive integration for Parcel.
//!
//! [`DriveClient`] answers capacity queries from the account's storage quota
//! and delivers committed bundles: one folder per visitor, one Drive file per
//! staged upload, with the visitor's message as each file's description.

pub mod client;
pub mod types;

pub use client::DriveClient;
