//! Core upload protocol for Parcel.
//!
//! This crate contains the protocol logic with ZERO web or database dependencies.
//! Persistence and the storage provider are reached through traits.
//!
//! # Modules
//!
//! - `upload` - Sessions, file registration, and commits
//! - `staging` - Temporary byte storage between registration and delivery
//! - `provider` - Capacity and delivery seams for the storage provider
//! - `delivery` - Background delivery worker and tickets
//! - `settings` - Per-widget owner settings

pub mod delivery;
pub mod provider;
pub mod settings;
pub mod staging;
pub mod upload;

#[cfg(test)]
mod testing;
