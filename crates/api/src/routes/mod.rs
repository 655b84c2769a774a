//! API route definitions.

pub mod files;
pub mod health;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;
