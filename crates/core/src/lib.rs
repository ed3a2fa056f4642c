//! Folio Core - Portfolio domain entities, collaborator traits and calculations.
//!
//! This crate contains the portfolio state the AI subsystem reads and writes.
//! It is storage-agnostic: persistence, settings and secrets are reached
//! through traits implemented by the embedding application.

pub mod calculation;
pub mod errors;
pub mod portfolio;
pub mod research;
pub mod secrets;
pub mod settings;

// Re-export common types from the portfolio module
pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
