//! Core business logic for quire.
//!
//! Services here sit between the HTTP layer and the repositories: they own
//! validation, authorization checks and feed composition.

pub mod services;

pub use services::*;
