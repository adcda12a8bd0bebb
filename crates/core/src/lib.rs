//! Core business logic for the CyberGuard portal.
//!
//! Services sit between the HTTP layer and the repositories. Each one owns
//! the checks for its domain: who may see a record, which status changes are
//! legal, what a valid report looks like.

pub mod services;

pub use services::*;
