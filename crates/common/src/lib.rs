//! Common utilities and shared types for the CyberGuard portal.
//!
//! This crate provides foundational components used across all cyberguard crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: account, complaint and report identifiers via [`IdGenerator`]
//! - **Metrics**: Process counters via [`Metrics`]
//! - **Validation**: Aadhaar, phone, OTP and password checks shared with the client
//!
//! # Example
//!
//! ```no_run
//! use cyberguard_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate_complaint_id();
//!     println!("Generated complaint ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod metrics;
pub mod validation;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use metrics::{Metrics, MetricsSnapshot, get_metrics};
