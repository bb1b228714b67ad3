//! # Chargelog - EV charging session tracker
//!
//! A Rust implementation of an electric-vehicle charging tracker: it
//! registers vehicles, times charging sessions with pause/resume, records
//! battery and cost readings, and keeps charge history in a local SQLite
//! database.
//!
//! ## Architecture
//!
//! The application follows a modular architecture with clear separation of concerns:
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `status`: Charging status state machine
//! - `timer`: Elapsed-time engine with pause/resume
//! - `store`: Persistence gateway over SQLite with numbered migrations
//! - `session`: Charging session lifecycle management
//! - `notify`: Charging-in-progress notification surface
//! - `tracker`: Runtime loop tying the pieces together

pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod session;
pub mod status;
pub mod store;
pub mod timer;
pub mod tracker;

// Re-export commonly used types
pub use config::Config;
pub use error::{ChargelogError, Result};
pub use status::ChargingStatus;
pub use store::Store;
pub use tracker::ChargeTracker;
