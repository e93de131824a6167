//! Fusion Observability Library
//!
//! Logging infrastructure shared by the fusion service and engine.
//!
//! # Features
//! - Structured JSON or pretty logging selected at startup
//! - Fusion outcome events with a consistent schema
//! - Timing and cache logging macros

pub mod fusion_events;
pub mod init;
pub mod macros;

pub use fusion_events::*;
pub use init::*;
