//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the Graph toolkit:
//! - Client configuration with fail-fast validation
//! - Logging and tracing infrastructure
//!
//! ## Overview
//!
//! Nothing in this crate touches the network. Configuration problems surface
//! here, at construction time, before a single request is built.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{GraphConfig, GraphConfigBuilder};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
