//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure shared by the sync engine and
//! its hosts:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its logging conventions,
//! its tuning knobs and the broadcast channel used to report progress.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, FeatureFlags};
pub use error::{Error, Result};
pub use events::{AuthEvent, CoreEvent, EventBus, EventSeverity, EventStream, SyncEvent};
