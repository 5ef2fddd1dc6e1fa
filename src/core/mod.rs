//! # Core Module
//!
//! Configuration and time source shared by every reminder component.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Environment config and injectable clock

pub mod clock;
pub mod config;

// Re-export commonly used items
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
