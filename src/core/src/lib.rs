//! A3S Pack Core - Foundational Types
//!
//! Error and configuration types shared by the A3S Pack runtime and CLI.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{LogLevel, PackConfig};
pub use error::{PackError, Result};

/// A3S Pack version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
