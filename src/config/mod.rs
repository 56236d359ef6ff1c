//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/clarion/config.toml)
//! 3. Project config (.clarion/config.toml)
//! 4. Environment variables (CLARION_*)
//! 5. CLI arguments (highest priority)

mod credentials;
mod loader;
mod types;

pub use credentials::ConfigCredentialStore;
pub use loader::ConfigLoader;
pub use types::*;
