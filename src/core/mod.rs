// Public modules
pub mod defaults;
pub mod error;
pub mod git;
pub mod manifest;
pub mod progress;
pub mod project;
pub mod release;
pub mod shell;
pub mod validation;
pub mod version;

// Internal modules - not part of public API
pub(crate) mod config;
pub(crate) mod paths;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
