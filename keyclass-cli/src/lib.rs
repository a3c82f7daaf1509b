// All core functionality is in keyclass-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod cli;
pub mod logging;
pub mod paths;

// Re-export core types for convenience
pub use keyclass_core::*;

// Re-export CLI utilities
pub use cli::Args;
pub use logging::init_tracing;
pub use paths::{default_storage_dir, resolve_storage_dir};
