// Package identity from Cargo.toml, reported by GET /version

/// Service name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Service version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
