//! Parley configuration system.
//!
//! Provides TOML-based configuration for the session relay. All config
//! sections use sensible defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! let config = parley_config::load_from_path(Path::new("parley.toml"))
//!     .or_else(|_| parley_config::load_default())
//!     .unwrap_or_default();
//! println!("listening on {}", config.server.bind_addr());
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    DiscussionConfig, LoggingConfig, ParleyConfig, ServerConfig, StatsConfig, DEFAULT_TOPICS,
};
pub use toml_loader::{load_default, load_from_path};
pub use validation::validate;
