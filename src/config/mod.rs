//! Configuration.
//!
//! Three tiers are merged field by field, lowest priority first:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `./taskhub/config.yaml`
//! 3. **User** - `~/.taskhub/config.yaml`
//!
//! Environment variables are applied last:
//! - `TASKHUB_CONFIG_PATH` - explicit config file (replaces the file tiers)
//! - `TASKHUB_DB_PATH` - database path
//! - `TASKHUB_HOST` / `TASKHUB_PORT` - listener address
//! - `TASKHUB_PROJECT_DIR` / `TASKHUB_USER_DIR` - tier directories

mod loader;
mod merge;
mod types;

pub use loader::{
    ConfigLoader, ConfigPaths, ConfigTier, ENV_CONFIG_PATH, ENV_DB_PATH, ENV_HOST, ENV_PORT,
    ENV_PROJECT_DIR, ENV_USER_DIR,
};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
