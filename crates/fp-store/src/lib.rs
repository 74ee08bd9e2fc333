//! SQLite result ledger and on-disk configuration for `fp-core`.

pub mod config;
pub mod error;
pub mod schema;
pub mod store;

pub use config::{default_base_dir, load_config, open_ledger, render_config, resolve_base_dir};
pub use error::{Result, StoreError};
pub use store::Store;
