pub mod config;
pub mod error;
pub mod types;

pub use config::WatchConfig;
pub use error::WatchError;
pub use types::*;
