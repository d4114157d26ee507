pub mod config;
pub mod error;

mod log;

pub use config::{CacheConfig, LogConfig};
pub use error::{Error, Result};
pub use log::init_logging;
