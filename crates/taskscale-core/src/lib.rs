pub mod config;
pub mod duration;
pub mod error;
pub mod naming;
pub mod types;

pub use config::TaskscaleConfig;
pub use error::{ConfigError, ConfigResult};
pub use naming::split_function_name;
pub use types::*;
