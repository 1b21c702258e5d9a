pub mod config;
pub mod error;

pub use config::{CryptoConfig, LogConfig, LogFormat, PwsealConfig};
pub use error::{PwsealError, PwsealResult};
