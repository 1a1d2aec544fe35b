pub mod config;
pub mod error;
pub mod types;

pub use config::KisanConfig;
pub use error::{KisanError, Result};
pub use types::*;
