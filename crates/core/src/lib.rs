pub mod config;
pub mod error;
pub mod event;

pub use config::{load_dotenv, DetectionConfig, DetectionConfigBuilder, HourWindow};
pub use error::*;
pub use event::*;
