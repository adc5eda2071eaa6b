pub mod config;
pub mod logging;
pub mod span;

pub use config::LogFormat;
pub use logging::setup_logging;
