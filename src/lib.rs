#![doc = include_str!("../README.md")]

#[macro_use]
pub mod macros;

mod config;
pub use crate::config::Config;

pub mod engine;
pub mod network;
pub mod plan;

use std::sync::Once;
static INIT_LOGGER: Once = Once::new();
/// Initialize the logger with provided configuration
pub fn init_logger(config: &Config) {
    INIT_LOGGER.call_once(|| {
        let log_cfg: &str = config.log_config.as_str();
        if let Err(e) = log4rs::init_file(log_cfg, Default::default()) {
            panic!(
                "(logger) could not parse log config {} found in config {:?}: {}.",
                log_cfg, config, e
            );
        }
    });
}
