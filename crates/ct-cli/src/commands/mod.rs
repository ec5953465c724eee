//! CLI command implementations

mod config;
mod status;
mod up;

pub use config::{config_init, config_show, load_setup_config};
pub use status::{collect_status, status_command};
pub use up::{up_command, UpOptions};
