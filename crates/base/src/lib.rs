pub mod config;
pub mod consts;

pub const PROJECT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const PROJECT_NAME: &str = "dragonfly-p2p-webhook";
pub const PROJECT_NAME_WITH_INITIAL_CAPITAL: &str = "Dragonfly P2P Webhook";

pub const CLI_PROGRAM_NAME: &str = "dragonfly-p2p-webhook";

/// File name of the injection policy inside the mounted config directory.
pub const INJECT_CONFIG_NAME: &str = "config.yaml";
