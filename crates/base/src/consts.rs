use std::time::Duration;

/// Port of the dfdaemon proxy running on every node.
pub const DEFAULT_PROXY_PORT: u16 = 4001;

/// Image that carries the Dragonfly command-line tools.
pub const DEFAULT_CLI_TOOLS_IMAGE: &str = "dragonflyoss/cli-tools:latest";

/// Directory inside [`DEFAULT_CLI_TOOLS_IMAGE`] holding the tool binaries.
pub const DEFAULT_CLI_TOOLS_DIR_PATH: &str = "/dragonfly-tools";

/// Period of the injection policy reload loop.
pub const INJECT_CONFIG_RELOAD_INTERVAL: Duration = Duration::from_secs(15);
