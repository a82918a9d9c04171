mod error;
mod webhook;

use std::path::{Path, PathBuf};

use dragonfly_p2p_webhook_base::config::default_inject_config_directory;
use dragonfly_p2p_webhook_cli::config::LogConfig;
use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

pub use self::{error::Error, webhook::WebhookConfig};

/// Process configuration. Every field has a default, so the file is optional.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Directory holding the injection policy `config.yaml`.
    #[serde(default = "default_inject_config_directory")]
    pub inject_config_directory: PathBuf,

    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook: WebhookConfig::default(),
            inject_config_directory: default_inject_config_directory(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// # Errors
    ///
    /// Returns an error if the file cannot be found, read or parsed.
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut config: Self = {
            let path =
                path.as_ref().try_resolve().map(|path| path.to_path_buf()).with_context(|_| {
                    error::ResolveFilePathSnafu { file_path: path.as_ref().to_path_buf() }
                })?;
            let data =
                std::fs::read(&path).context(error::OpenConfigSnafu { filename: path.clone() })?;
            serde_yaml::from_slice(&data).context(error::ParseConfigSnafu { filename: path })?
        };

        config.log.file_path = match config.log.file_path.map(|path| {
            path.try_resolve()
                .map(|path| path.to_path_buf())
                .with_context(|_| error::ResolveFilePathSnafu { file_path: path.clone() })
        }) {
            Some(Ok(path)) => Some(path),
            Some(Err(err)) => return Err(err),
            None => None,
        };

        Ok(config)
    }

    /// The default configuration rendered as YAML.
    pub fn template_basic() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}
