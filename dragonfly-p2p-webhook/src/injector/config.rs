use std::{
    path::{Component, Path, PathBuf},
    pin::pin,
    sync::{Arc, PoisonError, RwLock},
};

use dragonfly_p2p_webhook_base::{INJECT_CONFIG_NAME, consts};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tokio::time::{self, Instant};

use crate::injector::error::{self, Error};

/// The injection policy.
///
/// Keys missing from the file take the zero value of their type; the
/// built-in [`Default`] is only used when the whole file cannot be loaded.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct InjectConfig {
    /// Master switch. When `false` no pod is injected.
    #[serde(default, rename = "enable")]
    pub enabled: bool,

    /// Port of the dfdaemon proxy on the pod's node.
    #[serde(default)]
    pub proxy_port: u16,

    #[serde(default)]
    pub cli_tools_image: String,

    /// Directory inside `cli_tools_image` holding the tool binaries.
    #[serde(default)]
    pub cli_tools_dir_path: String,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            proxy_port: consts::DEFAULT_PROXY_PORT,
            cli_tools_image: consts::DEFAULT_CLI_TOOLS_IMAGE.to_string(),
            cli_tools_dir_path: consts::DEFAULT_CLI_TOOLS_DIR_PATH.to_string(),
        }
    }
}

impl InjectConfig {
    /// Loads the policy at `path`, falling back to [`InjectConfig::default`]
    /// when the file is missing or malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Self { Self::or_default(Self::load_from_file(path)) }

    /// Same as [`InjectConfig::load`] without blocking the runtime.
    pub async fn read(path: &Path) -> Self {
        Self::or_default(Self::read_from_file(path).await)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid policy.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let data =
            std::fs::read(path).context(error::OpenConfigSnafu { filename: path.to_path_buf() })?;
        Self::parse(path, &data)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid policy.
    pub async fn read_from_file(path: &Path) -> Result<Self, Error> {
        let data = tokio::fs::read(path)
            .await
            .context(error::OpenConfigSnafu { filename: path.to_path_buf() })?;
        Self::parse(path, &data)
    }

    fn parse(path: &Path, data: &[u8]) -> Result<Self, Error> {
        let config: Self = serde_yaml::from_slice(data)
            .context(error::ParseConfigSnafu { filename: path.to_path_buf() })?;
        if !config.enabled {
            tracing::warn!(
                "Injection is disabled by {}, set `enable: true` to turn it on",
                path.display()
            );
        }
        Ok(config)
    }

    fn or_default(result: Result<Self, Error>) -> Self {
        result.unwrap_or_else(|err| {
            tracing::warn!("{err}");
            tracing::info!("Use default inject config");
            Self::default()
        })
    }

    /// The built-in policy rendered as YAML.
    pub fn template_basic() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }

    /// Path where the CLI tools volume is mounted, derived from
    /// `cli_tools_dir_path`.
    pub fn cli_tools_mount_path(&self) -> String {
        format!("{}-mount", clean_path(&self.cli_tools_dir_path).display())
    }
}

/// Lexically normalizes `path`: repeated separators, `.` elements and
/// trailing separators are dropped and `..` consumes the preceding element.
/// An empty result becomes `.`.
fn clean_path(path: &str) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                cleaned.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    let _unused = cleaned.pop();
                }
                // `..` of the root is the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => cleaned.push(".."),
            },
        }
    }

    if cleaned.as_os_str().is_empty() { PathBuf::from(".") } else { cleaned }
}

/// Shared, periodically reloaded [`InjectConfig`].
///
/// Clones share the same policy. Readers always get a private snapshot, and a
/// reload replaces the whole value under the write lock.
#[derive(Clone, Debug)]
pub struct ConfigManager {
    config: Arc<RwLock<InjectConfig>>,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Loads `config.yaml` from `config_directory`.
    pub fn new<P: AsRef<Path>>(config_directory: P) -> Self {
        let config_path = config_directory.as_ref().join(INJECT_CONFIG_NAME);
        let config = InjectConfig::load(&config_path);
        Self { config: Arc::new(RwLock::new(config)), config_path }
    }

    pub fn config_path(&self) -> &Path { &self.config_path }

    pub fn config(&self) -> InjectConfig {
        self.config.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub async fn reload(&self) {
        let config = InjectConfig::read(&self.config_path).await;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        tracing::debug!("Inject config reloaded from {}", self.config_path.display());
    }

    /// Reloads the policy every
    /// [`INJECT_CONFIG_RELOAD_INTERVAL`](consts::INJECT_CONFIG_RELOAD_INTERVAL)
    /// until `shutdown_signal` resolves.
    ///
    /// Cancellation is only observed between reloads.
    pub async fn run(self, shutdown_signal: impl Future<Output = ()> + Send) {
        let period = consts::INJECT_CONFIG_RELOAD_INTERVAL;
        tracing::info!(
            "Watching inject config {} every {}s",
            self.config_path.display(),
            period.as_secs()
        );

        let mut ticker = time::interval_at(Instant::now() + period, period);
        let mut shutdown_signal = pin!(shutdown_signal);
        loop {
            tokio::select! {
                () = &mut shutdown_signal => break,
                _ = ticker.tick() => self.reload().await,
            }
        }

        tracing::info!("Stopped watching inject config");
    }
}
