//! Command line entry point of the webhook.
//!
//! # Examples
//!
//! ```bash
//! # Serve the admission webhook with the default configuration
//! dragonfly-p2p-webhook
//!
//! # Serve with a configuration file and a custom certificate directory
//! dragonfly-p2p-webhook --config /etc/webhook/config.yaml --webhook-cert-dir /certs serve
//!
//! # Print the default injection policy
//! dragonfly-p2p-webhook default-inject-config
//! ```

pub mod error;
mod serve;

use std::{io::Write, net::SocketAddr, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use dragonfly_p2p_webhook_base::CLI_PROGRAM_NAME;
use snafu::ResultExt;
use tokio::runtime::Runtime;

pub use self::error::Error;
use crate::{config::Config, injector::InjectConfig, shadow};

#[derive(Parser)]
#[command(
    name = CLI_PROGRAM_NAME,
    author,
    version,
    long_version = shadow::CLAP_LONG_VERSION,
    about = "Kubernetes mutating admission webhook that wires pods into the Dragonfly P2P network",
    long_about = "Injects the Dragonfly proxy environment, the dfdaemon unix socket and the \
                  Dragonfly CLI tools into pods of labeled namespaces or annotated pods.",
    color = clap::ColorChoice::Always
)]
pub struct Cli {
    #[clap(subcommand)]
    commands: Option<Commands>,

    /// Path to the configuration file. Built-in defaults apply when omitted.
    #[clap(
        long = "config",
        short = 'c',
        env = "DRAGONFLY_P2P_WEBHOOK_CONFIG_FILE_PATH",
        help = "Specify a configuration file"
    )]
    config_file: Option<PathBuf>,

    #[clap(
        long = "log-level",
        env = "DRAGONFLY_P2P_WEBHOOK_LOG_LEVEL",
        help = "Set the logging level (e.g., info, debug, trace)"
    )]
    log_level: Option<tracing::Level>,

    #[clap(
        long = "inject-config-dir",
        env = "DRAGONFLY_P2P_WEBHOOK_INJECT_CONFIG_DIR",
        help = "Directory containing the injection policy config.yaml"
    )]
    inject_config_directory: Option<PathBuf>,

    #[clap(
        long = "webhook-listen-address",
        env = "DRAGONFLY_P2P_WEBHOOK_LISTEN_ADDRESS",
        help = "Address the admission webhook listens on"
    )]
    webhook_listen_address: Option<SocketAddr>,

    #[clap(
        long = "webhook-cert-dir",
        env = "DRAGONFLY_P2P_WEBHOOK_CERT_DIR",
        help = "Directory containing tls.crt and tls.key for the admission webhook"
    )]
    webhook_cert_directory: Option<PathBuf>,

    #[clap(
        long = "health-probe-address",
        env = "DRAGONFLY_P2P_WEBHOOK_HEALTH_PROBE_ADDRESS",
        help = "Address the health probe endpoints listen on"
    )]
    health_probe_address: Option<SocketAddr>,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Display client and server version information")]
    Version {
        #[clap(long = "client", help = "If true, shows client version only (no server required).")]
        client: bool,
    },

    #[command(about = "Generate shell completion script for the specified shell (bash, zsh, fish)")]
    Completions { shell: clap_complete::Shell },

    #[command(about = "Output the default configuration in YAML format")]
    DefaultConfig,

    #[command(about = "Output the default injection policy in YAML format")]
    DefaultInjectConfig,

    #[command(about = "Serve the admission webhook (default)")]
    Serve,
}

impl Default for Cli {
    fn default() -> Self { Self::parse() }
}

impl Cli {
    /// Loads the configuration file, if any, and applies the command line
    /// overrides on top of it.
    fn load_config(&self) -> Result<Config, Error> {
        let mut config = match &self.config_file {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(log_level) = self.log_level {
            config.log.level = log_level;
        }
        if let Some(directory) = &self.inject_config_directory {
            config.inject_config_directory.clone_from(directory);
        }
        if let Some(address) = self.webhook_listen_address {
            config.webhook.listen_address = address;
        }
        if let Some(directory) = &self.webhook_cert_directory {
            config.webhook.cert_directory.clone_from(directory);
        }
        if let Some(address) = self.health_probe_address {
            config.webhook.health_probe_address = address;
        }

        Ok(config)
    }

    fn write_stdout(data: &[u8]) -> Result<(), Error> {
        std::io::stdout().write_all(data).context(error::WriteStdoutSnafu)
    }

    /// Runs the selected command and returns the process exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded, the Kubernetes
    /// client cannot be created or the webhook fails.
    pub fn run(self) -> Result<i32, Error> {
        let client_version = Self::command().get_version().unwrap_or_default().to_string();
        match self.commands {
            Some(Commands::Version { client }) if client => {
                Self::write_stdout(Self::command().render_long_version().as_bytes())?;
                Self::write_stdout(format!("Client Version: {client_version}\n").as_bytes())?;
                return Ok(0);
            }
            Some(Commands::Completions { shell }) => {
                let mut app = Self::command();
                let bin_name = app.get_name().to_string();
                clap_complete::generate(shell, &mut app, bin_name, &mut std::io::stdout());
                return Ok(0);
            }
            Some(Commands::DefaultConfig) => {
                Self::write_stdout(Config::template_basic().as_bytes())?;
                return Ok(0);
            }
            Some(Commands::DefaultInjectConfig) => {
                Self::write_stdout(InjectConfig::template_basic().as_bytes())?;
                return Ok(0);
            }
            _ => {}
        }

        let config = self.load_config()?;
        config.log.registry();

        let fut = async move {
            let kube_client = kube::Client::try_default().await.context(error::KubeConfigSnafu)?;
            match self.commands {
                Some(Commands::Version { .. }) => {
                    let server_version = kube_client.apiserver_version().await.map_or_else(
                        |_| "unknown".to_string(),
                        |info| format!("{}.{}", info.major, info.minor),
                    );
                    Self::write_stdout(Self::command().render_long_version().as_bytes())?;
                    Self::write_stdout(
                        format!(
                            "Client Version: {client_version}\nServer Version: {server_version}\n"
                        )
                        .as_bytes(),
                    )?;
                }
                Some(Commands::Serve) | None => serve::serve(kube_client, config).await?,
                Some(
                    Commands::Completions { .. }
                    | Commands::DefaultConfig
                    | Commands::DefaultInjectConfig,
                ) => {}
            }

            Ok(0)
        };

        Runtime::new().context(error::InitializeTokioRuntimeSnafu)?.block_on(fut)
    }
}
