use std::{net::SocketAddr, path::PathBuf};

use dragonfly_p2p_webhook_base::config;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// Address of the HTTPS admission endpoint.
    #[serde(default = "config::default_webhook_listen_address")]
    pub listen_address: SocketAddr,

    /// Address of the plain HTTP `/healthz` and `/readyz` endpoints.
    #[serde(default = "config::default_health_probe_address")]
    pub health_probe_address: SocketAddr,

    /// Directory holding the serving certificate and its private key.
    #[serde(default = "config::default_webhook_cert_directory")]
    pub cert_directory: PathBuf,

    #[serde(default = "default_cert_name")]
    pub cert_name: String,

    #[serde(default = "default_key_name")]
    pub key_name: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            listen_address: config::default_webhook_listen_address(),
            health_probe_address: config::default_health_probe_address(),
            cert_directory: config::default_webhook_cert_directory(),
            cert_name: default_cert_name(),
            key_name: default_key_name(),
        }
    }
}

impl WebhookConfig {
    pub fn cert_file_path(&self) -> PathBuf { self.cert_directory.join(&self.cert_name) }

    pub fn key_file_path(&self) -> PathBuf { self.cert_directory.join(&self.key_name) }
}

fn default_cert_name() -> String { "tls.crt".to_string() }

fn default_key_name() -> String { "tls.key".to_string() }
