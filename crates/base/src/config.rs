use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use crate::PROJECT_NAME;

/// Directory where the injection policy `ConfigMap` is mounted.
#[inline]
#[must_use]
pub fn default_inject_config_directory() -> PathBuf {
    [PathBuf::from("/etc"), PathBuf::from(PROJECT_NAME)].into_iter().collect()
}

/// Directory where the serving certificate `Secret` is mounted.
#[inline]
#[must_use]
pub fn default_webhook_cert_directory() -> PathBuf {
    PathBuf::from("/tmp/k8s-webhook-server/serving-certs")
}

#[inline]
#[must_use]
pub const fn default_webhook_listen_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 9443)
}

#[inline]
#[must_use]
pub const fn default_health_probe_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8081)
}
