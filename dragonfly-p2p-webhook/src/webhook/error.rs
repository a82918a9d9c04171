use std::{net::SocketAddr, path::PathBuf};

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to get namespace {namespace}, error: {source}"))]
    GetNamespace {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Namespace {namespace} is not found"))]
    NamespaceNotFound { namespace: String },

    #[snafu(display("expected a Pod object but got {kind}"))]
    UnexpectedObject { kind: String },

    #[snafu(display("Failed to serialize pod, error: {source}"))]
    SerializePod { source: serde_json::Error },

    #[snafu(display("Failed to deserialize pod, error: {source}"))]
    DeserializePod { source: serde_json::Error },

    #[snafu(display("Failed to attach patch to admission response, error: {source}"))]
    SerializePatch { source: kube::core::admission::SerializePatchError },

    #[snafu(display("Failed to read certificate file {}, error: {source}", file_path.display()))]
    ReadCertificate { file_path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to bind admission webhook on {socket_address}, error: {source}"))]
    BindWebhook { socket_address: SocketAddr, source: warp::Error },

    #[snafu(display("Failed to bind health probe server on {socket_address}, error: {source}"))]
    BindHealthProbe { socket_address: SocketAddr, source: warp::Error },
}
