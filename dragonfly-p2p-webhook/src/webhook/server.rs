use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use kube::core::{
    DynamicObject,
    admission::{AdmissionRequest, AdmissionResponse, AdmissionReview},
};
use snafu::ResultExt;
use warp::{Filter, Rejection, Reply, reply};

use crate::{
    config::WebhookConfig,
    consts::MUTATE_POD_PATH,
    webhook::{
        NamespaceLookup, PodDefaulter,
        error::{self, Error},
    },
};

/// `POST /mutate--v1-pod`, answering every `AdmissionReview` with an
/// `AdmissionReview`.
pub fn mutate_routes<L>(
    defaulter: Arc<PodDefaulter<L>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone
where
    L: NamespaceLookup + 'static,
{
    warp::post()
        .and(warp::path(MUTATE_POD_PATH))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(warp::any().map(move || Arc::clone(&defaulter)))
        .and_then(mutate_handler)
        .with(warp::trace::request())
}

/// `GET /healthz` and `GET /readyz`.
pub fn health_routes() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let healthz = warp::path("healthz").and(warp::path::end()).map(|| "ok");
    let readyz = warp::path("readyz").and(warp::path::end()).map(|| "ok");
    warp::get().and(healthz.or(readyz).unify())
}

async fn mutate_handler<L>(
    review: AdmissionReview<DynamicObject>,
    defaulter: Arc<PodDefaulter<L>>,
) -> Result<impl Reply, Infallible>
where
    L: NamespaceLookup,
{
    let response = admit(&defaulter, review).await;
    Ok(reply::json(&response.into_review()))
}

async fn admit<L>(
    defaulter: &PodDefaulter<L>,
    review: AdmissionReview<DynamicObject>,
) -> AdmissionResponse
where
    L: NamespaceLookup,
{
    let request: AdmissionRequest<_> = match review.try_into() {
        Ok(request) => request,
        Err(err) => {
            tracing::error!("Invalid admission review, error: {err}");
            return AdmissionResponse::invalid(err.to_string());
        }
    };

    let target = format!(
        "{:?} on pod {}/{}",
        request.operation,
        request.namespace.as_deref().unwrap_or_default(),
        request.name
    );
    let response = AdmissionResponse::from(&request);
    let patch = match defaulter.mutate(&request).await {
        Ok(Some(patch)) => patch,
        Ok(None) => {
            tracing::info!("Accepted {target} without changes");
            return response;
        }
        Err(err) => {
            tracing::warn!("Denied {target}, error: {err}");
            return response.deny(err.to_string());
        }
    };

    match response.clone().with_patch(patch).context(error::SerializePatchSnafu) {
        Ok(response) => {
            tracing::info!("Accepted {target} with patch");
            response
        }
        Err(err) => {
            tracing::warn!("Denied {target}, error: {err}");
            response.deny(err.to_string())
        }
    }
}

/// Serves [`mutate_routes`] over HTTPS until `shutdown_signal` resolves.
///
/// # Errors
///
/// Returns an error if the serving certificate or key cannot be read, or if
/// the listener cannot be bound with them.
pub async fn serve_webhook<L>(
    defaulter: Arc<PodDefaulter<L>>,
    config: &WebhookConfig,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Error>
where
    L: NamespaceLookup + 'static,
{
    let cert_file_path = config.cert_file_path();
    let key_file_path = config.key_file_path();
    for file_path in [&cert_file_path, &key_file_path] {
        let _metadata = tokio::fs::metadata(file_path)
            .await
            .with_context(|_| error::ReadCertificateSnafu { file_path: file_path.clone() })?;
    }

    let (socket_address, server) = warp::serve(mutate_routes(defaulter))
        .tls()
        .cert_path(&cert_file_path)
        .key_path(&key_file_path)
        .try_bind_with_graceful_shutdown(config.listen_address, shutdown_signal)
        .context(error::BindWebhookSnafu { socket_address: config.listen_address })?;
    tracing::info!("Webhook server is listening on {socket_address}");

    server.await;
    tracing::info!("Webhook server is shut down gracefully");
    Ok(())
}

/// Serves [`health_routes`] over plain HTTP until `shutdown_signal` resolves.
///
/// # Errors
///
/// Returns an error if `socket_address` cannot be bound.
pub async fn serve_health_probe(
    socket_address: SocketAddr,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Error> {
    let (local_address, server) = warp::serve(health_routes())
        .try_bind_with_graceful_shutdown(socket_address, shutdown_signal)
        .context(error::BindHealthProbeSnafu { socket_address })?;
    tracing::info!("Health probe server is listening on {local_address}");

    server.await;
    tracing::info!("Health probe server is shut down gracefully");
    Ok(())
}
