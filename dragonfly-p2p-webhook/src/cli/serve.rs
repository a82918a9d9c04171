use std::sync::Arc;

use dragonfly_p2p_webhook_base::{PROJECT_NAME_WITH_INITIAL_CAPITAL, PROJECT_VERSION};
use k8s_openapi::api::core::v1::Namespace;
use kube::Api;
use sigfinn::LifecycleManager;

use crate::{
    cli::Error,
    config::Config,
    injector::ConfigManager,
    webhook::{EligibilityPolicy, PodDefaulter, server},
};

/// Runs the injection policy reloader, the admission webhook and the health
/// probe server until the process receives `SIGINT` or `SIGTERM`.
pub async fn serve(kube_client: kube::Client, config: Config) -> Result<(), Error> {
    let Config { webhook: webhook_config, inject_config_directory, .. } = config;
    tracing::info!("Starting {PROJECT_NAME_WITH_INITIAL_CAPITAL} {PROJECT_VERSION}");

    let config_manager = ConfigManager::new(inject_config_directory);
    tracing::info!(
        "Loaded inject config from {}: {:?}",
        config_manager.config_path().display(),
        config_manager.config()
    );

    let policy = EligibilityPolicy::new(Api::<Namespace>::all(kube_client));
    let defaulter = Arc::new(PodDefaulter::new(config_manager.clone(), policy));
    let health_probe_address = webhook_config.health_probe_address;

    let lifecycle_manager = LifecycleManager::<Error>::new();
    let _handle = lifecycle_manager.spawn("inject-config-reloader", move |shutdown_signal| {
        async move {
            config_manager.run(shutdown_signal).await;
            sigfinn::ExitStatus::Success
        }
    });
    let _handle = lifecycle_manager.spawn("webhook-server", move |shutdown_signal| async move {
        match server::serve_webhook(defaulter, &webhook_config, shutdown_signal).await {
            Ok(()) => sigfinn::ExitStatus::Success,
            Err(err) => sigfinn::ExitStatus::FatalError(Error::from(err)),
        }
    });
    let _handle = lifecycle_manager.spawn("health-probe-server", move |shutdown_signal| {
        async move {
            match server::serve_health_probe(health_probe_address, shutdown_signal).await {
                Ok(()) => sigfinn::ExitStatus::Success,
                Err(err) => sigfinn::ExitStatus::FatalError(Error::from(err)),
            }
        }
    });

    if let Ok(Err(err)) = lifecycle_manager.serve().await {
        tracing::error!("{err}");
        Err(err)
    } else {
        Ok(())
    }
}
