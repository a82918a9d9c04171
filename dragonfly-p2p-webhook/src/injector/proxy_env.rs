use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, ObjectFieldSelector, Pod};

use crate::{
    consts::k8s::env,
    ext::{ContainerExt, PodExt},
    injector::{InjectConfig, Injector},
};

/// Points every container at the dfdaemon proxy of its node.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProxyEnvInjector;

impl ProxyEnvInjector {
    fn envs(config: &InjectConfig) -> [EnvVar; 3] {
        [
            EnvVar {
                name: env::NODE_NAME.to_string(),
                value_from: Some(EnvVarSource {
                    field_ref: Some(ObjectFieldSelector {
                        field_path: env::NODE_NAME_FIELD_PATH.to_string(),
                        ..ObjectFieldSelector::default()
                    }),
                    ..EnvVarSource::default()
                }),
                ..EnvVar::default()
            },
            EnvVar {
                name: env::PROXY_PORT.to_string(),
                value: Some(config.proxy_port.to_string()),
                ..EnvVar::default()
            },
            // expanded by the container runtime, not here
            EnvVar {
                name: env::INJECT_PROXY.to_string(),
                value: Some(format!("http://$({}):$({})", env::NODE_NAME, env::PROXY_PORT)),
                ..EnvVar::default()
            },
        ]
    }
}

impl Injector for ProxyEnvInjector {
    fn name(&self) -> &'static str { "proxy-env" }

    fn inject(&self, pod: &mut Pod, config: &InjectConfig) {
        let envs = Self::envs(config);
        for container in pod.containers_mut() {
            for var in &envs {
                if container.push_env_if_absent(var.clone()) {
                    tracing::debug!("Injected env {} into container {}", var.name, container.name);
                }
            }
        }
    }
}
