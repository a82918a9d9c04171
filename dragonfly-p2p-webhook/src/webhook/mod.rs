//! Admission-time pod mutation.
//!
//! [`PodDefaulter`] takes a snapshot of the injection policy, asks the
//! [`EligibilityPolicy`] whether the pod should be injected and, if so, runs
//! every injector against the pod in order. The [`server`] module exposes it
//! over HTTPS as a Kubernetes mutating admission webhook.

mod eligibility;
mod error;
pub mod server;

use k8s_openapi::api::core::v1::Pod;
use kube::core::{DynamicObject, admission::AdmissionRequest};
use snafu::{ResultExt, ensure};

pub use self::{
    eligibility::{EligibilityPolicy, NamespaceLookup},
    error::Error,
};
use crate::{
    consts::POD_KIND,
    injector::{self, ConfigManager, Injector},
};

pub struct PodDefaulter<L> {
    config_manager: ConfigManager,
    policy: EligibilityPolicy<L>,
    injectors: Vec<Box<dyn Injector>>,
}

impl<L> PodDefaulter<L>
where
    L: NamespaceLookup,
{
    pub fn new(config_manager: ConfigManager, policy: EligibilityPolicy<L>) -> Self {
        Self { config_manager, policy, injectors: injector::default_injectors() }
    }

    #[cfg(test)]
    pub(crate) fn with_injectors(
        config_manager: ConfigManager,
        policy: EligibilityPolicy<L>,
        injectors: Vec<Box<dyn Injector>>,
    ) -> Self {
        Self { config_manager, policy, injectors }
    }

    /// Injects `pod` in place when it is eligible. `namespace` is the
    /// namespace the pod is created in.
    pub async fn default(&self, pod: &mut Pod, namespace: &str) {
        let pod_name = pod.metadata.name.clone().unwrap_or_default();
        let config = self.config_manager.config();
        if !config.enabled {
            tracing::debug!("Injection is disabled, skip pod {pod_name}");
            return;
        }

        if !self.policy.is_injection_required(pod, namespace).await {
            tracing::debug!("Pod {pod_name} in namespace {namespace} is not injected");
            return;
        }

        tracing::info!("Injecting pod {pod_name} in namespace {namespace}");
        for injector in &self.injectors {
            tracing::debug!("Running injector {}", injector.name());
            injector.inject(pod, &config);
        }
    }

    /// Mutates the pod carried by `request` and returns the JSON patch that
    /// turns the submitted pod into the injected one, or `None` when nothing
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not a pod or cannot be converted to
    /// one.
    pub async fn mutate(
        &self,
        request: &AdmissionRequest<DynamicObject>,
    ) -> Result<Option<json_patch::Patch>, Error> {
        let Some(object) = request.object.as_ref() else {
            return Ok(None);
        };

        let kind =
            object.types.as_ref().map_or(request.kind.kind.as_str(), |types| types.kind.as_str());
        ensure!(kind == POD_KIND, error::UnexpectedObjectSnafu { kind });

        let value = serde_json::to_value(object).context(error::SerializePodSnafu)?;
        let mut pod = serde_json::from_value::<Pod>(value).context(error::DeserializePodSnafu)?;
        let before = serde_json::to_value(&pod).context(error::SerializePodSnafu)?;

        // generated pods carry no namespace until they are persisted
        let namespace = pod
            .metadata
            .namespace
            .clone()
            .or_else(|| request.namespace.clone())
            .unwrap_or_default();
        self.default(&mut pod, &namespace).await;

        let after = serde_json::to_value(&pod).context(error::SerializePodSnafu)?;
        let patch = json_patch::diff(&before, &after);
        Ok((!patch.0.is_empty()).then_some(patch))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex, PoisonError};

    use k8s_openapi::api::core::v1::{Container, PodSpec};
    use kube::core::admission::AdmissionReview;
    use serde_json::json;

    use super::{
        eligibility::tests::{FakeNamespaceLookup, pod_with_annotations},
        *,
    };
    use crate::injector::InjectConfig;

    /// Records the order in which it is called.
    struct RecordingInjector {
        name: &'static str,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Injector for RecordingInjector {
        fn name(&self) -> &'static str { self.name }

        fn inject(&self, _pod: &mut Pod, _config: &InjectConfig) {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(self.name);
        }
    }

    fn write_inject_config(directory: &std::path::Path, config: &InjectConfig) {
        let data = serde_yaml::to_string(config).expect("serializable config");
        std::fs::write(directory.join("config.yaml"), data).expect("writable temp dir");
    }

    fn lookup() -> FakeNamespaceLookup {
        FakeNamespaceLookup::default()
            .with_injected_namespace("injected")
            .with_namespace("plain", &[])
    }

    fn defaulter(config_dir: &tempfile::TempDir) -> PodDefaulter<FakeNamespaceLookup> {
        PodDefaulter::new(ConfigManager::new(config_dir.path()), EligibilityPolicy::new(lookup()))
    }

    fn pod_with_container(annotations: &[(&str, &str)]) -> Pod {
        Pod {
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "app".to_string(),
                    image: Some("nginx".to_string()),
                    ..Container::default()
                }],
                ..PodSpec::default()
            }),
            ..pod_with_annotations(annotations)
        }
    }

    fn spec(pod: &Pod) -> &PodSpec { pod.spec.as_ref().expect("pod spec") }

    fn env_names(pod: &Pod) -> Vec<String> {
        spec(pod).containers[0].env.iter().flatten().map(|env| env.name.clone()).collect()
    }

    #[tokio::test]
    async fn test_labeled_namespace_injects_everything() {
        let config_dir = tempfile::tempdir().expect("temp dir");
        let mut pod = pod_with_container(&[]);
        defaulter(&config_dir).default(&mut pod, "injected").await;

        let spec = spec(&pod);
        assert_eq!(env_names(&pod), [
            "NODE_NAME",
            "DRAGONFLY_PROXY_PORT",
            "DRAGONFLY_INJECT_PROXY",
            "DRAGONFLY_TOOLS_PATH"
        ]);
        let envs = spec.containers[0].env.clone().unwrap_or_default();
        assert_eq!(envs[1].value.as_deref(), Some("4001"));
        assert_eq!(envs[2].value.as_deref(), Some("http://$(NODE_NAME):$(DRAGONFLY_PROXY_PORT)"));
        assert_eq!(envs[3].value.as_deref(), Some("/dragonfly-tools-mount"));

        let volumes =
            spec.volumes.iter().flatten().map(|volume| volume.name.as_str()).collect::<Vec<_>>();
        assert_eq!(volumes, ["dfdaemon-unix-sock", "d7y-cli-tools-volume"]);

        let init_containers = spec.init_containers.clone().unwrap_or_default();
        assert_eq!(init_containers.len(), 1);
        assert_eq!(init_containers[0].name, "d7y-cli-tools");
        assert_eq!(init_containers[0].image.as_deref(), Some("dragonflyoss/cli-tools:latest"));
    }

    #[tokio::test]
    async fn test_second_injection_changes_nothing() {
        let config_dir = tempfile::tempdir().expect("temp dir");
        let defaulter = defaulter(&config_dir);
        let mut pod = pod_with_container(&[("dragonfly.io/cli-tools-image", "custom/tools:v1")]);

        defaulter.default(&mut pod, "injected").await;
        let injected = pod.clone();
        defaulter.default(&mut pod, "injected").await;
        assert_eq!(pod, injected);

        let spec = spec(&pod);
        assert_eq!(spec.containers[0].env.iter().flatten().count(), 4);
        assert_eq!(spec.containers[0].volume_mounts.iter().flatten().count(), 2);
        assert_eq!(spec.volumes.iter().flatten().count(), 2);
        assert_eq!(spec.init_containers.iter().flatten().count(), 1);

        let mut annotated = pod_with_container(&[("dragonfly.io/inject", "true")]);
        defaulter.default(&mut annotated, "plain").await;
        let injected = annotated.clone();
        defaulter.default(&mut annotated, "plain").await;
        assert_eq!(annotated, injected);
    }

    #[tokio::test]
    async fn test_annotated_pod_uses_image_override() {
        let config_dir = tempfile::tempdir().expect("temp dir");
        let mut pod = pod_with_container(&[
            ("dragonfly.io/inject", "true"),
            ("dragonfly.io/cli-tools-image", "custom/image:tag"),
        ]);
        defaulter(&config_dir).default(&mut pod, "plain").await;

        let init_containers = spec(&pod).init_containers.clone().unwrap_or_default();
        assert_eq!(init_containers[0].image.as_deref(), Some("custom/image:tag"));
    }

    #[tokio::test]
    async fn test_ineligible_pod_is_unchanged() {
        let config_dir = tempfile::tempdir().expect("temp dir");
        let original = pod_with_container(&[]);

        let mut pod = original.clone();
        defaulter(&config_dir).default(&mut pod, "plain").await;
        assert_eq!(pod, original);

        // the namespace cannot be found
        let mut pod = original.clone();
        defaulter(&config_dir).default(&mut pod, "missing").await;
        assert_eq!(pod, original);
    }

    #[tokio::test]
    async fn test_disabled_config_skips_injection() {
        let config_dir = tempfile::tempdir().expect("temp dir");
        write_inject_config(config_dir.path(), &InjectConfig {
            enabled: false,
            ..InjectConfig::default()
        });
        let original = pod_with_container(&[("dragonfly.io/inject", "true")]);

        let mut pod = original.clone();
        defaulter(&config_dir).default(&mut pod, "injected").await;
        assert_eq!(pod, original);
    }

    #[tokio::test]
    async fn test_reloaded_config_applies_to_next_pod() {
        let config_dir = tempfile::tempdir().expect("temp dir");
        let config_manager = ConfigManager::new(config_dir.path());
        let defaulter =
            PodDefaulter::new(config_manager.clone(), EligibilityPolicy::new(lookup()));

        write_inject_config(config_dir.path(), &InjectConfig {
            proxy_port: 5001,
            ..InjectConfig::default()
        });
        config_manager.reload().await;

        let mut pod = pod_with_container(&[]);
        defaulter.default(&mut pod, "injected").await;
        let envs = spec(&pod).containers[0].env.clone().unwrap_or_default();
        assert_eq!(envs[1].value.as_deref(), Some("5001"));
    }

    #[tokio::test]
    async fn test_injectors_run_in_order() {
        let config_dir = tempfile::tempdir().expect("temp dir");
        let calls = Arc::new(Mutex::new(Vec::new()));
        let injectors = ["first", "second", "third"]
            .into_iter()
            .map(|name| -> Box<dyn Injector> {
                Box::new(RecordingInjector { name, calls: Arc::clone(&calls) })
            })
            .collect();
        let defaulter = PodDefaulter::with_injectors(
            ConfigManager::new(config_dir.path()),
            EligibilityPolicy::new(lookup()),
            injectors,
        );

        let mut pod = pod_with_container(&[]);
        defaulter.default(&mut pod, "plain").await;
        assert!(calls.lock().unwrap_or_else(PoisonError::into_inner).is_empty());

        defaulter.default(&mut pod, "injected").await;
        assert_eq!(*calls.lock().unwrap_or_else(PoisonError::into_inner), [
            "first", "second", "third"
        ]);
    }

    fn admission_request(object: &serde_json::Value) -> AdmissionRequest<DynamicObject> {
        let review = json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": {"group": "", "version": "v1", "kind": "Pod"},
                "resource": {"group": "", "version": "v1", "resource": "pods"},
                "namespace": "injected",
                "operation": "CREATE",
                "userInfo": {"username": "admin"},
                "object": object,
                "oldObject": null,
                "dryRun": false
            }
        });
        serde_json::from_value::<AdmissionReview<DynamicObject>>(review)
            .expect("valid admission review")
            .try_into()
            .expect("admission review carries a request")
    }

    #[tokio::test]
    async fn test_mutate_returns_patch_for_eligible_pod() {
        let config_dir = tempfile::tempdir().expect("temp dir");
        let request = admission_request(&json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"generateName": "app-"},
            "spec": {"containers": [{"name": "app", "image": "nginx"}]}
        }));

        let patch = defaulter(&config_dir)
            .mutate(&request)
            .await
            .expect("pod is mutated")
            .expect("pod in labeled namespace is patched");

        let mut patched = serde_json::to_value(request.object.expect("object")).expect("json");
        json_patch::patch(&mut patched, &patch.0).expect("patch applies");
        let pod = serde_json::from_value::<Pod>(patched).expect("patched pod");
        assert_eq!(env_names(&pod).len(), 4);
        assert_eq!(spec(&pod).volumes.as_ref().map(Vec::len), Some(2));
        assert_eq!(spec(&pod).init_containers.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_mutate_without_changes_returns_no_patch() {
        let config_dir = tempfile::tempdir().expect("temp dir");
        let request = admission_request(&json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "app", "namespace": "plain"},
            "spec": {"containers": [{"name": "app", "image": "nginx"}]}
        }));

        let patch = defaulter(&config_dir).mutate(&request).await.expect("pod is accepted");
        assert!(patch.is_none());
    }

    #[tokio::test]
    async fn test_mutate_rejects_other_kinds() {
        let config_dir = tempfile::tempdir().expect("temp dir");
        let request = admission_request(&json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "settings"},
            "data": {"key": "value"}
        }));

        let err = defaulter(&config_dir).mutate(&request).await.expect_err("not a pod");
        assert_eq!(err.to_string(), "expected a Pod object but got ConfigMap");
    }
}
