use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::Api;
use snafu::{OptionExt, ResultExt};

use crate::{
    consts::k8s::{annotations, labels},
    ext::PodExt,
    webhook::error::{self, Error},
};

/// Read access to `Namespace` objects.
pub trait NamespaceLookup: Send + Sync {
    fn get_namespace(&self, name: &str) -> impl Future<Output = Result<Namespace, Error>> + Send;
}

impl NamespaceLookup for Api<Namespace> {
    fn get_namespace(&self, name: &str) -> impl Future<Output = Result<Namespace, Error>> + Send {
        async move {
            self.get_opt(name)
                .await
                .with_context(|_| error::GetNamespaceSnafu { namespace: name.to_string() })?
                .with_context(|| error::NamespaceNotFoundSnafu { namespace: name.to_string() })
        }
    }
}

/// Decides whether a pod gets injected.
///
/// A pod is injected when its namespace is labeled
/// `dragonflyoss-injection=enabled` or the pod is annotated
/// `dragonfly.io/inject=true`. The annotation `dragonfly.io/inject=disabled`
/// opts a pod out in every case.
#[derive(Clone, Debug)]
pub struct EligibilityPolicy<L> {
    lookup: L,
}

impl<L> EligibilityPolicy<L>
where
    L: NamespaceLookup,
{
    pub const fn new(lookup: L) -> Self { Self { lookup } }

    pub async fn is_injection_required(&self, pod: &Pod, namespace: &str) -> bool {
        if pod.annotation(annotations::INJECT) == Some(annotations::INJECT_DISABLED) {
            tracing::debug!("Pod opted out of injection");
            return false;
        }

        self.is_namespace_injected(namespace).await || Self::is_pod_injected(pod)
    }

    async fn is_namespace_injected(&self, namespace: &str) -> bool {
        if namespace.is_empty() {
            return false;
        }

        match self.lookup.get_namespace(namespace).await {
            Ok(namespace) => namespace
                .metadata
                .labels
                .as_ref()
                .and_then(|labels| labels.get(labels::NAMESPACE_INJECTION))
                .is_some_and(|value| value == labels::NAMESPACE_INJECTION_ENABLED),
            Err(err) => {
                tracing::warn!("{err}");
                false
            }
        }
    }

    fn is_pod_injected(pod: &Pod) -> bool {
        pod.annotation(annotations::INJECT) == Some(annotations::INJECT_ENABLED)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::{BTreeMap, HashMap};

    use kube::api::ObjectMeta;

    use super::*;

    /// In-memory namespaces keyed by name.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct FakeNamespaceLookup {
        namespaces: HashMap<String, Namespace>,
    }

    impl FakeNamespaceLookup {
        pub(crate) fn with_namespace(mut self, name: &str, labels: &[(&str, &str)]) -> Self {
            let labels = labels
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect::<BTreeMap<_, _>>();
            let namespace = Namespace {
                metadata: ObjectMeta {
                    name: Some(name.to_string()),
                    labels: (!labels.is_empty()).then_some(labels),
                    ..ObjectMeta::default()
                },
                ..Namespace::default()
            };
            let _unused = self.namespaces.insert(name.to_string(), namespace);
            self
        }

        pub(crate) fn with_injected_namespace(self, name: &str) -> Self {
            self.with_namespace(name, &[("dragonflyoss-injection", "enabled")])
        }
    }

    impl NamespaceLookup for FakeNamespaceLookup {
        fn get_namespace(
            &self,
            name: &str,
        ) -> impl Future<Output = Result<Namespace, Error>> + Send {
            std::future::ready(
                self.namespaces
                    .get(name)
                    .cloned()
                    .with_context(|| error::NamespaceNotFoundSnafu { namespace: name.to_string() }),
            )
        }
    }

    pub(crate) fn pod_with_annotations(annotations: &[(&str, &str)]) -> Pod {
        let annotations = annotations
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect::<BTreeMap<_, _>>();
        Pod {
            metadata: ObjectMeta {
                name: Some("test-pod".to_string()),
                annotations: (!annotations.is_empty()).then_some(annotations),
                ..ObjectMeta::default()
            },
            ..Pod::default()
        }
    }

    fn policy() -> EligibilityPolicy<FakeNamespaceLookup> {
        EligibilityPolicy::new(
            FakeNamespaceLookup::default()
                .with_injected_namespace("injected")
                .with_namespace("plain", &[])
                .with_namespace("other-label", &[("team", "storage")])
                .with_namespace("upper-case", &[("dragonflyoss-injection", "Enabled")]),
        )
    }

    #[tokio::test]
    async fn test_namespace_signal() {
        let policy = policy();
        let pod = pod_with_annotations(&[]);

        assert!(policy.is_injection_required(&pod, "injected").await);
        assert!(!policy.is_injection_required(&pod, "plain").await);
        assert!(!policy.is_injection_required(&pod, "other-label").await);
        assert!(!policy.is_injection_required(&pod, "upper-case").await);
    }

    #[tokio::test]
    async fn test_pod_signal() {
        let policy = policy();

        assert!(
            policy
                .is_injection_required(&pod_with_annotations(&[("dragonfly.io/inject", "true")]), "plain")
                .await
        );
        assert!(
            !policy
                .is_injection_required(&pod_with_annotations(&[("dragonfly.io/inject", "True")]), "plain")
                .await
        );
        assert!(
            !policy
                .is_injection_required(&pod_with_annotations(&[("other", "true")]), "plain")
                .await
        );
    }

    #[tokio::test]
    async fn test_either_signal_is_enough() {
        let policy = policy();
        let annotated = pod_with_annotations(&[("dragonfly.io/inject", "true")]);
        let plain = pod_with_annotations(&[]);

        assert!(policy.is_injection_required(&annotated, "injected").await);
        assert!(policy.is_injection_required(&annotated, "plain").await);
        assert!(policy.is_injection_required(&plain, "injected").await);
        assert!(!policy.is_injection_required(&plain, "plain").await);
    }

    #[tokio::test]
    async fn test_failed_lookup_falls_through_to_pod_signal() {
        let policy = policy();

        assert!(!policy.is_injection_required(&pod_with_annotations(&[]), "missing").await);
        assert!(
            policy
                .is_injection_required(&pod_with_annotations(&[("dragonfly.io/inject", "true")]), "missing")
                .await
        );
        assert!(!policy.is_injection_required(&pod_with_annotations(&[]), "").await);
    }

    #[tokio::test]
    async fn test_opt_out_wins_over_namespace_label() {
        let policy = policy();
        let pod = pod_with_annotations(&[("dragonfly.io/inject", "disabled")]);

        assert!(!policy.is_injection_required(&pod, "injected").await);
    }
}
