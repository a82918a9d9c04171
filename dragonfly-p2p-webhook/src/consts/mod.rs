pub mod k8s;

/// Path of the pod mutation endpoint registered in the
/// `MutatingWebhookConfiguration`.
pub const MUTATE_POD_PATH: &str = "mutate--v1-pod";

/// Kind of the only object this webhook mutates.
pub const POD_KIND: &str = "Pod";
