//! Extensions to `k8s_openapi` types.
//!
//! The helpers here are the building blocks of every injector: each `push_*`
//! method appends only when no entry with the same name exists, which keeps
//! the mutation additive and idempotent.

mod container;
mod pod;

pub use self::{container::ContainerExt, pod::PodExt};
