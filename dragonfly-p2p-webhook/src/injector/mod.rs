//! Pod mutators and the injection policy they read.
//!
//! Every [`Injector`] touches a distinct part of the pod and only ever
//! appends: an entry whose name is already taken is left alone. Running an
//! injector twice therefore yields the same pod as running it once, which
//! makes a re-delivered admission request converge instead of duplicating
//! fields.

mod config;
mod error;
mod proxy_env;
mod tools_init_container;
mod unix_socket;

use k8s_openapi::api::core::v1::Pod;

pub use self::config::{ConfigManager, InjectConfig};
use self::{
    proxy_env::ProxyEnvInjector, tools_init_container::ToolsInitContainerInjector,
    unix_socket::UnixSocketInjector,
};

pub trait Injector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn inject(&self, pod: &mut Pod, config: &InjectConfig);
}

/// The injectors applied to an eligible pod, in application order.
pub fn default_injectors() -> Vec<Box<dyn Injector>> {
    vec![
        Box::new(ProxyEnvInjector),
        Box::new(UnixSocketInjector::default()),
        Box::new(ToolsInitContainerInjector),
    ]
}
