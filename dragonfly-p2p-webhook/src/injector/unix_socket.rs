use k8s_openapi::api::core::v1::{HostPathVolumeSource, Pod, Volume, VolumeMount};

use crate::{
    consts::k8s::volumes,
    ext::{ContainerExt, PodExt},
    injector::{InjectConfig, Injector},
};

/// Mounts the dfdaemon unix socket of the node into every container.
#[derive(Clone, Debug)]
pub struct UnixSocketInjector {
    volume: Volume,
    volume_mount: VolumeMount,
}

impl Default for UnixSocketInjector {
    fn default() -> Self {
        let volume = Volume {
            name: volumes::DFDAEMON_UNIX_SOCK.to_string(),
            host_path: Some(HostPathVolumeSource {
                path: volumes::DFDAEMON_UNIX_SOCK_PATH.to_string(),
                type_: Some(volumes::HOST_PATH_SOCKET.to_string()),
            }),
            ..Volume::default()
        };
        let volume_mount = VolumeMount {
            name: volumes::DFDAEMON_UNIX_SOCK.to_string(),
            mount_path: volumes::DFDAEMON_UNIX_SOCK_PATH.to_string(),
            ..VolumeMount::default()
        };
        Self { volume, volume_mount }
    }
}

impl Injector for UnixSocketInjector {
    fn name(&self) -> &'static str { "unix-socket" }

    fn inject(&self, pod: &mut Pod, _config: &InjectConfig) {
        // an existing volume with the same name is kept as is
        if !pod.push_volume_if_absent(self.volume.clone()) {
            tracing::debug!("Volume {} already exists", self.volume.name);
        }

        for container in pod.containers_mut() {
            if container.push_volume_mount_if_absent(self.volume_mount.clone()) {
                tracing::debug!(
                    "Mounted volume {} into container {}",
                    self.volume_mount.name,
                    container.name
                );
            }
        }
    }
}
