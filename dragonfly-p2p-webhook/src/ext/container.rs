use k8s_openapi::api::core::v1::{Container, EnvVar, VolumeMount};

pub trait ContainerExt {
    fn has_env(&self, name: &str) -> bool;

    fn has_volume_mount(&self, name: &str) -> bool;

    /// Appends `env` unless a variable with the same name exists, whatever
    /// its value or source. Returns `true` when the variable was appended.
    fn push_env_if_absent(&mut self, env: EnvVar) -> bool;

    /// Appends `volume_mount` unless a mount with the same name exists.
    /// Returns `true` when the mount was appended.
    fn push_volume_mount_if_absent(&mut self, volume_mount: VolumeMount) -> bool;
}

impl ContainerExt for Container {
    fn has_env(&self, name: &str) -> bool {
        self.env.iter().flatten().any(|env| env.name == name)
    }

    fn has_volume_mount(&self, name: &str) -> bool {
        self.volume_mounts.iter().flatten().any(|volume_mount| volume_mount.name == name)
    }

    fn push_env_if_absent(&mut self, env: EnvVar) -> bool {
        if self.has_env(&env.name) {
            return false;
        }
        self.env.get_or_insert_with(Vec::new).push(env);
        true
    }

    fn push_volume_mount_if_absent(&mut self, volume_mount: VolumeMount) -> bool {
        if self.has_volume_mount(&volume_mount.name) {
            return false;
        }
        self.volume_mounts.get_or_insert_with(Vec::new).push(volume_mount);
        true
    }
}
