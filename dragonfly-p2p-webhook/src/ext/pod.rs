use k8s_openapi::{
    Metadata,
    api::core::v1::{Container, Pod, PodSpec, Volume},
};

pub trait PodExt {
    fn annotation(&self, key: &str) -> Option<&str>;

    fn has_volume(&self, name: &str) -> bool;

    fn has_init_container(&self, name: &str) -> bool;

    /// Application containers, empty when the pod has no spec.
    fn containers_mut(&mut self) -> &mut [Container];

    /// Appends `volume` unless a volume with the same name exists.
    /// Returns `true` when the volume was appended.
    fn push_volume_if_absent(&mut self, volume: Volume) -> bool;

    /// Appends `container` to the init containers unless one with the same
    /// name exists. Returns `true` when the container was appended.
    fn push_init_container_if_absent(&mut self, container: Container) -> bool;
}

impl PodExt for Pod {
    fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata().annotations.as_ref()?.get(key).map(String::as_str)
    }

    fn has_volume(&self, name: &str) -> bool {
        self.spec
            .as_ref()
            .and_then(|spec| spec.volumes.as_ref())
            .is_some_and(|volumes| volumes.iter().any(|volume| volume.name == name))
    }

    fn has_init_container(&self, name: &str) -> bool {
        self.spec
            .as_ref()
            .and_then(|spec| spec.init_containers.as_ref())
            .is_some_and(|containers| containers.iter().any(|container| container.name == name))
    }

    fn containers_mut(&mut self) -> &mut [Container] {
        match self.spec.as_mut() {
            Some(spec) => spec.containers.as_mut_slice(),
            None => &mut [],
        }
    }

    fn push_volume_if_absent(&mut self, volume: Volume) -> bool {
        if self.has_volume(&volume.name) {
            return false;
        }
        self.spec
            .get_or_insert_with(PodSpec::default)
            .volumes
            .get_or_insert_with(Vec::new)
            .push(volume);
        true
    }

    fn push_init_container_if_absent(&mut self, container: Container) -> bool {
        if self.has_init_container(&container.name) {
            return false;
        }
        self.spec
            .get_or_insert_with(PodSpec::default)
            .init_containers
            .get_or_insert_with(Vec::new)
            .push(container);
        true
    }
}
