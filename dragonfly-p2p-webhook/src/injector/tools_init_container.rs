use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, EnvVar, Pod, Volume, VolumeMount,
};

use crate::{
    consts::k8s::{annotations, containers, env, volumes},
    ext::{ContainerExt, PodExt},
    injector::{InjectConfig, Injector},
};

/// Stages the Dragonfly CLI tools into a shared `emptyDir` volume with an
/// init container and exposes them to every container.
#[derive(Clone, Copy, Debug, Default)]
pub struct ToolsInitContainerInjector;

impl ToolsInitContainerInjector {
    fn image<'a>(pod: &'a Pod, config: &'a InjectConfig) -> &'a str {
        pod.annotation(annotations::CLI_TOOLS_IMAGE).unwrap_or(&config.cli_tools_image)
    }

    fn volume_mount(mount_path: &str) -> VolumeMount {
        VolumeMount {
            name: volumes::CLI_TOOLS.to_string(),
            mount_path: mount_path.to_string(),
            ..VolumeMount::default()
        }
    }

    fn init_container(image: &str, dir_path: &str, mount_path: &str) -> Container {
        Container {
            name: containers::CLI_TOOLS_INIT.to_string(),
            image: Some(image.to_string()),
            image_pull_policy: Some(containers::IMAGE_PULL_POLICY_IF_NOT_PRESENT.to_string()),
            volume_mounts: Some(vec![Self::volume_mount(mount_path)]),
            command: Some(vec![
                "cp".to_string(),
                "-rf".to_string(),
                format!("{dir_path}/."),
                format!("{mount_path}/"),
            ]),
            ..Container::default()
        }
    }

    fn volume() -> Volume {
        Volume {
            name: volumes::CLI_TOOLS.to_string(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Volume::default()
        }
    }
}

impl Injector for ToolsInitContainerInjector {
    fn name(&self) -> &'static str { "cli-tools-init-container" }

    fn inject(&self, pod: &mut Pod, config: &InjectConfig) {
        let mount_path = config.cli_tools_mount_path();
        let init_container =
            Self::init_container(Self::image(pod, config), &config.cli_tools_dir_path, &mount_path);

        if pod.push_init_container_if_absent(init_container) {
            tracing::debug!("Added init container {}", containers::CLI_TOOLS_INIT);
        }
        let _unused = pod.push_volume_if_absent(Self::volume());

        let volume_mount = Self::volume_mount(&mount_path);
        let tools_path =
            EnvVar { name: env::TOOLS_PATH.to_string(), value: Some(mount_path), ..EnvVar::default() };

        // each container is checked on its own
        for container in pod.containers_mut() {
            let _unused = container.push_volume_mount_if_absent(volume_mount.clone());
            let _unused = container.push_env_if_absent(tools_path.clone());
        }
    }
}
