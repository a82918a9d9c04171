//! Kubernetes names read or written by the webhook.

pub mod labels {
    //! Namespace labels.

    /// Namespaces carrying this label with [`NAMESPACE_INJECTION_ENABLED`]
    /// have every pod injected.
    pub const NAMESPACE_INJECTION: &str = "dragonflyoss-injection";

    pub const NAMESPACE_INJECTION_ENABLED: &str = "enabled";
}

pub mod annotations {
    //! Pod annotations.

    /// Per-pod injection switch.
    pub const INJECT: &str = "dragonfly.io/inject";

    /// Value of [`INJECT`] that opts a pod in.
    pub const INJECT_ENABLED: &str = "true";

    /// Value of [`INJECT`] that opts a pod out, even inside an injected
    /// namespace.
    pub const INJECT_DISABLED: &str = "disabled";

    /// Overrides the image of the CLI tools init container.
    pub const CLI_TOOLS_IMAGE: &str = "dragonfly.io/cli-tools-image";
}

pub mod env {
    //! Environment variables added to every application container.

    pub const NODE_NAME: &str = "NODE_NAME";

    /// Downward API field resolved into [`NODE_NAME`].
    pub const NODE_NAME_FIELD_PATH: &str = "spec.nodeName";

    pub const PROXY_PORT: &str = "DRAGONFLY_PROXY_PORT";

    pub const INJECT_PROXY: &str = "DRAGONFLY_INJECT_PROXY";

    /// Directory where the CLI tools are available inside the container.
    pub const TOOLS_PATH: &str = "DRAGONFLY_TOOLS_PATH";
}

pub mod volumes {
    //! Pod volumes added by the injectors.

    pub const DFDAEMON_UNIX_SOCK: &str = "dfdaemon-unix-sock";

    /// Host path of the dfdaemon socket, mounted at the same path.
    pub const DFDAEMON_UNIX_SOCK_PATH: &str = "/var/run/dragonfly/dfdaemon.sock";

    /// `type` of the host path volume backing [`DFDAEMON_UNIX_SOCK`].
    pub const HOST_PATH_SOCKET: &str = "Socket";

    pub const CLI_TOOLS: &str = "d7y-cli-tools-volume";
}

pub mod containers {
    //! Containers added by the injectors.

    pub const CLI_TOOLS_INIT: &str = "d7y-cli-tools";

    pub const IMAGE_PULL_POLICY_IF_NOT_PRESENT: &str = "IfNotPresent";
}
