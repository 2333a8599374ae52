// 模块声明
mod docker;
mod manager;
mod metadata;
mod registry;
mod status;
mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// 重新导出公共API
pub use docker::{BollardDocker, DockerApi, PullEvent};
pub use manager::ContainerManager;
pub use metadata::ContainerMetadata;
pub use status::get_docker_container_statuses;
pub use types::{
    BindMount, ContainerKind, ContainerOptions, ContainerProfile, ContainerStatus, HostConfigOptions,
    ImageOverride,
};
