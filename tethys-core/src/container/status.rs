use super::docker::DockerApi;
use super::metadata::ContainerMetadata;
use super::types::{ContainerKind, ContainerStatus};
use crate::Result;
use std::collections::{BTreeMap, BTreeSet};

/// 查询容器状态
///
/// 只发起两次列表查询（全部容器、运行中容器），与容器数量无关。
pub async fn get_docker_container_statuses(
    docker: &dyn DockerApi,
    containers: &[ContainerMetadata],
) -> Result<BTreeMap<ContainerKind, ContainerStatus>> {
    let all: BTreeSet<String> = docker.list_container_names(true).await?.into_iter().collect();
    let running: BTreeSet<String> = docker.list_container_names(false).await?.into_iter().collect();

    Ok(containers
        .iter()
        .map(|container| {
            let status = if running.contains(container.name()) {
                ContainerStatus::Running
            } else if all.contains(container.name()) {
                ContainerStatus::Stopped
            } else {
                ContainerStatus::NotInstalled
            };
            (container.kind(), status)
        })
        .collect())
}
