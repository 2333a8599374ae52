use super::docker::DockerApi;
use super::metadata::ContainerMetadata;
use super::types::{ContainerKind, ImageOverride};
use crate::config::AppConfig;
use crate::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// 容器管理上下文：持有 Docker 客户端、配置以及全部容器描述
pub struct ContainerManager {
    docker: Arc<dyn DockerApi>,
    config: AppConfig,
    registry: BTreeMap<ContainerKind, ContainerMetadata>,
}

impl ContainerManager {
    pub fn new(docker: Arc<dyn DockerApi>, config: AppConfig) -> Self {
        let registry = ContainerKind::ALL
            .into_iter()
            .map(|kind| (kind, Self::build_metadata(&config, kind)))
            .collect();

        Self {
            docker,
            config,
            registry,
        }
    }

    fn build_metadata(config: &AppConfig, kind: ContainerKind) -> ContainerMetadata {
        ContainerMetadata::new(kind, config.geoserver_data_dir(), config.thredds_data_dir())
    }

    pub fn docker(&self) -> &dyn DockerApi {
        self.docker.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 注册表中的描述（始终使用声明的镜像）
    pub fn metadata(&self, kind: ContainerKind) -> Option<&ContainerMetadata> {
        self.registry.get(&kind)
    }

    /// 按选择器与安装状态筛选容器
    ///
    /// - `selection` 为 `None` 时选择全部容器，结果去重并按固定顺序排列
    /// - `installed` 为 `Some(flag)` 时只保留安装状态等于 `flag` 的容器
    /// - 镜像覆盖只作用于本次返回的描述，不影响注册表
    pub async fn get_containers(
        &self,
        selection: Option<&[ContainerKind]>,
        installed: Option<bool>,
        image: &ImageOverride,
    ) -> Result<Vec<ContainerMetadata>> {
        let selected: BTreeSet<ContainerKind> = match selection {
            Some(kinds) => kinds.iter().copied().collect(),
            None => ContainerKind::ALL.into_iter().collect(),
        };

        let mut containers: Vec<ContainerMetadata> = ContainerKind::ALL
            .into_iter()
            .filter(|kind| selected.contains(kind))
            .map(|kind| {
                let metadata = match self.registry.get(&kind) {
                    Some(metadata) => metadata.clone(),
                    None => Self::build_metadata(&self.config, kind),
                };
                if image.is_empty() {
                    metadata
                } else {
                    metadata.with_image_override(image)
                }
            })
            .collect();

        if let Some(installed) = installed {
            let names: BTreeSet<String> = self
                .docker
                .list_container_names(true)
                .await?
                .into_iter()
                .collect();
            containers.retain(|container| names.contains(container.name()) == installed);
        }

        debug!(
            "选中容器: {:?}",
            containers.iter().map(|c| c.input()).collect::<Vec<_>>()
        );
        Ok(containers)
    }
}
