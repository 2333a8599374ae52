//! Docker Engine API 访问层
//!
//! 上层代码只依赖 [`DockerApi`]，生产环境使用基于 bollard 的 [`BollardDocker`]，
//! 测试中使用 `RecordingDocker`。

use super::types::ContainerOptions;
use crate::config::AppConfig;
use crate::{Result, TethysError};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::image::{CreateImageOptions, ListImagesOptions};
use bollard::models::{HostConfig, Mount, MountTypeEnum, PortBinding, PortMap};
use bollard::{API_DEFAULT_VERSION, Docker};
use futures_util::stream::StreamExt;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// 拉取镜像过程中的一条进度消息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullEvent {
    /// 镜像层 ID，整体状态消息没有该字段
    pub id: Option<String>,
    pub status: Option<String>,
    pub progress: Option<String>,
    pub current: Option<i64>,
    pub total: Option<i64>,
}

/// 本工具需要的 Docker 操作
#[async_trait]
pub trait DockerApi: Send + Sync {
    /// 检查守护进程是否可达
    async fn ping(&self) -> Result<()>;

    /// 容器名称列表，`all = false` 时只包含运行中的容器
    async fn list_container_names(&self, all: bool) -> Result<Vec<String>>;

    /// 本地已有镜像的 `name:tag` 列表
    async fn list_image_tags(&self) -> Result<Vec<String>>;

    /// 拉取镜像，逐条回调进度消息
    async fn pull_image(
        &self,
        image: &str,
        tag: &str,
        on_event: &mut (dyn FnMut(PullEvent) + Send),
    ) -> Result<()>;

    async fn create_container(&self, options: &ContainerOptions) -> Result<()>;

    async fn start_container(&self, name: &str) -> Result<()>;

    async fn stop_container(&self, name: &str, timeout_secs: u64) -> Result<()>;

    async fn remove_container(&self, name: &str) -> Result<()>;

    /// 实际生效的端口映射（容器端口 -> 主机端口）
    async fn inspect_port_bindings(&self, name: &str) -> Result<BTreeMap<u16, u16>>;
}

/// 基于 bollard 的 Docker 客户端
#[derive(Debug, Clone)]
pub struct BollardDocker {
    docker: Docker,
}

impl BollardDocker {
    /// 按配置连接 Docker 守护进程并确认可达
    ///
    /// 任何连接失败都归为 [`TethysError::DockerUnavailable`]
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let timeout = config.docker.connect_timeout_secs;
        let docker = match config.docker_host() {
            Some(host) if host.starts_with("tcp://") || host.starts_with("http://") => {
                debug!("通过 HTTP 连接 Docker: {}", host);
                Docker::connect_with_http(&host, timeout, API_DEFAULT_VERSION)
            }
            Some(host) if host.starts_with("unix://") || host.starts_with("npipe://") => {
                debug!("通过 socket 连接 Docker: {}", host);
                Docker::connect_with_socket(&host, timeout, API_DEFAULT_VERSION)
            }
            _ => Docker::connect_with_local_defaults(),
        }
        .map_err(|e| TethysError::docker_unavailable(e.to_string()))?;

        let client = Self::from_docker(docker);
        client.ping().await?;
        Ok(client)
    }

    pub fn from_docker(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl DockerApi for BollardDocker {
    async fn ping(&self) -> Result<()> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| TethysError::docker_unavailable(e.to_string()))
    }

    async fn list_container_names(&self, all: bool) -> Result<Vec<String>> {
        let options = ListContainersOptions::<String> {
            all,
            ..Default::default()
        };

        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(containers
            .into_iter()
            .flat_map(|container| container.names.unwrap_or_default())
            .map(|name| normalize_container_name(&name))
            .collect())
    }

    async fn list_image_tags(&self) -> Result<Vec<String>> {
        let options = ListImagesOptions::<String> {
            all: false,
            ..Default::default()
        };

        let images = self.docker.list_images(Some(options)).await?;
        Ok(images
            .into_iter()
            .flat_map(|image| image.repo_tags)
            .collect())
    }

    async fn pull_image(
        &self,
        image: &str,
        tag: &str,
        on_event: &mut (dyn FnMut(PullEvent) + Send),
    ) -> Result<()> {
        let options = CreateImageOptions {
            from_image: image,
            tag,
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(item) = stream.next().await {
            let info = item?;
            let (current, total) = info
                .progress_detail
                .as_ref()
                .map(|detail| (detail.current, detail.total))
                .unwrap_or_default();

            on_event(PullEvent {
                id: info.id,
                status: info.status,
                progress: info.progress,
                current,
                total,
            });
        }

        Ok(())
    }

    async fn create_container(&self, options: &ContainerOptions) -> Result<()> {
        let config = build_container_config(options);
        let create_options = CreateContainerOptions {
            name: options.name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(create_options), config)
            .await?;
        debug!("已创建容器 {} ({})", options.name, response.id);

        for warning in response.warnings {
            tracing::warn!("⚠️  {}: {}", options.name, warning);
        }
        Ok(())
    }

    async fn start_container(&self, name: &str) -> Result<()> {
        self.docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn stop_container(&self, name: &str, timeout_secs: u64) -> Result<()> {
        let options = StopContainerOptions {
            t: stop_timeout(timeout_secs),
        };
        self.docker.stop_container(name, Some(options)).await?;
        Ok(())
    }

    async fn remove_container(&self, name: &str) -> Result<()> {
        let options = RemoveContainerOptions {
            force: false,
            ..Default::default()
        };
        self.docker.remove_container(name, Some(options)).await?;
        Ok(())
    }

    async fn inspect_port_bindings(&self, name: &str) -> Result<BTreeMap<u16, u16>> {
        let response = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await?;

        let ports = response
            .network_settings
            .and_then(|settings| settings.ports)
            .unwrap_or_default();
        Ok(parse_port_map(&ports))
    }
}

/// Docker 返回的名称带有前导 `/`
fn normalize_container_name(name: &str) -> String {
    name.trim_start_matches('/').to_string()
}

/// 将创建参数转换为 bollard 的容器配置
fn build_container_config(options: &ContainerOptions) -> Config<String> {
    let port_bindings = &options.host_config.port_bindings;

    let exposed_ports: HashMap<String, HashMap<(), ()>> = port_bindings
        .keys()
        .map(|port| (format!("{port}/tcp"), HashMap::new()))
        .collect();

    let bindings: PortMap = port_bindings
        .iter()
        .map(|(container_port, host_port)| {
            (
                format!("{container_port}/tcp"),
                Some(vec![PortBinding {
                    host_ip: None,
                    host_port: Some(host_port.to_string()),
                }]),
            )
        })
        .collect();

    let mounts: Vec<Mount> = options
        .host_config
        .mounts
        .iter()
        .map(|mount| Mount {
            target: Some(mount.target.clone()),
            source: Some(mount.source.to_string_lossy().to_string()),
            typ: Some(MountTypeEnum::BIND),
            read_only: Some(mount.read_only),
            ..Default::default()
        })
        .collect();

    let volumes: HashMap<String, HashMap<(), ()>> = options
        .volumes
        .iter()
        .map(|volume| (volume.clone(), HashMap::new()))
        .collect();

    let host_config = HostConfig {
        port_bindings: Some(bindings),
        mounts: (!mounts.is_empty()).then_some(mounts),
        ..Default::default()
    };

    Config {
        image: Some(options.image.clone()),
        env: Some(options.env_list()),
        exposed_ports: Some(exposed_ports),
        volumes: (!volumes.is_empty()).then_some(volumes),
        host_config: Some(host_config),
        ..Default::default()
    }
}

/// Docker 的停止超时是 i64，超出范围时取最大值
fn stop_timeout(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

/// 解析 `"8080/tcp" -> [{HostPort: "8181"}]` 形式的端口映射
fn parse_port_map(ports: &PortMap) -> BTreeMap<u16, u16> {
    let mut result = BTreeMap::new();

    for (key, bindings) in ports {
        let Some(container_port) = key
            .split('/')
            .next()
            .and_then(|port| port.parse::<u16>().ok())
        else {
            continue;
        };

        let host_port = bindings
            .iter()
            .flatten()
            .find_map(|binding| binding.host_port.as_deref()?.parse::<u16>().ok());

        if let Some(host_port) = host_port {
            result.insert(container_port, host_port);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_container_name() {
        assert_eq!(normalize_container_name("/tethys_postgis"), "tethys_postgis");
        assert_eq!(normalize_container_name("tethys_wps"), "tethys_wps");
    }

    #[test]
    fn test_stop_timeout_saturates() {
        assert_eq!(stop_timeout(10), 10);
        assert_eq!(stop_timeout(i64::MAX as u64), i64::MAX);
        assert_eq!(stop_timeout(u64::MAX), i64::MAX);
    }

    #[test]
    fn test_build_container_config() {
        let options = ContainerOptions::new("tethys_thredds", "unidata/thredds-docker:5.6")
            .env("TDM_PW", "secret")
            .port(8080, 8383)
            .mount(PathBuf::from("/srv/thredds"), "/usr/local/tomcat/content/thredds");

        let config = build_container_config(&options);
        assert_eq!(config.image.as_deref(), Some("unidata/thredds-docker:5.6"));
        assert_eq!(config.env, Some(vec!["TDM_PW=secret".to_string()]));
        assert!(config.exposed_ports.unwrap().contains_key("8080/tcp"));
        assert!(
            config
                .volumes
                .unwrap()
                .contains_key("/usr/local/tomcat/content/thredds")
        );

        let host_config = config.host_config.unwrap();
        let bindings = host_config.port_bindings.unwrap();
        let binding = bindings["8080/tcp"].as_ref().unwrap();
        assert_eq!(binding[0].host_port.as_deref(), Some("8383"));

        let mounts = host_config.mounts.unwrap();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].source.as_deref(), Some("/srv/thredds"));
        assert_eq!(mounts[0].typ, Some(MountTypeEnum::BIND));
    }

    #[test]
    fn test_build_container_config_without_mounts() {
        let options = ContainerOptions::new("tethys_postgis", "postgis/postgis:latest")
            .port(5432, 5435);

        let config = build_container_config(&options);
        assert!(config.volumes.is_none());
        assert!(config.host_config.unwrap().mounts.is_none());
    }

    #[test]
    fn test_parse_port_map() {
        let mut ports: PortMap = HashMap::new();
        ports.insert(
            "8080/tcp".to_string(),
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some("8181".to_string()),
            }]),
        );
        ports.insert("8081/tcp".to_string(), None);
        ports.insert("bogus".to_string(), None);

        let parsed = parse_port_map(&ports);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[&8080], 8181);
    }
}
