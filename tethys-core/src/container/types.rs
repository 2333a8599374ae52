use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 受管理的辅助服务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ContainerKind {
    PostGis,
    GeoServer,
    Wps,
    Thredds,
}

/// 每种服务的静态声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerProfile {
    /// 命令行选择器
    pub input: &'static str,
    /// Docker 容器名称
    pub name: &'static str,
    pub display_name: &'static str,
    pub image_name: &'static str,
    pub tag: &'static str,
    pub host_port: u16,
    pub container_port: u16,
}

/// 容器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContainerStatus {
    /// Docker 中不存在同名容器
    NotInstalled,
    /// 已创建但未运行
    Stopped,
    /// 运行中
    Running,
}

impl ContainerStatus {
    /// 获取状态的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            ContainerStatus::NotInstalled => "Not Installed",
            ContainerStatus::Stopped => "Stopped",
            ContainerStatus::Running => "Running",
        }
    }

    /// `None` 表示未安装，其余为是否运行
    pub fn running_flag(&self) -> Option<bool> {
        match self {
            ContainerStatus::NotInstalled => None,
            ContainerStatus::Stopped => Some(false),
            ContainerStatus::Running => Some(true),
        }
    }

    pub fn is_installed(&self) -> bool {
        !matches!(self, ContainerStatus::NotInstalled)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ContainerStatus::Running)
    }
}

/// 主机目录绑定
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindMount {
    pub source: PathBuf,
    pub target: String,
    pub read_only: bool,
}

/// 主机配置：端口映射（容器端口 -> 主机端口）与目录绑定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostConfigOptions {
    pub port_bindings: BTreeMap<u16, u16>,
    pub mounts: Vec<BindMount>,
}

/// 创建容器时使用的参数，每次调用重新构建
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerOptions {
    pub name: String,
    pub image: String,
    pub environment: BTreeMap<String, String>,
    pub host_config: HostConfigOptions,
    pub volumes: Vec<String>,
}

impl ContainerOptions {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            environment: BTreeMap::new(),
            host_config: HostConfigOptions::default(),
            volumes: Vec::new(),
        }
    }

    pub fn env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.environment.insert(key.to_string(), value.into());
        self
    }

    pub fn port(mut self, container_port: u16, host_port: u16) -> Self {
        self.host_config
            .port_bindings
            .insert(container_port, host_port);
        self
    }

    /// 添加目录绑定，同时声明容器内的卷
    pub fn mount(mut self, source: PathBuf, target: &str) -> Self {
        self.volumes.push(target.to_string());
        self.host_config.mounts.push(BindMount {
            source,
            target: target.to_string(),
            read_only: false,
        });
        self
    }

    /// 以 `KEY=VALUE` 形式输出环境变量
    pub fn env_list(&self) -> Vec<String> {
        self.environment
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect()
    }
}

/// 命令行传入的镜像覆盖（仅对单个容器的 init/update 有效）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOverride {
    pub image_name: Option<String>,
    pub image_tag: Option<String>,
}

impl ImageOverride {
    pub fn new(image_name: Option<String>, image_tag: Option<String>) -> Self {
        Self {
            image_name,
            image_tag,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.image_name.is_none() && self.image_tag.is_none()
    }
}
