use super::docker::{DockerApi, PullEvent};
use super::types::{ContainerKind, ContainerOptions, ContainerProfile, ImageOverride};
use crate::constants::{geoserver, postgis, thredds, wps};
use crate::input::{InputSource, UserInputHelper};
use crate::progress::PullProgress;
use crate::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// 一个受管理的辅助服务容器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMetadata {
    kind: ContainerKind,
    image_name: String,
    tag: String,
    geoserver_data_dir: PathBuf,
    thredds_data_dir: PathBuf,
}

impl ContainerMetadata {
    /// 使用声明的镜像创建
    pub fn new(kind: ContainerKind, geoserver_data_dir: PathBuf, thredds_data_dir: PathBuf) -> Self {
        let profile = kind.profile();
        Self {
            kind,
            image_name: profile.image_name.to_string(),
            tag: profile.tag.to_string(),
            geoserver_data_dir,
            thredds_data_dir,
        }
    }

    /// 应用命令行传入的镜像覆盖
    pub fn with_image_override(mut self, image: &ImageOverride) -> Self {
        if let Some(name) = &image.image_name {
            self.image_name = name.clone();
        }
        if let Some(tag) = &image.image_tag {
            self.tag = tag.clone();
        }
        self
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn profile(&self) -> &'static ContainerProfile {
        self.kind.profile()
    }

    pub fn input(&self) -> &'static str {
        self.profile().input
    }

    pub fn name(&self) -> &'static str {
        self.profile().name
    }

    pub fn display_name(&self) -> &'static str {
        self.profile().display_name
    }

    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// `name:tag`
    pub fn image(&self) -> String {
        format!("{}:{}", self.image_name, self.tag)
    }

    /// GeoServer 镜像是否支持集群模式
    pub fn is_cluster(&self) -> bool {
        self.kind == ContainerKind::GeoServer && self.image_name == geoserver::CLUSTER_IMAGE
    }

    /// 不经交互的默认创建参数，只依赖声明的常量
    pub fn default_container_options(&self) -> ContainerOptions {
        let profile = self.profile();
        let options = ContainerOptions::new(profile.name, self.image());

        match self.kind {
            ContainerKind::PostGis => options
                .env("POSTGRES_PASSWORD", postgis::DEFAULT_PASSWORD)
                .port(profile.container_port, profile.host_port),
            ContainerKind::GeoServer if self.is_cluster() => {
                let options = options
                    .env("ENABLED_NODES", geoserver::DEFAULT_ENABLED_NODES.to_string())
                    .env("REST_NODES", geoserver::DEFAULT_REST_NODES.to_string())
                    .env("MAX_TIMEOUT", geoserver::DEFAULT_MAX_TIMEOUT.to_string())
                    .env("NUM_CORES", geoserver::DEFAULT_NUM_CORES)
                    .env("MAX_MEMORY", geoserver::DEFAULT_MEMORY_MB.to_string())
                    .env("MIN_MEMORY", geoserver::DEFAULT_MEMORY_MB.to_string());
                with_cluster_ports(options)
            }
            ContainerKind::GeoServer => options.port(profile.container_port, profile.host_port),
            ContainerKind::Wps => {
                let options = wps::CONTACT_FIELDS
                    .iter()
                    .fold(options, |options, (key, _)| {
                        options.env(key, wps::DEFAULT_CONTACT_VALUE)
                    });
                options
                    .env("USERNAME", wps::DEFAULT_USERNAME)
                    .env("PASSWORD", wps::DEFAULT_PASSWORD)
                    .port(profile.container_port, profile.host_port)
            }
            ContainerKind::Thredds => options
                .env("TDM_PW", thredds::DEFAULT_TDM_PW)
                .env("TDS_HOST", thredds::DEFAULT_TDS_HOST)
                .env("THREDDS_XMX_SIZE", format!("{}G", thredds::DEFAULT_THREDDS_XMX_GB))
                .env("THREDDS_XMS_SIZE", format!("{}G", thredds::DEFAULT_THREDDS_XMS_GB))
                .env("TDM_XMX_SIZE", format!("{}G", thredds::DEFAULT_TDM_XMX_GB))
                .env("TDM_XMS_SIZE", format!("{}G", thredds::DEFAULT_TDM_XMS_GB))
                .port(profile.container_port, profile.host_port),
        }
    }

    /// 创建参数：`defaults` 为 true 时直接使用默认值，否则交互式询问
    pub fn get_container_options(
        &self,
        defaults: bool,
        input: &mut dyn InputSource,
    ) -> Result<ContainerOptions> {
        if defaults {
            return Ok(self.default_container_options());
        }

        let mut helper = UserInputHelper::new(input);
        match self.kind {
            ContainerKind::PostGis => self.prompt_postgis_options(&mut helper),
            ContainerKind::GeoServer => self.prompt_geoserver_options(&mut helper),
            ContainerKind::Wps => self.prompt_wps_options(&mut helper),
            ContainerKind::Thredds => self.prompt_thredds_options(&mut helper),
        }
    }

    fn prompt_postgis_options(&self, helper: &mut UserInputHelper<'_>) -> Result<ContainerOptions> {
        info!("请为 postgres 数据库用户设置密码，直接回车使用方括号中的默认值:");
        let password = helper.get_verified_password(
            "postgres 用户密码 (POSTGRES_PASSWORD)",
            postgis::DEFAULT_PASSWORD,
        )?;

        Ok(self
            .default_container_options()
            .env("POSTGRES_PASSWORD", password))
    }

    fn prompt_geoserver_options(&self, helper: &mut UserInputHelper<'_>) -> Result<ContainerOptions> {
        let mut options = self.default_container_options();

        if self.is_cluster() {
            info!("GeoServer 容器支持集群模式（在同一容器中运行多个 GeoServer 实例）以提高性能。");
            let (enabled_nodes, rest_nodes) = if helper.confirm("是否启用集群模式", true)? {
                let enabled = helper.get_valid_numeric_input(
                    "GeoServer 实例数量",
                    1,
                    geoserver::MAX_NODES,
                    geoserver::DEFAULT_ENABLED_NODES,
                )?;
                let rest = helper.get_valid_numeric_input(
                    "提供 REST API 的实例数量",
                    1,
                    enabled,
                    geoserver::DEFAULT_REST_NODES.min(enabled),
                )?;
                (enabled, rest)
            } else {
                (1, 1)
            };

            options = options
                .env("ENABLED_NODES", enabled_nodes.to_string())
                .env("REST_NODES", rest_nodes.to_string());

            let mode = helper.get_valid_choice_input(
                "请求限制模式",
                &[geoserver::REQUEST_LIMIT_TIMEOUT, geoserver::REQUEST_LIMIT_UNLIMITED],
                geoserver::REQUEST_LIMIT_TIMEOUT,
            )?;
            if mode == geoserver::REQUEST_LIMIT_TIMEOUT {
                let timeout = helper.get_valid_numeric_input(
                    "单个请求的最长处理时间（秒）",
                    1,
                    geoserver::MAX_TIMEOUT_LIMIT,
                    geoserver::DEFAULT_MAX_TIMEOUT,
                )?;
                options = options.env("MAX_TIMEOUT", timeout.to_string());
            } else {
                options.environment.remove("MAX_TIMEOUT");
            }

            let num_cores = helper.get_valid_choice_input(
                "可用处理器数量",
                geoserver::NUM_CORES_CHOICES,
                geoserver::DEFAULT_NUM_CORES,
            )?;
            let max_memory = helper.get_valid_numeric_input(
                "每个实例的最大内存（MB）",
                geoserver::MIN_MEMORY_MB,
                geoserver::MAX_MEMORY_MB,
                geoserver::DEFAULT_MEMORY_MB,
            )?;
            let min_memory = helper.get_valid_numeric_input(
                "每个实例的最小内存（MB）",
                geoserver::MIN_MEMORY_MB,
                max_memory,
                max_memory,
            )?;

            options = options
                .env("NUM_CORES", num_cores)
                .env("MAX_MEMORY", max_memory.to_string())
                .env("MIN_MEMORY", min_memory.to_string());
        }

        if helper.confirm("是否将 GeoServer 数据目录挂载到主机", false)? {
            let dir = helper.get_valid_directory_input("主机上的 GeoServer 数据目录", &self.geoserver_data_dir)?;
            options = options.mount(dir, geoserver::DATA_MOUNT_TARGET);
        }

        Ok(options)
    }

    fn prompt_wps_options(&self, helper: &mut UserInputHelper<'_>) -> Result<ContainerOptions> {
        info!("请填写 52 North WPS 管理员联系信息，直接回车使用方括号中的默认值:");
        let mut options = self.default_container_options();

        for (key, label) in wps::CONTACT_FIELDS {
            let value = helper.get_input_with_default(label, wps::DEFAULT_CONTACT_VALUE)?;
            options = options.env(key, value);
        }

        let username = helper.get_input_with_default("管理员用户名", wps::DEFAULT_USERNAME)?;
        let password = helper.get_verified_password("管理员密码", wps::DEFAULT_PASSWORD)?;

        Ok(options.env("USERNAME", username).env("PASSWORD", password))
    }

    fn prompt_thredds_options(&self, helper: &mut UserInputHelper<'_>) -> Result<ContainerOptions> {
        info!("请设置 THREDDS 容器参数，直接回车使用方括号中的默认值:");

        let thredds_xms = helper.get_valid_numeric_input(
            "THREDDS 初始堆内存（GB）",
            1,
            thredds::MAX_HEAP_GB,
            thredds::DEFAULT_THREDDS_XMS_GB,
        )?;
        let thredds_xmx = helper.get_valid_numeric_input(
            "THREDDS 最大堆内存（GB）",
            thredds_xms,
            thredds::MAX_HEAP_GB,
            thredds::DEFAULT_THREDDS_XMX_GB.max(thredds_xms),
        )?;
        let tdm_xms = helper.get_valid_numeric_input(
            "TDM 初始堆内存（GB）",
            1,
            thredds::MAX_HEAP_GB,
            thredds::DEFAULT_TDM_XMS_GB,
        )?;
        let tdm_xmx = helper.get_valid_numeric_input(
            "TDM 最大堆内存（GB）",
            tdm_xms,
            thredds::MAX_HEAP_GB,
            thredds::DEFAULT_TDM_XMX_GB.max(tdm_xms),
        )?;
        let tdm_pw = helper.get_verified_password("TDM 密码 (TDM_PW)", thredds::DEFAULT_TDM_PW)?;
        let tds_host = helper.get_input_with_default("THREDDS 服务地址 (TDS_HOST)", thredds::DEFAULT_TDS_HOST)?;

        let mut options = self
            .default_container_options()
            .env("THREDDS_XMS_SIZE", format!("{thredds_xms}G"))
            .env("THREDDS_XMX_SIZE", format!("{thredds_xmx}G"))
            .env("TDM_XMS_SIZE", format!("{tdm_xms}G"))
            .env("TDM_XMX_SIZE", format!("{tdm_xmx}G"))
            .env("TDM_PW", tdm_pw)
            .env("TDS_HOST", tds_host);

        if helper.confirm("是否将 THREDDS 数据目录挂载到主机", true)? {
            let dir = helper.get_valid_directory_input("主机上的 THREDDS 数据目录", &self.thredds_data_dir)?;
            options = options.mount(dir, thredds::DATA_MOUNT_TARGET);
        }

        Ok(options)
    }

    /// 拉取镜像
    pub async fn pull(&self, docker: &dyn DockerApi) -> Result<()> {
        info!("⬇️  拉取镜像 {} ...", self.image());
        let mut progress = PullProgress::new(self.image());
        let mut on_event = |event: PullEvent| progress.update(&event);
        docker
            .pull_image(&self.image_name, &self.tag, &mut on_event)
            .await?;
        progress.finish();
        Ok(())
    }

    /// 创建容器（不启动）
    pub async fn create(
        &self,
        docker: &dyn DockerApi,
        defaults: bool,
        input: &mut dyn InputSource,
    ) -> Result<()> {
        let options = self.get_container_options(defaults, input)?;
        debug!("{} 创建参数: {}", self.name(), serde_json::to_string(&options)?);
        docker.create_container(&options).await
    }

    /// 启动容器；失败时返回错误描述而不是中断批量操作
    pub async fn start(&self, docker: &dyn DockerApi) -> Option<String> {
        info!("▶️  启动 {} 容器...", self.display_name());
        docker.start_container(self.name()).await.err().map(|e| {
            format!("启动 {} 容器时出错: {}", self.display_name(), e)
        })
    }

    /// 停止容器；失败时返回错误描述而不是中断批量操作
    pub async fn stop(&self, docker: &dyn DockerApi, timeout_secs: u64) -> Option<String> {
        info!("⏹️  停止 {} 容器...", self.display_name());
        docker
            .stop_container(self.name(), timeout_secs)
            .await
            .err()
            .map(|e| format!("停止 {} 容器时出错: {}", self.display_name(), e))
    }

    /// 删除容器
    pub async fn remove(&self, docker: &dyn DockerApi) -> Result<()> {
        info!("🗑️  删除 {} 容器...", self.display_name());
        docker.remove_container(self.name()).await
    }

    /// 服务访问信息，`port_bindings` 为空时使用声明的端口
    pub fn endpoint_info(&self, host: &str, port_bindings: &BTreeMap<u16, u16>) -> Vec<String> {
        let profile = self.profile();

        if self.is_cluster() {
            let primary = port_bindings
                .get(&geoserver::CLUSTER_PRIMARY_PORT)
                .copied()
                .unwrap_or(geoserver::CLUSTER_PRIMARY_PORT);
            let nodes: Vec<String> = geoserver::CLUSTER_NODE_PORTS
                .iter()
                .map(|port| port_bindings.get(port).copied().unwrap_or(*port).to_string())
                .collect();
            return vec![
                format!("Host: {host}"),
                format!("Primary Port: {primary}"),
                format!("Node Ports: {}", nodes.join(", ")),
                format!("Endpoint: http://{host}:{primary}/geoserver/rest"),
            ];
        }

        let port = port_bindings
            .get(&profile.container_port)
            .copied()
            .unwrap_or(profile.host_port);
        let endpoint = match self.kind {
            ContainerKind::PostGis => {
                format!("postgresql://<username>:<password>@{host}:{port}/<database>")
            }
            ContainerKind::GeoServer => format!("http://{host}:{port}/geoserver/rest"),
            ContainerKind::Wps => format!("http://{host}:{port}/wps/WebProcessingService"),
            ContainerKind::Thredds => format!("http://{host}:{port}/thredds/"),
        };

        vec![
            format!("Host: {host}"),
            format!("Port: {port}"),
            format!("Endpoint: {endpoint}"),
        ]
    }
}

/// 集群模式：负载均衡端口与全部节点端口一一映射
fn with_cluster_ports(options: ContainerOptions) -> ContainerOptions {
    geoserver::CLUSTER_NODE_PORTS
        .iter()
        .fold(
            options.port(geoserver::CLUSTER_PRIMARY_PORT, geoserver::CLUSTER_PRIMARY_PORT),
            |options, port| options.port(*port, *port),
        )
}
