use anyhow::Context;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tethys_core::config::AppConfig;
use tethys_core::container::{BollardDocker, ContainerManager, DockerApi};
use tethys_core::error::{Result, TethysError};
use tethys_core::input::{InputSource, TerminalInput};
use tracing::debug;

use crate::cli::Commands;
use crate::commands;

/// 一次命令执行的上下文：容器管理器与交互输入源
pub struct CliApp {
    pub manager: ContainerManager,
    pub input: Box<dyn InputSource>,
}

impl CliApp {
    /// 加载配置并连接 Docker 守护进程
    pub async fn new_with_config(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = AppConfig::find_and_load_config(config_path).context("加载配置文件失败")?;
        debug!("Docker 地址: {:?}", config.docker_host());

        let docker = BollardDocker::connect(&config)
            .await
            .context("连接 Docker 守护进程失败")?;

        Ok(Self::new(config, Arc::new(docker), Box::new(TerminalInput)))
    }

    /// 先校验命令参数，通过后才调用 `connect` 构建应用
    ///
    /// 参数错误不依赖 Docker 是否可用，应在连接守护进程之前报告。
    pub async fn new_validated<F, Fut>(command: &Commands, connect: F) -> anyhow::Result<Self>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Self>>,
    {
        validate_command(command)?;
        connect().await
    }

    pub fn new(config: AppConfig, docker: Arc<dyn DockerApi>, input: Box<dyn InputSource>) -> Self {
        Self {
            manager: ContainerManager::new(docker, config),
            input,
        }
    }

    /// 运行应用命令
    pub async fn run_command(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Docker(args) => commands::docker_command(self, &args).await.map(|_| ()),
        }
    }
}

/// 不接触 Docker 的命令参数校验
pub fn validate_command(command: &Commands) -> Result<()> {
    match command {
        Commands::Docker(args) => commands::validate_args(args).map(|_| ()),
    }
}

/// 启动失败时输出给用户的提示行
pub fn startup_error_lines(e: &anyhow::Error) -> Vec<String> {
    let tethys_error = e.chain().find_map(|err| err.downcast_ref::<TethysError>());

    match tethys_error {
        Some(err) if matches!(err, TethysError::DockerUnavailable(_)) => vec![
            format!("❌ {}", err),
            "👉 请确认 Docker 已安装并正在运行，或通过 DOCKER_HOST / 配置文件 [docker] host 指定地址。"
                .to_string(),
        ],
        Some(err) if matches!(err, TethysError::InvalidArguments(_)) => vec![format!("❌ {}", err)],
        _ => vec![format!("❌ 应用初始化失败: {:#}", e)],
    }
}
