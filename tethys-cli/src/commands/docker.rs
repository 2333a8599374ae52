use crate::app::CliApp;
use crate::cli::{DockerArgs, DockerVerb};
use std::collections::{BTreeMap, BTreeSet};
use tethys_core::container::{
    ContainerKind, ContainerMetadata, ContainerStatus, ImageOverride,
    get_docker_container_statuses,
};
use tethys_core::error::{Result, TethysError};
use tracing::{debug, error, info, warn};

/// 输出一行结果并记录下来，便于调用方检查
fn emit(lines: &mut Vec<String>, line: impl Into<String>) {
    let line = line.into();
    info!("{}", line);
    lines.push(line);
}

fn emit_error(lines: &mut Vec<String>, line: impl Into<String>) {
    let line = line.into();
    error!("❌ {}", line);
    lines.push(line);
}

/// 检查镜像覆盖参数，返回本次命令实际使用的覆盖
pub fn validate_args(args: &DockerArgs) -> Result<ImageOverride> {
    let image = ImageOverride::new(args.image.clone(), args.tag.clone());
    if image.is_empty() {
        return Ok(image);
    }

    if !args.verb.accepts_image_override() {
        warn!(
            "⚠️  -i/--image 与 -t/--tag 只对 init 和 update 有效，'{}' 将忽略这些参数",
            args.verb.as_str()
        );
        return Ok(ImageOverride::default());
    }

    let selected: BTreeSet<ContainerKind> = args.containers.iter().copied().collect();
    if selected.len() != 1 {
        return Err(TethysError::invalid_arguments(format!(
            "指定镜像名称或标签时必须通过 -c 只选择一个容器（当前选择: {}）",
            if selected.is_empty() {
                "全部".to_string()
            } else {
                selected.iter().map(|k| k.input()).collect::<Vec<_>>().join(", ")
            }
        )));
    }

    Ok(image)
}

/// 选中容器及其当前状态
async fn containers_with_status(
    app: &CliApp,
    containers: Option<&[ContainerKind]>,
) -> Result<Vec<(ContainerMetadata, ContainerStatus)>> {
    let targets = app
        .manager
        .get_containers(containers, None, &ImageOverride::default())
        .await?;
    let statuses = get_docker_container_statuses(app.manager.docker(), &targets).await?;

    Ok(targets
        .into_iter()
        .map(|container| {
            let status = statuses
                .get(&container.kind())
                .copied()
                .unwrap_or(ContainerStatus::NotInstalled);
            (container, status)
        })
        .collect())
}

/// 拉取镜像并创建容器
///
/// 默认只处理尚未安装的容器，只拉取本地不存在的镜像；`force` 时处理全部选中的容器并重新拉取镜像。
pub async fn docker_init(
    app: &mut CliApp,
    containers: Option<&[ContainerKind]>,
    defaults: bool,
    force: bool,
    image: &ImageOverride,
) -> Result<Vec<String>> {
    let mut lines = Vec::new();

    let installed_filter = if force { None } else { Some(false) };
    let targets = app
        .manager
        .get_containers(containers, installed_filter, image)
        .await?;

    if targets.is_empty() {
        emit(&mut lines, "✅ 所选 Tethys Docker 容器均已安装");
        return Ok(lines);
    }

    let docker = app.manager.docker();
    let local_images: BTreeSet<String> = docker.list_image_tags().await?.into_iter().collect();
    for container in &targets {
        if force || !local_images.contains(&container.image()) {
            container.pull(docker).await?;
        } else {
            debug!("镜像 {} 已存在，跳过拉取", container.image());
        }
    }

    let statuses = if force {
        get_docker_container_statuses(docker, &targets).await?
    } else {
        BTreeMap::new()
    };

    for container in &targets {
        if statuses
            .get(&container.kind())
            .is_some_and(ContainerStatus::is_installed)
        {
            emit(
                &mut lines,
                format!("ℹ️  {} 容器已安装，跳过创建", container.display_name()),
            );
            continue;
        }

        emit(&mut lines, format!("📦 创建 {} 容器...", container.display_name()));
        container.create(docker, defaults, app.input.as_mut()).await?;
    }

    emit(&mut lines, "✅ 容器初始化完成");
    Ok(lines)
}

/// 启动已安装但未运行的容器；单个容器启动失败不会中断其余容器
pub async fn docker_start(app: &mut CliApp, containers: Option<&[ContainerKind]>) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    let docker = app.manager.docker();

    for (container, status) in containers_with_status(app, containers).await? {
        match status {
            ContainerStatus::NotInstalled => emit(
                &mut lines,
                format!("{} 容器未安装，请先运行 'tethys docker init'", container.display_name()),
            ),
            ContainerStatus::Running => emit(
                &mut lines,
                format!("{} 容器已在运行", container.display_name()),
            ),
            ContainerStatus::Stopped => match container.start(docker).await {
                Some(message) => emit_error(&mut lines, message),
                None => emit(&mut lines, format!("✅ {} 容器已启动", container.display_name())),
            },
        }
    }

    Ok(lines)
}

/// 停止运行中的容器；单个容器停止失败不会中断其余容器
pub async fn docker_stop(
    app: &mut CliApp,
    containers: Option<&[ContainerKind]>,
    boot2docker: bool,
) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    if boot2docker {
        emit(&mut lines, "ℹ️  --boot2docker 参数已不再需要，将被忽略");
    }

    let docker = app.manager.docker();
    let timeout = app.manager.config().docker.stop_timeout_secs;

    for (container, status) in containers_with_status(app, containers).await? {
        if status.is_running() {
            match container.stop(docker, timeout).await {
                Some(message) => emit_error(&mut lines, message),
                None => emit(&mut lines, format!("✅ {} 容器已停止", container.display_name())),
            }
        } else {
            emit(&mut lines, format!("{} 容器未运行", container.display_name()));
        }
    }

    Ok(lines)
}

/// 先停止再启动
pub async fn docker_restart(app: &mut CliApp, containers: Option<&[ContainerKind]>) -> Result<Vec<String>> {
    let mut lines = docker_stop(app, containers, false).await?;
    lines.extend(docker_start(app, containers).await?);
    Ok(lines)
}

/// 停止并删除已安装的容器
pub async fn docker_remove(app: &mut CliApp, containers: Option<&[ContainerKind]>) -> Result<Vec<String>> {
    let mut lines = docker_stop(app, containers, false).await?;

    let installed = app
        .manager
        .get_containers(containers, Some(true), &ImageOverride::default())
        .await?;
    for container in &installed {
        container.remove(app.manager.docker()).await?;
        emit(&mut lines, format!("✅ {} 容器已删除", container.display_name()));
    }

    Ok(lines)
}

/// 删除后重新创建（强制重新拉取镜像）
pub async fn docker_update(
    app: &mut CliApp,
    containers: Option<&[ContainerKind]>,
    defaults: bool,
    image: &ImageOverride,
) -> Result<Vec<String>> {
    let mut lines = docker_remove(app, containers).await?;
    lines.extend(docker_init(app, containers, defaults, true, image).await?);
    Ok(lines)
}

/// 显示容器状态
pub async fn docker_status(app: &mut CliApp, containers: Option<&[ContainerKind]>) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for (container, status) in containers_with_status(app, containers).await? {
        emit(
            &mut lines,
            format!("{}: {}", container.display_name(), status.display_name()),
        );
    }
    Ok(lines)
}

/// 显示运行中容器的访问地址
pub async fn docker_ip(app: &mut CliApp, containers: Option<&[ContainerKind]>) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    let docker = app.manager.docker();
    let host = app.manager.config().endpoint_host();

    for (container, status) in containers_with_status(app, containers).await? {
        match status {
            ContainerStatus::Running => {
                // 无法读取实际映射时退回声明的端口
                let bindings = docker
                    .inspect_port_bindings(container.name())
                    .await
                    .unwrap_or_else(|e| {
                        warn!("⚠️  读取 {} 端口映射失败: {}", container.name(), e);
                        BTreeMap::new()
                    });

                emit(&mut lines, format!("{}:", container.display_name()));
                for line in container.endpoint_info(&host, &bindings) {
                    emit(&mut lines, format!("  {line}"));
                }
            }
            ContainerStatus::Stopped => {
                emit(&mut lines, format!("{}: Not Running.", container.display_name()))
            }
            ContainerStatus::NotInstalled => {
                emit(&mut lines, format!("{}: Not Installed.", container.display_name()))
            }
        }
    }

    Ok(lines)
}

/// `tethys docker <verb>` 入口
pub async fn docker_command(app: &mut CliApp, args: &DockerArgs) -> Result<Vec<String>> {
    let image = validate_args(args)?;
    let selection = args.selection();

    match args.verb {
        DockerVerb::Init => {
            info!("🚀 初始化 Tethys Docker 容器...");
            docker_init(app, selection, args.defaults, args.force, &image).await
        }
        DockerVerb::Start => {
            info!("▶️  启动 Tethys Docker 容器...");
            docker_start(app, selection).await
        }
        DockerVerb::Stop => {
            info!("⏹️  停止 Tethys Docker 容器...");
            docker_stop(app, selection, args.boot2docker).await
        }
        DockerVerb::Restart => {
            info!("🔄 重启 Tethys Docker 容器...");
            docker_restart(app, selection).await
        }
        DockerVerb::Remove => {
            info!("🗑️  删除 Tethys Docker 容器...");
            docker_remove(app, selection).await
        }
        DockerVerb::Update => {
            info!("⬆️  更新 Tethys Docker 容器...");
            docker_update(app, selection, args.defaults, &image).await
        }
        DockerVerb::Status => docker_status(app, selection).await,
        DockerVerb::Ip => docker_ip(app, selection).await,
    }
}
