use crate::project_info::metadata;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tethys_core::container::ContainerKind;

/// Docker 子命令支持的操作
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockerVerb {
    /// 拉取镜像并创建容器
    Init,
    /// 启动已安装的容器
    Start,
    /// 停止运行中的容器
    Stop,
    /// 显示容器状态
    Status,
    /// 删除后重新创建容器
    Update,
    /// 停止并删除容器
    Remove,
    /// 显示服务访问地址
    Ip,
    /// 先停止再启动
    Restart,
}

impl DockerVerb {
    /// 是否接受镜像覆盖参数
    pub fn accepts_image_override(&self) -> bool {
        matches!(self, DockerVerb::Init | DockerVerb::Update)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DockerVerb::Init => "init",
            DockerVerb::Start => "start",
            DockerVerb::Stop => "stop",
            DockerVerb::Status => "status",
            DockerVerb::Update => "update",
            DockerVerb::Remove => "remove",
            DockerVerb::Ip => "ip",
            DockerVerb::Restart => "restart",
        }
    }
}

/// `tethys docker` 的参数
#[derive(Args, Debug, Clone)]
pub struct DockerArgs {
    /// 要执行的操作
    #[arg(value_enum)]
    pub verb: DockerVerb,

    /// 使用默认参数创建容器，不进行交互式询问
    #[arg(short, long)]
    pub defaults: bool,

    /// 要操作的容器（postgis, geoserver, wps, thredds），默认全部
    #[arg(short = 'c', long = "containers", num_args = 1..)]
    pub containers: Vec<ContainerKind>,

    /// 覆盖镜像标签（仅 init/update，且只能指定一个容器）
    #[arg(short = 't', long = "tag")]
    pub tag: Option<String>,

    /// 覆盖镜像名称（仅 init/update，且只能指定一个容器）
    #[arg(short = 'i', long = "image")]
    pub image: Option<String>,

    /// 强制重新拉取镜像并创建全部选中的容器
    #[arg(short, long)]
    pub force: bool,

    /// 兼容旧版参数，已无实际作用
    #[arg(short, long)]
    pub boot2docker: bool,
}

impl DockerArgs {
    /// 命令行选择的容器，未指定时为 `None`（表示全部）
    pub fn selection(&self) -> Option<&[ContainerKind]> {
        (!self.containers.is_empty()).then_some(self.containers.as_slice())
    }
}

/// Tethys Platform 辅助服务容器管理工具
#[derive(Parser, Debug)]
#[command(name = "tethys")]
#[command(about = metadata::PROJECT_DESCRIPTION)]
#[command(version = metadata::PROJECT_VERSION)]
#[command(long_about = metadata::display::DESCRIPTION_LONG)]
#[command(author = metadata::PROJECT_AUTHORS)]
pub struct Cli {
    /// 配置文件路径（默认在当前目录查找 tethys-docker.toml）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 详细输出
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 管理 PostGIS、GeoServer、52 North WPS 与 THREDDS 容器
    Docker(DockerArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_docker_init() {
        let cli = Cli::try_parse_from([
            "tethys", "-c", "custom.toml", "docker", "init", "-d", "-c", "postgis", "wps",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        let Commands::Docker(args) = cli.command;
        assert_eq!(args.verb, DockerVerb::Init);
        assert!(args.defaults);
        assert_eq!(args.containers, vec![ContainerKind::PostGis, ContainerKind::Wps]);
        assert_eq!(args.selection().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_parse_image_override() {
        let cli = Cli::try_parse_from([
            "tethys", "docker", "update", "--containers", "geoserver", "-i", "kartoza/geoserver",
            "-t", "2.24.0", "-f",
        ])
        .unwrap();

        let Commands::Docker(args) = cli.command;
        assert_eq!(args.verb, DockerVerb::Update);
        assert_eq!(args.image.as_deref(), Some("kartoza/geoserver"));
        assert_eq!(args.tag.as_deref(), Some("2.24.0"));
        assert!(args.force);
        assert!(args.verb.accepts_image_override());
    }

    #[test]
    fn test_parse_defaults_to_all_containers() {
        let cli = Cli::try_parse_from(["tethys", "docker", "stop", "-b"]).unwrap();
        let Commands::Docker(args) = cli.command;
        assert!(args.boot2docker);
        assert!(args.selection().is_none());
    }

    #[test]
    fn test_rejects_unknown_container_and_verb() {
        assert!(Cli::try_parse_from(["tethys", "docker", "start", "-c", "mysql"]).is_err());
        assert!(Cli::try_parse_from(["tethys", "docker", "launch"]).is_err());
    }
}
