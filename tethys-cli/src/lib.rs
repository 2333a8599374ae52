// 私有模块声明
mod app;
mod cli;
mod commands;
pub mod project_info; // 公开项目信息模块
mod utils;

// 通过 pub use 精确控制对外暴露的接口
pub use app::{CliApp, startup_error_lines, validate_command};
pub use cli::{Cli, Commands, DockerArgs, DockerVerb};
pub use commands::{
    docker_command, docker_init, docker_ip, docker_remove, docker_restart, docker_start,
    docker_status, docker_stop, docker_update, validate_args,
};
pub use utils::{LOG_FILE_ENV, setup_logging};
