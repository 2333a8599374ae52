use clap::Parser;
use tethys_cli::{Cli, CliApp, project_info, setup_logging, startup_error_lines};
use tracing::{debug, error};

#[tokio::main]
async fn main() {
    // 解析命令行参数
    let cli = Cli::parse();

    // 设置日志记录，guard 需要保留到进程结束
    let log_guard = setup_logging(cli.verbose);
    debug!("{}", project_info::get_version_string());

    // 参数校验在连接 Docker 之前完成
    let app = CliApp::new_validated(&cli.command, || {
        CliApp::new_with_config(cli.config.as_deref())
    })
    .await;

    let mut app = match app {
        Ok(app) => app,
        Err(e) => {
            for line in startup_error_lines(&e) {
                error!("{}", line);
            }
            drop(log_guard);
            std::process::exit(1);
        }
    };

    // 运行命令
    if let Err(e) = app.run_command(cli.command).await {
        error!("❌ 操作失败: {}", e);
        drop(log_guard);
        std::process::exit(1);
    }
}
