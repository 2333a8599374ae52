use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

/// 日志输出到文件时使用的环境变量
pub const LOG_FILE_ENV: &str = "TETHYS_LOG_FILE";

/// # 日志系统
///
/// - 库代码只使用 `tracing` 宏，入口 `main.rs` 调用本函数完成配置
/// - `-v, --verbose` 启用 DEBUG 级别，`RUST_LOG` 可以覆盖
/// - 设置 `TETHYS_LOG_FILE` 后日志追加写入该文件（包含模块路径与行号）
///
/// ```bash
/// tethys -v docker status
/// TETHYS_LOG_FILE=tethys.log tethys docker init -d
/// RUST_LOG=tethys_core::container=debug tethys docker ip
/// ```
///
/// 返回的 guard 必须在整个进程生命周期内保留，否则文件日志可能丢失。
pub fn setup_logging(verbose: bool) -> Option<WorkerGuard> {
    use tracing_subscriber::{EnvFilter, fmt};

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Ok(log_file) = std::env::var(LOG_FILE_ENV) {
        match open_log_file(Path::new(&log_file)) {
            Ok(file) => {
                let (writer, guard) = tracing_appender::non_blocking(file);
                fmt()
                    .with_env_filter(env_filter)
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_line_number(true)
                    .init();
                return Some(guard);
            }
            Err(e) => {
                eprintln!("⚠️  无法打开日志文件 {log_file}: {e}，改为输出到终端");
            }
        }
    }

    // 终端输出使用简洁格式
    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_names(false)
        .with_line_number(false)
        .without_time()
        .compact()
        .init();
    None
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_log_file_creates_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("tethys.log");

        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
