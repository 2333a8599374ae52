use crate::constants::{config, docker};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 应用配置结构
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub data: DataConfig,
}

/// Docker相关配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DockerConfig {
    /// Docker 地址，例如 `unix:///var/run/docker.sock` 或 `tcp://127.0.0.1:2375`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 数据目录相关配置（交互式创建容器时的默认值）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DataConfig {
    #[serde(default = "default_geoserver_dir")]
    pub geoserver_dir: String,
    #[serde(default = "default_thredds_dir")]
    pub thredds_dir: String,
}

fn default_stop_timeout() -> u64 {
    docker::DEFAULT_STOP_TIMEOUT_SECS
}

fn default_connect_timeout() -> u64 {
    docker::DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_geoserver_dir() -> String {
    config::DEFAULT_GEOSERVER_DATA_DIR.to_string()
}

fn default_thredds_dir() -> String {
    config::DEFAULT_THREDDS_DATA_DIR.to_string()
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            host: None,
            stop_timeout_secs: default_stop_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            geoserver_dir: default_geoserver_dir(),
            thredds_dir: default_thredds_dir(),
        }
    }
}

impl AppConfig {
    /// 智能查找并加载配置文件
    /// 按优先级查找：命令行指定的文件 -> tethys-docker.toml -> .tethys-docker.toml
    /// 都不存在时使用默认配置（不会自动写入文件）
    pub fn find_and_load_config(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if path.exists() {
                tracing::debug!("使用配置文件: {}", path.display());
                return Self::load_from_file(path);
            }
            tracing::warn!("⚠️  配置文件 {} 不存在，继续查找默认位置", path.display());
        }

        for config_file in config::CONFIG_FILE_NAMES {
            if Path::new(config_file).exists() {
                tracing::debug!("找到配置文件: {}", config_file);
                return Self::load_from_file(config_file);
            }
        }

        tracing::debug!("未找到配置文件，使用默认配置");
        Ok(Self::default())
    }

    /// 从指定文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// 实际使用的 Docker 地址，`DOCKER_HOST` 环境变量优先
    pub fn docker_host(&self) -> Option<String> {
        std::env::var(docker::DOCKER_HOST_ENV)
            .ok()
            .filter(|host| !host.trim().is_empty())
            .or_else(|| self.docker.host.clone())
    }

    /// 服务端点显示用的主机名
    ///
    /// 本地 socket 一律显示 localhost，TCP 地址取其主机部分
    pub fn endpoint_host(&self) -> String {
        match self.docker_host() {
            Some(host) => host_from_docker_url(&host),
            None => docker::LOCAL_HOST.to_string(),
        }
    }

    /// 展开后的 GeoServer 数据目录默认值
    pub fn geoserver_data_dir(&self) -> PathBuf {
        expand_home(&self.data.geoserver_dir)
    }

    /// 展开后的 THREDDS 数据目录默认值
    pub fn thredds_data_dir(&self) -> PathBuf {
        expand_home(&self.data.thredds_dir)
    }
}

/// 从 Docker 地址中提取主机名
fn host_from_docker_url(url: &str) -> String {
    let Some(rest) = url
        .strip_prefix("tcp://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.strip_prefix("https://"))
    else {
        return docker::LOCAL_HOST.to_string();
    };

    let host = rest.split(['/', ':']).next().unwrap_or_default();
    if host.is_empty() {
        docker::LOCAL_HOST.to_string()
    } else {
        host.to_string()
    }
}

/// 展开路径开头的 `~`
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.docker.stop_timeout_secs, 10);
        assert_eq!(config.docker.connect_timeout_secs, 120);
        assert!(config.docker.host.is_none());
        assert_eq!(config.data.geoserver_dir, "~/tethys/geoserver/data");
        assert_eq!(config.data.thredds_dir, "~/tethys/thredds");
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tethys-docker.toml");

        let mut config = AppConfig::default();
        config.docker.host = Some("tcp://10.0.0.5:2375".to_string());
        config.docker.stop_timeout_secs = 30;
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[data]\nthredds_dir = \"/srv/thredds\"\n").unwrap();

        let loaded = AppConfig::find_and_load_config(Some(&path)).unwrap();
        assert_eq!(loaded.data.thredds_dir, "/srv/thredds");
        assert_eq!(loaded.data.geoserver_dir, "~/tethys/geoserver/data");
        assert_eq!(loaded.docker, DockerConfig::default());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[docker\nhost = ").unwrap();

        assert!(matches!(
            AppConfig::load_from_file(&path),
            Err(crate::TethysError::Config(_))
        ));
    }

    #[test]
    fn test_host_from_docker_url() {
        assert_eq!(host_from_docker_url("tcp://192.168.99.100:2376"), "192.168.99.100");
        assert_eq!(host_from_docker_url("unix:///var/run/docker.sock"), "localhost");
        assert_eq!(host_from_docker_url("http://docker.internal/"), "docker.internal");
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/tethys"), home.join("tethys"));
        }
    }
}
