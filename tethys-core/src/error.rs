use thiserror::Error;

pub type Result<T> = std::result::Result<T, TethysError>;

#[derive(Error, Debug)]
pub enum TethysError {
    #[error("配置错误: {0}")]
    Config(#[from] toml::de::Error),

    #[error("配置序列化错误: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("无法连接 Docker 守护进程: {0}")]
    DockerUnavailable(String),

    #[error("Docker API 调用失败: {0}")]
    Docker(String),

    #[error("未知的容器: {0} (可选: postgis, geoserver, wps, thredds)")]
    UnknownContainer(String),

    #[error("参数无效: {0}")]
    InvalidArguments(String),

    #[error("自定义错误: {0}")]
    Custom(String),
}

impl From<bollard::errors::Error> for TethysError {
    fn from(err: bollard::errors::Error) -> Self {
        TethysError::Docker(err.to_string())
    }
}

impl TethysError {
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    pub fn docker(msg: impl Into<String>) -> Self {
        Self::Docker(msg.into())
    }

    pub fn docker_unavailable(msg: impl Into<String>) -> Self {
        Self::DockerUnavailable(msg.into())
    }

    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }
}
