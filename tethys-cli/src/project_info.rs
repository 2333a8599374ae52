/// 项目元数据（自动从 tethys-cli 的 Cargo.toml 同步）
pub mod metadata {
    pub const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

    pub const PROJECT_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

    pub const PROJECT_AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

    pub const PROJECT_VERSION: &str = env!("CARGO_PKG_VERSION");

    /// 用户友好的显示名称（手动维护）
    pub mod display {
        pub const FRIENDLY_NAME: &str = "Tethys Docker";

        /// 比 Cargo.toml 中的描述更详细
        pub const DESCRIPTION_LONG: &str = "管理 Tethys Platform 依赖的辅助服务容器（PostGIS、GeoServer、52 North WPS、THREDDS）：拉取镜像、创建、启动、停止、删除并显示访问地址";
    }
}

/// 获取版本信息字符串
pub fn get_version_string() -> String {
    format!(
        "{} v{} ({})",
        metadata::display::FRIENDLY_NAME,
        metadata::PROJECT_VERSION,
        metadata::PROJECT_NAME
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string() {
        let version = get_version_string();
        assert!(version.starts_with("Tethys Docker v"));
        assert!(version.contains("tethys-cli"));
    }
}
