/// Docker 连接相关常量
pub mod docker {
    /// 覆盖 Docker 地址的环境变量
    pub const DOCKER_HOST_ENV: &str = "DOCKER_HOST";

    /// 通过本地 socket 连接时，服务端点使用的主机名
    pub const LOCAL_HOST: &str = "localhost";

    /// 停止容器的默认等待时间（秒）
    pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 10;

    /// 连接 Docker 守护进程的默认超时（秒）
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 120;
}

/// 配置文件相关常量
pub mod config {
    /// 按优先级查找的配置文件名
    pub const CONFIG_FILE_NAMES: &[&str] = &["tethys-docker.toml", ".tethys-docker.toml"];

    /// GeoServer 数据目录的默认位置（相对于用户主目录）
    pub const DEFAULT_GEOSERVER_DATA_DIR: &str = "~/tethys/geoserver/data";

    /// THREDDS 数据目录的默认位置（相对于用户主目录）
    pub const DEFAULT_THREDDS_DATA_DIR: &str = "~/tethys/thredds";
}

/// PostGIS 容器常量
pub mod postgis {
    pub const DEFAULT_PASSWORD: &str = "pass";
}

/// GeoServer 容器常量
pub mod geoserver {
    /// 支持集群模式的镜像
    pub const CLUSTER_IMAGE: &str = "tethysplatform/geoserver";

    /// 集群模式下负载均衡器端口
    pub const CLUSTER_PRIMARY_PORT: u16 = 8181;

    /// 集群模式下各节点端口
    pub const CLUSTER_NODE_PORTS: [u16; 4] = [8081, 8082, 8083, 8084];

    pub const MAX_NODES: i64 = 4;
    pub const DEFAULT_ENABLED_NODES: i64 = 1;
    pub const DEFAULT_REST_NODES: i64 = 1;
    pub const DEFAULT_MAX_TIMEOUT: i64 = 60;
    pub const MAX_TIMEOUT_LIMIT: i64 = 1800;
    pub const NUM_CORES_CHOICES: &[&str] = &["1", "2", "4", "6", "8"];
    pub const DEFAULT_NUM_CORES: &str = "4";
    pub const MIN_MEMORY_MB: i64 = 512;
    pub const MAX_MEMORY_MB: i64 = 16384;
    pub const DEFAULT_MEMORY_MB: i64 = 1024;

    /// 请求限制模式
    pub const REQUEST_LIMIT_TIMEOUT: &str = "timeout";
    pub const REQUEST_LIMIT_UNLIMITED: &str = "unlimited";

    /// 容器内数据目录
    pub const DATA_MOUNT_TARGET: &str = "/var/geoserver/data";
}

/// 52 North WPS 容器常量
pub mod wps {
    /// 联系人字段，默认值均为 NONE
    pub const CONTACT_FIELDS: &[(&str, &str)] = &[
        ("NAME", "名称"),
        ("POSITION", "职位"),
        ("ADDRESS", "地址"),
        ("CITY", "城市"),
        ("STATE", "州/省"),
        ("COUNTRY", "国家"),
        ("POSTAL_CODE", "邮编"),
        ("EMAIL", "电子邮箱"),
        ("PHONE", "电话"),
        ("FAX", "传真"),
    ];

    pub const DEFAULT_CONTACT_VALUE: &str = "NONE";
    pub const DEFAULT_USERNAME: &str = "wps";
    pub const DEFAULT_PASSWORD: &str = "wps";
}

/// THREDDS 容器常量
pub mod thredds {
    pub const DEFAULT_TDM_PW: &str = "CHANGEME!";
    pub const DEFAULT_TDS_HOST: &str = "http://localhost";

    /// 堆内存大小（GB）
    pub const MAX_HEAP_GB: i64 = 64;
    pub const DEFAULT_THREDDS_XMS_GB: i64 = 1;
    pub const DEFAULT_THREDDS_XMX_GB: i64 = 4;
    pub const DEFAULT_TDM_XMS_GB: i64 = 1;
    pub const DEFAULT_TDM_XMX_GB: i64 = 6;

    /// 容器内数据目录
    pub const DATA_MOUNT_TARGET: &str = "/usr/local/tomcat/content/thredds";
}
