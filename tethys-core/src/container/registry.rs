use super::types::{ContainerKind, ContainerProfile};
use crate::TethysError;
use std::fmt;
use std::str::FromStr;

const POSTGIS: ContainerProfile = ContainerProfile {
    input: "postgis",
    name: "tethys_postgis",
    display_name: "PostGIS/Database Server",
    image_name: "postgis/postgis",
    tag: "latest",
    host_port: 5435,
    container_port: 5432,
};

const GEOSERVER: ContainerProfile = ContainerProfile {
    input: "geoserver",
    name: "tethys_geoserver",
    display_name: "GeoServer",
    image_name: "tethysplatform/geoserver",
    tag: "latest",
    host_port: 8181,
    container_port: 8080,
};

const WPS: ContainerProfile = ContainerProfile {
    input: "wps",
    name: "tethys_wps",
    display_name: "52 North WPS",
    image_name: "ciwater/n52wps",
    tag: "3.3.1",
    host_port: 8282,
    container_port: 8080,
};

const THREDDS: ContainerProfile = ContainerProfile {
    input: "thredds",
    name: "tethys_thredds",
    display_name: "THREDDS Server",
    image_name: "unidata/thredds-docker",
    tag: "5.6",
    host_port: 8383,
    container_port: 8080,
};

impl ContainerKind {
    /// 所有受支持的服务，顺序即命令执行顺序
    pub const ALL: [ContainerKind; 4] = [
        ContainerKind::PostGis,
        ContainerKind::GeoServer,
        ContainerKind::Wps,
        ContainerKind::Thredds,
    ];

    pub fn profile(&self) -> &'static ContainerProfile {
        match self {
            ContainerKind::PostGis => &POSTGIS,
            ContainerKind::GeoServer => &GEOSERVER,
            ContainerKind::Wps => &WPS,
            ContainerKind::Thredds => &THREDDS,
        }
    }

    pub fn input(&self) -> &'static str {
        self.profile().input
    }

    pub fn container_name(&self) -> &'static str {
        self.profile().name
    }

    pub fn display_name(&self) -> &'static str {
        self.profile().display_name
    }
}

impl FromStr for ContainerKind {
    type Err = TethysError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        ContainerKind::ALL
            .into_iter()
            .find(|kind| kind.input() == token)
            .ok_or(TethysError::UnknownContainer(s.to_string()))
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.input())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_tokens() {
        assert_eq!("postgis".parse::<ContainerKind>().unwrap(), ContainerKind::PostGis);
        assert_eq!("GeoServer".parse::<ContainerKind>().unwrap(), ContainerKind::GeoServer);
        assert_eq!(" wps ".parse::<ContainerKind>().unwrap(), ContainerKind::Wps);
        assert_eq!("thredds".parse::<ContainerKind>().unwrap(), ContainerKind::Thredds);
        assert!(matches!(
            "mysql".parse::<ContainerKind>(),
            Err(TethysError::UnknownContainer(token)) if token == "mysql"
        ));
    }

    #[test]
    fn test_declared_images_and_ports() {
        let postgis = ContainerKind::PostGis.profile();
        assert_eq!((postgis.image_name, postgis.tag), ("postgis/postgis", "latest"));
        assert_eq!((postgis.host_port, postgis.container_port), (5435, 5432));

        let geoserver = ContainerKind::GeoServer.profile();
        assert_eq!(geoserver.image_name, "tethysplatform/geoserver");
        assert_eq!((geoserver.host_port, geoserver.container_port), (8181, 8080));

        let wps = ContainerKind::Wps.profile();
        assert_eq!((wps.image_name, wps.tag), ("ciwater/n52wps", "3.3.1"));
        assert_eq!(wps.host_port, 8282);

        let thredds = ContainerKind::Thredds.profile();
        assert_eq!((thredds.image_name, thredds.tag), ("unidata/thredds-docker", "5.6"));
        assert_eq!(thredds.host_port, 8383);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = ContainerKind::ALL.iter().map(|k| k.container_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ContainerKind::ALL.len());
    }

    #[test]
    fn test_display_uses_selector_token() {
        assert_eq!(ContainerKind::Thredds.to_string(), "thredds");
    }
}
