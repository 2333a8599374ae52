use clap::Parser;
use std::sync::Arc;
use tethys_cli::{
    Cli, CliApp, Commands, docker_command, docker_init, docker_remove, docker_update,
    validate_command,
};
use tethys_core::TethysError;
use tethys_core::config::AppConfig;
use tethys_core::container::testing::{DockerCall, RecordingDocker};
use tethys_core::container::{ContainerKind, ImageOverride};
use tethys_core::input::ScriptedInput;

fn seeded_docker() -> RecordingDocker {
    RecordingDocker::new()
        .with_image("postgis/postgis:latest")
        .with_container("tethys_postgis", true)
        .with_container("tethys_geoserver", false)
}

fn app_with(docker: Arc<RecordingDocker>, input: ScriptedInput) -> CliApp {
    CliApp::new(AppConfig::default(), docker, Box::new(input))
}

fn parse_docker_args(argv: &[&str]) -> tethys_cli::DockerArgs {
    let cli = Cli::try_parse_from(argv).unwrap();
    let Commands::Docker(args) = cli.command;
    args
}

#[tokio::test]
async fn update_equals_remove_then_forced_init() {
    let selection = [ContainerKind::PostGis, ContainerKind::GeoServer, ContainerKind::Wps];
    let image = ImageOverride::default();

    let updated = Arc::new(seeded_docker());
    let mut app = app_with(updated.clone(), ScriptedInput::default());
    docker_update(&mut app, Some(&selection[..]), true, &image)
        .await
        .unwrap();

    let manual = Arc::new(seeded_docker());
    let mut app = app_with(manual.clone(), ScriptedInput::default());
    docker_remove(&mut app, Some(&selection[..])).await.unwrap();
    docker_init(&mut app, Some(&selection[..]), true, true, &image)
        .await
        .unwrap();

    assert_eq!(updated.calls(), manual.calls());

    let mutating = updated.mutating_calls();
    assert_eq!(mutating[0], DockerCall::Stop("tethys_postgis".to_string()));
    assert_eq!(mutating[1], DockerCall::Remove("tethys_postgis".to_string()));
    assert_eq!(mutating[2], DockerCall::Remove("tethys_geoserver".to_string()));
    assert_eq!(
        mutating
            .iter()
            .filter(|call| matches!(call, DockerCall::Pull { .. }))
            .count(),
        3
    );
    assert_eq!(updated.is_running("tethys_postgis"), Some(false));
    assert_eq!(updated.is_running("tethys_wps"), Some(false));
}

#[tokio::test]
async fn interactive_init_uses_prompted_password() {
    let docker = Arc::new(RecordingDocker::new());
    let input = ScriptedInput::new(["geo-secret", "geo-secret"]);
    let mut app = app_with(docker.clone(), input);

    let args = parse_docker_args(&["tethys", "docker", "init", "-c", "postgis"]);
    docker_command(&mut app, &args).await.unwrap();

    let options = docker.created_options("tethys_postgis").unwrap();
    assert_eq!(options.environment["POSTGRES_PASSWORD"], "geo-secret");
    assert_eq!(options.host_config.port_bindings.get(&5432), Some(&5435));
    assert!(docker.has_image("postgis/postgis:latest"));
}

#[tokio::test]
async fn init_with_image_override_for_single_container() {
    let docker = Arc::new(RecordingDocker::new());
    let mut app = app_with(docker.clone(), ScriptedInput::default());

    let args = parse_docker_args(&[
        "tethys", "docker", "init", "-d", "-c", "thredds", "-t", "5.5",
    ]);
    docker_command(&mut app, &args).await.unwrap();

    assert_eq!(
        docker.mutating_calls(),
        vec![
            DockerCall::Pull {
                image: "unidata/thredds-docker".to_string(),
                tag: "5.5".to_string(),
            },
            DockerCall::Create {
                name: "tethys_thredds".to_string(),
                image: "unidata/thredds-docker:5.5".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn image_override_with_all_containers_is_rejected() {
    let docker = Arc::new(RecordingDocker::new());
    let mut app = app_with(docker.clone(), ScriptedInput::default());

    let args = parse_docker_args(&["tethys", "docker", "update", "-i", "custom/image"]);
    let result = docker_command(&mut app, &args).await;

    assert!(matches!(result, Err(TethysError::InvalidArguments(_))));
    assert!(docker.calls().is_empty());
}

#[test]
fn override_errors_need_no_docker() {
    let cli = Cli::try_parse_from(["tethys", "docker", "init", "-i", "custom/image", "-t", "1"])
        .unwrap();
    assert!(matches!(
        validate_command(&cli.command),
        Err(TethysError::InvalidArguments(_))
    ));

    let cli = Cli::try_parse_from(["tethys", "docker", "status", "-t", "1"]).unwrap();
    assert!(validate_command(&cli.command).is_ok());
}

#[tokio::test]
async fn unreachable_daemon_propagates() {
    let docker = Arc::new(RecordingDocker::unreachable());
    let mut app = app_with(docker, ScriptedInput::default());

    let args = parse_docker_args(&["tethys", "docker", "status"]);
    let result = docker_command(&mut app, &args).await;

    assert!(matches!(result, Err(TethysError::DockerUnavailable(_))));
}

#[tokio::test]
async fn lifecycle_round_trip() {
    let docker = Arc::new(RecordingDocker::new());
    let mut app = app_with(docker.clone(), ScriptedInput::default());

    for argv in [
        ["tethys", "docker", "init", "-d"].as_slice(),
        ["tethys", "docker", "start"].as_slice(),
    ] {
        docker_command(&mut app, &parse_docker_args(argv)).await.unwrap();
    }

    let status = docker_command(&mut app, &parse_docker_args(&["tethys", "docker", "status"]))
        .await
        .unwrap();
    assert!(status.iter().all(|line| line.ends_with(": Running")));

    docker_command(&mut app, &parse_docker_args(&["tethys", "docker", "remove"]))
        .await
        .unwrap();
    let status = docker_command(&mut app, &parse_docker_args(&["tethys", "docker", "status"]))
        .await
        .unwrap();
    assert!(status.iter().all(|line| line.ends_with(": Not Installed")));
}
