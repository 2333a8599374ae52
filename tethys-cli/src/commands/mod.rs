mod docker;

// Docker container commands
pub use docker::{
    docker_command, docker_init, docker_ip, docker_remove, docker_restart, docker_start,
    docker_status, docker_stop, docker_update, validate_args,
};
