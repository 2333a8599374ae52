//! 测试替身：内存中的 Docker 守护进程，记录所有调用

use super::docker::{DockerApi, PullEvent};
use super::types::ContainerOptions;
use crate::{Result, TethysError};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// 被记录的一次 Docker 调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerCall {
    Ping,
    ListContainers { all: bool },
    ListImages,
    Pull { image: String, tag: String },
    Create { name: String, image: String },
    Start(String),
    Stop(String),
    Remove(String),
    Inspect(String),
}

impl DockerCall {
    /// 是否会改变守护进程状态
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            DockerCall::Pull { .. }
                | DockerCall::Create { .. }
                | DockerCall::Start(_)
                | DockerCall::Stop(_)
                | DockerCall::Remove(_)
        )
    }
}

#[derive(Debug, Default)]
struct FakeState {
    /// 容器名称 -> 是否运行
    containers: BTreeMap<String, bool>,
    created: BTreeMap<String, ContainerOptions>,
    images: BTreeSet<String>,
    failing_start: BTreeSet<String>,
    failing_stop: BTreeSet<String>,
    port_bindings: BTreeMap<String, BTreeMap<u16, u16>>,
    calls: Vec<DockerCall>,
}

/// 行为接近真实守护进程的内存实现
#[derive(Debug, Default)]
pub struct RecordingDocker {
    state: Mutex<FakeState>,
    unreachable: bool,
}

impl RecordingDocker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有调用都返回连接失败
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn with_container(self, name: &str, running: bool) -> Self {
        self.lock().containers.insert(name.to_string(), running);
        self
    }

    pub fn with_image(self, image: &str) -> Self {
        self.lock().images.insert(image.to_string());
        self
    }

    pub fn with_port_bindings(self, name: &str, bindings: &[(u16, u16)]) -> Self {
        self.lock()
            .port_bindings
            .insert(name.to_string(), bindings.iter().copied().collect());
        self
    }

    pub fn failing_start(self, name: &str) -> Self {
        self.lock().failing_start.insert(name.to_string());
        self
    }

    pub fn failing_stop(self, name: &str) -> Self {
        self.lock().failing_stop.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<DockerCall> {
        self.lock().calls.clone()
    }

    /// 只保留会改变状态的调用
    pub fn mutating_calls(&self) -> Vec<DockerCall> {
        self.calls()
            .into_iter()
            .filter(DockerCall::is_mutating)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn is_running(&self, name: &str) -> Option<bool> {
        self.lock().containers.get(name).copied()
    }

    pub fn has_image(&self, image: &str) -> bool {
        self.lock().images.contains(image)
    }

    /// 最近一次创建该容器时使用的参数
    pub fn created_options(&self, name: &str) -> Option<ContainerOptions> {
        self.lock().created.get(name).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: DockerCall) -> Result<std::sync::MutexGuard<'_, FakeState>> {
        if self.unreachable {
            return Err(TethysError::docker_unavailable(
                "Cannot connect to the Docker daemon",
            ));
        }
        let mut state = self.lock();
        state.calls.push(call);
        Ok(state)
    }
}

#[async_trait]
impl DockerApi for RecordingDocker {
    async fn ping(&self) -> Result<()> {
        self.record(DockerCall::Ping).map(|_| ())
    }

    async fn list_container_names(&self, all: bool) -> Result<Vec<String>> {
        let state = self.record(DockerCall::ListContainers { all })?;
        Ok(state
            .containers
            .iter()
            .filter(|(_, running)| all || **running)
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn list_image_tags(&self) -> Result<Vec<String>> {
        let state = self.record(DockerCall::ListImages)?;
        Ok(state.images.iter().cloned().collect())
    }

    async fn pull_image(
        &self,
        image: &str,
        tag: &str,
        on_event: &mut (dyn FnMut(PullEvent) + Send),
    ) -> Result<()> {
        {
            let mut state = self.record(DockerCall::Pull {
                image: image.to_string(),
                tag: tag.to_string(),
            })?;
            state.images.insert(format!("{image}:{tag}"));
        }

        on_event(PullEvent {
            id: Some("layer0".to_string()),
            status: Some("Downloading".to_string()),
            progress: None,
            current: Some(50),
            total: Some(100),
        });
        on_event(PullEvent {
            id: Some("layer0".to_string()),
            status: Some("Pull complete".to_string()),
            ..Default::default()
        });
        Ok(())
    }

    async fn create_container(&self, options: &ContainerOptions) -> Result<()> {
        let mut state = self.record(DockerCall::Create {
            name: options.name.clone(),
            image: options.image.clone(),
        })?;
        if state.containers.contains_key(&options.name) {
            return Err(TethysError::docker(format!(
                "Conflict. The container name \"/{}\" is already in use",
                options.name
            )));
        }
        state.containers.insert(options.name.clone(), false);
        state.created.insert(options.name.clone(), options.clone());
        Ok(())
    }

    async fn start_container(&self, name: &str) -> Result<()> {
        let mut state = self.record(DockerCall::Start(name.to_string()))?;
        if state.failing_start.contains(name) {
            return Err(TethysError::docker(format!(
                "driver failed programming external connectivity on endpoint {name}: port is already allocated"
            )));
        }
        match state.containers.get_mut(name) {
            Some(running) => {
                *running = true;
                Ok(())
            }
            None => Err(TethysError::docker(format!("No such container: {name}"))),
        }
    }

    async fn stop_container(&self, name: &str, _timeout_secs: u64) -> Result<()> {
        let mut state = self.record(DockerCall::Stop(name.to_string()))?;
        if state.failing_stop.contains(name) {
            return Err(TethysError::docker(format!("cannot stop container: {name}")));
        }
        match state.containers.get_mut(name) {
            Some(running) => {
                *running = false;
                Ok(())
            }
            None => Err(TethysError::docker(format!("No such container: {name}"))),
        }
    }

    async fn remove_container(&self, name: &str) -> Result<()> {
        let mut state = self.record(DockerCall::Remove(name.to_string()))?;
        match state.containers.get(name).copied() {
            Some(true) => Err(TethysError::docker(format!(
                "You cannot remove a running container {name}. Stop the container before attempting removal"
            ))),
            Some(false) => {
                state.containers.remove(name);
                state.created.remove(name);
                Ok(())
            }
            None => Err(TethysError::docker(format!("No such container: {name}"))),
        }
    }

    async fn inspect_port_bindings(&self, name: &str) -> Result<BTreeMap<u16, u16>> {
        let state = self.record(DockerCall::Inspect(name.to_string()))?;
        if !state.containers.contains_key(name) {
            return Err(TethysError::docker(format!("No such container: {name}")));
        }
        if let Some(bindings) = state.port_bindings.get(name) {
            return Ok(bindings.clone());
        }
        Ok(state
            .created
            .get(name)
            .map(|options| options.host_config.port_bindings.clone())
            .unwrap_or_default())
    }
}
