//! Docker container-based execution
//!
//! One ephemeral container per test-case run: network disabled, resource
//! limited, and the scratch workspace bind-mounted at `/app`.

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, KillContainerOptions, LogOutput, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::SandboxConfig;
use crate::error::{Error, Result};
use crate::sandbox::executor::{CodeExecutor, ExecutionRequest, ExecutionResult};
use crate::sandbox::toolchain::Toolchain;
use crate::sandbox::workspace::Workspace;

const CONTAINER_WORKDIR: &str = "/app";

/// How a started container finished
enum RunOutcome {
    Exited(i32),
    TimedOut,
    WaitFailed(String),
}

/// Docker container executor
pub struct ContainerExecutor {
    /// Docker client
    docker: Docker,
    /// Sandbox configuration
    config: SandboxConfig,
    /// Scratch workspace bound into every container
    workspace: Workspace,
    /// Images known to be present locally
    images: Mutex<HashSet<String>>,
}

impl ContainerExecutor {
    /// Connect to the local Docker daemon
    pub async fn new(config: &SandboxConfig, workspace: Workspace) -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| Error::Container(format!("Failed to connect to Docker: {}", e)))?;

        docker
            .ping()
            .await
            .map_err(|e| Error::Container(format!("Docker ping failed: {}", e)))?;

        info!(workspace = %workspace.root().display(), "Container executor connected to Docker");

        Ok(ContainerExecutor {
            docker,
            config: config.clone(),
            workspace,
            images: Mutex::new(HashSet::new()),
        })
    }

    /// Ensure the image is available, pulling it on first use
    async fn ensure_image(&self, image: &str) -> Result<()> {
        let mut known = self.images.lock().await;
        if known.contains(image) {
            return Ok(());
        }

        if self.docker.inspect_image(image).await.is_err() {
            if !self.config.pull_images {
                return Err(Error::Container(format!(
                    "Image {} is not present and pulling is disabled",
                    image
                )));
            }

            info!(image, "Pulling Docker image");
            let options = CreateImageOptions {
                from_image: image.to_string(),
                ..Default::default()
            };
            let mut stream = self.docker.create_image(Some(options), None, None);
            while let Some(result) = stream.next().await {
                match result {
                    Ok(info) => {
                        if let Some(status) = info.status {
                            debug!("Pull status: {}", status);
                        }
                    }
                    Err(e) => {
                        return Err(Error::Container(format!("Failed to pull image {}: {}", image, e)));
                    }
                }
            }
            info!(image, "Image pulled successfully");
        }

        known.insert(image.to_string());
        Ok(())
    }

    /// Create, run and always remove a container for one program
    async fn run_container(&self, toolchain: &Toolchain, timeout: Duration) -> Result<ExecutionResult> {
        let start = Instant::now();
        let container_name = format!("geekjudge-{}", uuid::Uuid::new_v4());

        let container_config = Config {
            image: Some(toolchain.image.clone()),
            cmd: Some(toolchain.command.clone()),
            working_dir: Some(CONTAINER_WORKDIR.to_string()),
            network_disabled: Some(true),
            attach_stdin: Some(false),
            tty: Some(false),
            host_config: Some(bollard::service::HostConfig {
                binds: Some(vec![format!(
                    "{}:{}",
                    self.workspace.root().display(),
                    CONTAINER_WORKDIR
                )]),
                memory: self.config.memory_bytes(),
                memory_swap: self.config.memory_bytes(),
                nano_cpus: Some((self.config.cpu_limit * 1_000_000_000.0) as i64),
                pids_limit: Some(self.config.pids_limit),
                network_mode: Some("none".to_string()),
                auto_remove: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let create_options = CreateContainerOptions {
            name: container_name.as_str(),
            platform: None,
        };

        self.docker
            .create_container(Some(create_options), container_config)
            .await
            .map_err(|e| Error::Container(format!("Failed to create container: {}", e)))?;

        debug!(container = %container_name, image = %toolchain.image, "Created container");

        let outcome = self.start_and_wait(&container_name, timeout).await;
        let logs = if outcome.is_ok() {
            self.get_container_logs(&container_name).await
        } else {
            Ok((String::new(), String::new()))
        };

        // Removal runs on every path once the container exists
        if let Err(e) = self.remove_container(&container_name).await {
            warn!(container = %container_name, error = %e, "Failed to remove container");
        }

        let outcome = outcome?;
        let (stdout, stderr) = logs?;
        let execution_time = start.elapsed();

        Ok(match outcome {
            RunOutcome::Exited(0) => ExecutionResult {
                stderr,
                ..ExecutionResult::success(stdout, execution_time)
            },
            RunOutcome::Exited(code) => ExecutionResult::failure(stdout, stderr, code, execution_time),
            RunOutcome::WaitFailed(reason) => ExecutionResult {
                exit_code: None,
                ..ExecutionResult::failure(stdout, format!("{}\n{}", stderr, reason), -1, execution_time)
            },
            RunOutcome::TimedOut => {
                warn!(container = %container_name, timeout_secs = timeout.as_secs(), "Container execution timed out");
                ExecutionResult::timeout(stdout, stderr, timeout)
            }
        })
    }

    async fn start_and_wait(&self, name: &str, timeout: Duration) -> Result<RunOutcome> {
        self.docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| Error::Container(format!("Failed to start container: {}", e)))?;

        match tokio::time::timeout(timeout, self.wait_for_container(name)).await {
            Ok(Ok(code)) => Ok(RunOutcome::Exited(code)),
            Ok(Err(e)) => Ok(RunOutcome::WaitFailed(e.to_string())),
            Err(_) => {
                let options = KillContainerOptions { signal: "SIGKILL" };
                if let Err(e) = self.docker.kill_container(name, Some(options)).await {
                    warn!(container = %name, error = %e, "Failed to kill container");
                }
                Ok(RunOutcome::TimedOut)
            }
        }
    }

    /// Wait for a container to finish
    async fn wait_for_container(&self, name: &str) -> Result<i32> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };

        let mut stream = self.docker.wait_container(name, Some(options));

        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code as i32),
            // bollard reports a non-zero exit status as an error
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code as i32),
            Some(Err(e)) => Err(Error::Container(format!("Wait failed: {}", e))),
            None => Err(Error::Container("Container wait stream ended".to_string())),
        }
    }

    /// Get container logs, each stream capped at `max_output_bytes`
    async fn get_container_logs(&self, name: &str) -> Result<(String, String)> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            ..Default::default()
        };

        let mut stream = self.docker.logs(name, Some(options));
        let limit = self.config.max_output_bytes;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        while let Some(result) = stream.next().await {
            match result {
                Ok(LogOutput::StdOut { message }) => append_bounded(&mut stdout, &message, limit),
                Ok(LogOutput::StdErr { message }) => append_bounded(&mut stderr, &message, limit),
                Err(e) => {
                    warn!("Error reading logs: {}", e);
                }
                _ => {}
            }
        }

        Ok((
            String::from_utf8_lossy(&stdout).into_owned(),
            String::from_utf8_lossy(&stderr).into_owned(),
        ))
    }

    /// Remove a container
    async fn remove_container(&self, name: &str) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };

        self.docker
            .remove_container(name, Some(options))
            .await
            .map_err(|e| Error::Container(format!("Failed to remove container: {}", e)))?;

        debug!(container = %name, "Removed container");
        Ok(())
    }
}

fn append_bounded(buffer: &mut Vec<u8>, chunk: &[u8], limit: usize) {
    let room = limit.saturating_sub(buffer.len());
    buffer.extend_from_slice(&chunk[..chunk.len().min(room)]);
}

#[async_trait]
impl CodeExecutor for ContainerExecutor {
    fn name(&self) -> &str {
        "container"
    }

    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult> {
        let toolchain = Toolchain::for_language(&request.language, &self.config.images);
        if toolchain.is_fallback() {
            warn!(language = %request.language, image = %toolchain.image, "No toolchain for language, using fallback image");
        }

        self.ensure_image(&toolchain.image).await?;
        let _scratch = self.workspace.write(toolchain.filename, &request.source).await?;
        self.run_container(&toolchain, request.timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_bounded() {
        let mut buffer = Vec::new();
        append_bounded(&mut buffer, b"hello ", 8);
        append_bounded(&mut buffer, b"world", 8);
        append_bounded(&mut buffer, b"!", 8);
        assert_eq!(buffer, b"hello wo");
    }
}
