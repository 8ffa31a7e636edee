//! Sandbox module - Isolated execution of synthesized programs
//!
//! - executor: the `CodeExecutor` trait and request/result types
//! - container: ephemeral Docker containers via bollard
//! - toolchain: per-language image, filename and command
//! - workspace: the scratch directory bound into each container

mod container;
mod executor;
mod toolchain;
mod workspace;

pub use container::ContainerExecutor;
pub use executor::{CodeExecutor, ExecutionRequest, ExecutionResult};
pub use toolchain::Toolchain;
pub use workspace::{ScratchFile, Workspace};

use crate::config::{workspace_dir, SandboxConfig};
use crate::error::Result;

/// Prepare the workspace and connect the container executor
pub async fn create_executor(config: &SandboxConfig) -> Result<ContainerExecutor> {
    let root = config.workspace.clone().unwrap_or_else(workspace_dir);
    let workspace = Workspace::create(root)?;
    ContainerExecutor::new(config, workspace).await
}
