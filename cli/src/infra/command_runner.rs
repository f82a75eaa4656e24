//! Child-process execution for the Terraform CLI and `gcloud`.
//!
//! Every child gets a hard deadline. On expiry it is killed explicitly
//! rather than left to `kill_on_drop`, so a hung `terraform apply` can never
//! outlive the scenario that started it.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::application::ports::CommandRunner;

/// Default timeout for short helper commands (`gcloud auth`, version checks).
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Returned (inside `anyhow::Error`) when a child is killed on timeout, so
/// callers can tell a hung tool from one that failed to start.
#[derive(Debug, thiserror::Error)]
#[error("{program} timed out after {}s", .after.as_secs())]
pub struct CommandTimedOut {
    pub program: String,
    pub after: Duration,
}

/// Spawns children with piped output, a null stdin and a fixed set of
/// extra environment variables.
pub struct TokioCommandRunner {
    timeout: Duration,
    envs: Vec<(String, String)>,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            envs: Vec::new(),
        }
    }

    /// Add an environment variable to every spawned child.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

/// Read a pipe to the end. A broken pipe yields whatever arrived first.
async fn drain<S: AsyncRead + Unpin>(pipe: Option<S>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        tracing::debug!(program, ?args, timeout_secs = timeout.as_secs(), "spawning");
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let finished = async {
            let (status, stdout, stderr) = tokio::join!(child.wait(), stdout, stderr);
            let status = status.with_context(|| format!("waiting for {program}"))?;
            Ok::<_, anyhow::Error>(Output {
                status,
                stdout,
                stderr,
            })
        };

        let waited = tokio::time::timeout(timeout, finished).await;
        match waited {
            Ok(output) => output,
            Err(_elapsed) => {
                let _ = child.kill().await;
                tracing::warn!(program, timeout_secs = timeout.as_secs(), "killed after timeout");
                Err(CommandTimedOut {
                    program: program.to_string(),
                    after: timeout,
                }
                .into())
            }
        }
    }
}
