//! Process supervisor: direct spawn and restricted-runner process lifecycle.
//!
//! Direct mode pipes all three stdio streams, sets env and an optional cwd,
//! and attaches a background stderr drain that passes lines straight
//! through to the host's own stderr. Restricted mode delegates to a
//! [`RestrictedRunner`] and ignores any cwd override, emitting a warning
//! through the output sink instead of silently dropping it.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Child;
use tokio_util::sync::CancellationToken;

use crate::error::SupervisorError;
use crate::output::OutputSink;
use crate::process::runner::{RestrictedRunner, RunnerHandles};

/// The live stdio handles plus a teardown closure, independent of which
/// mode produced them.
pub struct Supervised {
    pub stdin: Box<dyn AsyncWrite + Unpin>,
    pub stdout: Box<dyn AsyncRead + Unpin>,
    teardown: Teardown,
}

enum Teardown {
    Direct(Child),
    Restricted {
        ctx: CancellationToken,
        wait: std::pin::Pin<Box<dyn std::future::Future<Output = std::io::Result<()>>>>,
    },
}

impl Supervised {
    /// Terminate the process and reap it. Idempotent at the call-site
    /// level: the connection controller only calls this once, from
    /// `close()`, but a repeated call is harmless (a second `kill` on an
    /// already-dead child just errors, which this swallows).
    pub async fn teardown(self) {
        match self.teardown {
            Teardown::Direct(mut child) => {
                let _ = child.kill().await;
                let _ = child.wait().await;
            }
            Teardown::Restricted { ctx, wait } => {
                ctx.cancel();
                let _ = wait.await;
            }
        }
        tracing::info!("agent process torn down");
    }
}

/// Direct-spawn mode: `argv[0]` with `argv[1:]`, merged env, optional cwd,
/// stderr attached to the host's own stderr.
pub fn spawn_direct(
    program: &str,
    args: &[String],
    env: &HashMap<String, String>,
    cwd: Option<&PathBuf>,
) -> Result<Supervised, SupervisorError> {
    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .envs(env)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }

    let mut child = cmd.spawn().map_err(|e| {
        tracing::error!(error = %e, program, "failed to spawn agent process");
        SupervisorError::SpawnFailed(e)
    })?;
    tracing::info!(program, pid = ?child.id(), "spawned agent process");

    let stdin = child.stdin.take().ok_or(SupervisorError::PipeError)?;
    let stdout = child.stdout.take().ok_or(SupervisorError::PipeError)?;
    let stderr = child.stderr.take().ok_or(SupervisorError::PipeError)?;

    tokio::task::spawn_local(drain_stderr(stderr));

    Ok(Supervised {
        stdin: Box::new(stdin),
        stdout: Box::new(stdout),
        teardown: Teardown::Direct(child),
    })
}

/// Restricted-runner mode. `cwd` is accepted only to detect and warn about
/// an override the runner cannot honour.
pub fn spawn_restricted(
    runner: &dyn RestrictedRunner,
    program: &str,
    args: &[String],
    env: &HashMap<String, String>,
    cwd: Option<&PathBuf>,
    notice: &OutputSink,
) -> Result<Supervised, SupervisorError> {
    if cwd.is_some() {
        tracing::warn!(program, "working-directory override ignored by restricted runner");
        notice("working-directory override is not honoured by the restricted runner");
    }

    let ctx = CancellationToken::new();
    let RunnerHandles {
        stdin,
        stdout,
        stderr,
        wait,
    } = runner.run(&ctx, program, args, env).map_err(|e| {
        tracing::error!(error = %e, program, "restricted runner failed to start agent");
        SupervisorError::RunnerStartFailed(e)
    })?;
    tracing::info!(program, "spawned agent process via restricted runner");

    tokio::task::spawn_local(drain_stderr(stderr));

    Ok(Supervised {
        stdin,
        stdout,
        teardown: Teardown::Restricted { ctx, wait },
    })
}

async fn drain_stderr<R: AsyncRead + Unpin + 'static>(stderr: R) {
    use tokio::io::AsyncBufReadExt;
    let mut lines = tokio::io::BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        eprintln!("{line}");
    }
}
