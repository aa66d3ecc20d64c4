//! The opaque restricted-runner trait: an alternate process-spawn mode for
//! sandboxed execution (sandbox-exec, firejail, a container).
//!
//! The shape — stdin/stdout/stderr handles plus a wait future, behind a
//! cancellable context — mirrors how a direct `tokio::process::Child` is
//! used elsewhere in this crate: take the three stdio pipes before moving
//! the child anywhere, and let teardown `kill()` then `wait()` it. A
//! restricted runner implements the same contract with the host process
//! swapped for something sandboxed.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

/// Runner-provided stdio handles plus a wait future, boxed so the trait
/// stays object-safe across different runner implementations.
pub struct RunnerHandles {
    pub stdin: Box<dyn AsyncWrite + Unpin>,
    pub stdout: Box<dyn AsyncRead + Unpin>,
    pub stderr: Box<dyn AsyncRead + Unpin>,
    pub wait: Pin<Box<dyn Future<Output = std::io::Result<()>>>>,
}

/// A sandboxed or otherwise restricted way to start the agent process.
/// Working-directory overrides are not honoured by runners — the runner
/// decides its own root.
pub trait RestrictedRunner {
    /// Start `argv0 argv[..]` with `env`, under `ctx`. Cancelling `ctx` must
    /// terminate the underlying process.
    fn run(
        &self,
        ctx: &CancellationToken,
        argv0: &str,
        argv: &[String],
        env: &HashMap<String, String>,
    ) -> Result<RunnerHandles, String>;
}

/// A deterministic in-memory runner used by tests: "direct" but through the
/// trait seam, with observable cancellation.
pub struct MockRunner {
    pub cwd_hint: Option<PathBuf>,
}

impl RestrictedRunner for MockRunner {
    fn run(
        &self,
        ctx: &CancellationToken,
        argv0: &str,
        argv: &[String],
        env: &HashMap<String, String>,
    ) -> Result<RunnerHandles, String> {
        let mut cmd = tokio::process::Command::new(argv0);
        cmd.args(argv)
            .envs(env)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| e.to_string())?;
        let stdin = child.stdin.take().expect("stdin piped");
        let stdout = child.stdout.take().expect("stdout piped");
        let stderr = child.stderr.take().expect("stderr piped");

        let ctx = ctx.clone();
        let wait = Box::pin(async move {
            tokio::select! {
                _ = ctx.cancelled() => {
                    let _ = child.kill().await;
                    let _ = child.wait().await;
                    Ok(())
                }
                status = child.wait() => {
                    status.map(|_| ())
                }
            }
        });

        Ok(RunnerHandles {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            wait,
        })
    }
}
