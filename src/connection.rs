//! Connection controller.
//!
//! Owns the process supervisor and the client endpoint; wraps the agent's
//! raw stdout through the JSON-line filter; drives the ACP transport
//! through an explicit state machine instead of one long function: spawn,
//! then `initialize`, `new_session`, `prompt`, and `close` are each a
//! separate method the session manager calls, enforcing the
//! `Created → Initialized → Sessioned → Prompting → Closed` progression
//! explicitly rather than leaving it implied by control flow.

use std::path::PathBuf;
use std::rc::Rc;

use agent_client_protocol::{
    CancelNotification, Client as _, ClientCapabilities, ClientSideConnection, ContentBlock,
    FileSystemCapability, Implementation, InitializeRequest, NewSessionRequest, PromptRequest,
    ProtocolVersion, SessionId, StopReason,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::compat::{TokioAsyncReadCompatExt, TokioAsyncWriteCompatExt};
use tokio_util::sync::CancellationToken;

use crate::client::ClientEndpoint;
use crate::error::ConnectionError;
use crate::json_filter;
use crate::output::OutputSink;
use crate::process::{RestrictedRunner, Supervised};
use crate::session::SessionUpdateEvent;

/// The connection's lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Created,
    Initialized,
    Sessioned,
    Prompting,
    Closed,
}

/// Everything the connection needs once it is torn down or driving a
/// request; kept behind `Option` so `close()` can be idempotent and cheap
/// on a repeat call.
struct Live {
    process: Supervised,
    conn: ClientSideConnection,
    endpoint: Rc<ClientEndpoint>,
    io_handle: tokio::task::JoinHandle<()>,
    filter_handle: tokio::task::JoinHandle<Result<(), crate::error::FilterError>>,
}

/// Owns one ACP connection end-to-end.
pub struct ConnectionController {
    state: State,
    live: Option<Live>,
    session_id: Option<SessionId>,
    cwd: PathBuf,
    allow_terminal: bool,
    allow_write: bool,
}

impl ConnectionController {
    /// Spawn the agent (direct mode) and wrap its stdio. Construction does
    /// not yet speak ACP — call [`initialize`](Self::initialize) next.
    pub fn spawn_direct(
        program: &str,
        args: &[String],
        env: &std::collections::HashMap<String, String>,
        cwd: PathBuf,
        allow_terminal: bool,
        allow_write: bool,
        allowed_write_paths: Option<Vec<PathBuf>>,
        output: OutputSink,
        updates: UnboundedSender<SessionUpdateEvent>,
        auto_approve: bool,
    ) -> Result<Self, ConnectionError> {
        let process = crate::process::spawn_direct(program, args, env, Some(&cwd))
            .map_err(|e| ConnectionError::InitializeFailed(e.to_string()))?;

        Self::from_process(
            process,
            cwd,
            allow_terminal,
            allow_write,
            allowed_write_paths,
            output,
            updates,
            auto_approve,
        )
    }

    /// Spawn the agent under a [`RestrictedRunner`] instead of a direct
    /// `tokio::process::Child`. Everything past construction (initialize,
    /// new_session, prompt, close) is identical to direct mode.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_restricted(
        runner: &dyn RestrictedRunner,
        program: &str,
        args: &[String],
        env: &std::collections::HashMap<String, String>,
        cwd: PathBuf,
        allow_terminal: bool,
        allow_write: bool,
        allowed_write_paths: Option<Vec<PathBuf>>,
        output: OutputSink,
        updates: UnboundedSender<SessionUpdateEvent>,
        auto_approve: bool,
    ) -> Result<Self, ConnectionError> {
        let process = crate::process::spawn_restricted(runner, program, args, env, Some(&cwd), &output)
            .map_err(|e| ConnectionError::InitializeFailed(e.to_string()))?;

        Self::from_process(
            process,
            cwd,
            allow_terminal,
            allow_write,
            allowed_write_paths,
            output,
            updates,
            auto_approve,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn from_process(
        process: Supervised,
        cwd: PathBuf,
        allow_terminal: bool,
        allow_write: bool,
        allowed_write_paths: Option<Vec<PathBuf>>,
        output: OutputSink,
        updates: UnboundedSender<SessionUpdateEvent>,
        auto_approve: bool,
    ) -> Result<Self, ConnectionError> {
        let (filtered_stdout, filter_handle) = json_filter::spawn_filtered(process.stdout);

        let endpoint = Rc::new(ClientEndpoint::new(
            output,
            updates,
            auto_approve,
            allowed_write_paths,
        ));
        let endpoint_handle = endpoint.clone();

        let outgoing = process.stdin.compat_write();
        let incoming = filtered_stdout.compat();

        let (conn, io_future) =
            ClientSideConnection::new(endpoint, outgoing, incoming, |fut| {
                tokio::task::spawn_local(fut);
            });

        let io_handle = tokio::task::spawn_local(async move {
            let _ = io_future.await;
        });

        Ok(Self {
            state: State::Created,
            live: Some(Live {
                process,
                conn,
                endpoint: endpoint_handle,
                io_handle,
                filter_handle,
            }),
            session_id: None,
            cwd,
            allow_terminal,
            allow_write,
        })
    }

    fn live(&self) -> Result<&Live, ConnectionError> {
        if self.state == State::Closed {
            return Err(ConnectionError::ConnectionClosed);
        }
        self.live.as_ref().ok_or(ConnectionError::ConnectionClosed)
    }

    /// `initialize(ctx)`. Sends the fixed protocol version plus fs read/write
    /// and terminal capabilities. Fatal on error.
    pub async fn initialize(&mut self) -> Result<(), ConnectionError> {
        if self.state != State::Created {
            return Err(ConnectionError::ConnectionClosed);
        }
        let live = self.live()?;

        let fs_caps = FileSystemCapability::new()
            .read_text_file(true)
            .write_text_file(self.allow_write);
        let caps = ClientCapabilities::new()
            .fs(fs_caps)
            .terminal(self.allow_terminal);
        let client_info = Implementation::new("mitto", env!("CARGO_PKG_VERSION"));
        let req = InitializeRequest::new(ProtocolVersion::LATEST)
            .client_capabilities(caps)
            .client_info(client_info);

        live.conn.initialize(req).await.map_err(|e| {
            tracing::error!(error = %e, "initialize failed");
            ConnectionError::InitializeFailed(e.to_string())
        })?;

        tracing::info!("connection initialized");
        self.state = State::Initialized;
        Ok(())
    }

    /// `new_session(ctx, cwd)`. Fatal on error.
    pub async fn new_session(&mut self) -> Result<(), ConnectionError> {
        if self.state != State::Initialized {
            return Err(ConnectionError::ConnectionClosed);
        }
        let live = self.live()?;

        let resp = live
            .conn
            .new_session(NewSessionRequest::new(self.cwd.clone()))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "new_session failed");
                ConnectionError::NewSessionFailed(e.to_string())
            })?;

        tracing::info!(session_id = %resp.session_id.0, "session opened");
        self.session_id = Some(resp.session_id);
        self.state = State::Sessioned;
        Ok(())
    }

    /// `prompt(ctx, content_blocks)`. Requires an open session. Racing a
    /// cancellation against the in-flight prompt sends `cancel` but leaves
    /// the connection open for a subsequent prompt. `cancel` is also handed
    /// to the client endpoint so an interactive permission request raised
    /// while this prompt is in flight can be cancelled the same way.
    pub async fn prompt(
        &mut self,
        content_blocks: Vec<ContentBlock>,
        cancel: CancellationToken,
    ) -> Result<StopReason, ConnectionError> {
        if self.state != State::Sessioned && self.state != State::Prompting {
            return Err(ConnectionError::ConnectionClosed);
        }
        let session_id = self
            .session_id
            .clone()
            .ok_or(ConnectionError::ConnectionClosed)?;

        self.state = State::Prompting;
        let live = self.live()?;
        live.endpoint.set_cancel_token(Some(cancel.clone()));

        let req = PromptRequest::new(session_id.clone(), content_blocks);

        let result = tokio::select! {
            result = live.conn.prompt(req) => {
                result.map_err(|e| {
                    tracing::error!(error = %e, "prompt failed");
                    ConnectionError::PromptFailed(e.to_string())
                })
            }
            _ = cancel.cancelled() => {
                tracing::info!("prompt cancelled");
                let _ = live.conn.cancel(CancelNotification::new(session_id)).await;
                Err(ConnectionError::Cancelled)
            }
        };

        live.endpoint.set_cancel_token(None);
        self.state = State::Sessioned;
        result.map(|resp| resp.stop_reason)
    }

    /// Idempotent teardown: cancels/kills the underlying process, aborts
    /// the transport and filter tasks. Safe to call from any state,
    /// including `Closed` (a no-op then).
    pub async fn close(&mut self) {
        if let Some(live) = self.live.take() {
            live.io_handle.abort();
            live.filter_handle.abort();
            live.process.teardown().await;
            tracing::info!("connection closed");
        }
        self.state = State::Closed;
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }
}
