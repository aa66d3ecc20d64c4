//! Client endpoint.
//!
//! The host-as-client face of ACP: dispatches session notifications, serves
//! permission/fs/terminal requests, and forwards text to an output sink,
//! delegating the actual work to the `permission`, `fs_mediator`, and
//! `terminal_stub` modules rather than doing it inline.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agent_client_protocol::{
    Client, CreateTerminalRequest, CreateTerminalResponse, Error as AcpError,
    KillTerminalCommandRequest, KillTerminalCommandResponse, PermissionOptionKind,
    ReadTextFileRequest, ReadTextFileResponse, ReleaseTerminalRequest, ReleaseTerminalResponse,
    RequestPermissionOutcome, RequestPermissionRequest, RequestPermissionResponse,
    SelectedPermissionOutcome, SessionNotification, SessionUpdate, TerminalExitStatus,
    TerminalOutputRequest, TerminalOutputResponse, WaitForTerminalExitRequest,
    WaitForTerminalExitResponse, WriteTextFileRequest, WriteTextFileResponse, ContentBlock,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::output::{self, OutputSink};
use crate::permission::{self, OptionKind, Option_, Outcome};
use crate::terminal_stub::TerminalStub;
use crate::{fs_mediator, session::SessionUpdateEvent};

fn content_block_text(block: &ContentBlock) -> Option<&str> {
    match block {
        ContentBlock::Text(t) => Some(&t.text),
        _ => None,
    }
}

/// Mirrors `workspace::SessionRestrictions::allows_write`'s prefix-match
/// rule; duplicated here rather than shared because the endpoint only ever
/// needs the path list, not the rest of the restrictions contract.
fn path_is_writable(allowed: &Option<Vec<PathBuf>>, path: &Path) -> bool {
    match allowed {
        None => true,
        Some(paths) => paths.iter().any(|p| path.starts_with(p)),
    }
}

fn to_resolver_options(req: &RequestPermissionRequest) -> Vec<Option_> {
    req.options
        .iter()
        .map(|opt| Option_ {
            option_id: opt.option_id.0.as_ref().to_string(),
            kind: match opt.kind {
                PermissionOptionKind::AllowOnce => OptionKind::AllowOnce,
                PermissionOptionKind::AllowAlways => OptionKind::AllowAlways,
                PermissionOptionKind::RejectOnce => OptionKind::RejectOnce,
                PermissionOptionKind::RejectAlways => OptionKind::RejectAlways,
            },
        })
        .collect()
}

fn outcome_to_response(outcome: Outcome) -> RequestPermissionResponse {
    let acp_outcome = match outcome {
        Outcome::Selected(id) => {
            RequestPermissionOutcome::Selected(SelectedPermissionOutcome::new(id))
        }
        Outcome::Cancelled => RequestPermissionOutcome::Cancelled,
    };
    RequestPermissionResponse::new(acp_outcome)
}

/// The ACP [`Client`] implementation owned by one connection.
///
/// Holds no session-manager state of its own — only the output sink, the
/// update channel it forwards structured notifications through, the
/// auto-approve flag, the write-path allowlist, the terminal stub's id
/// bookkeeping, and the cancellation token for whichever prompt is
/// currently in flight (if any). Handlers for distinct request ids may run
/// concurrently, so `terminals` and `cancel_token` use `RefCell`, which is
/// sound here because every ACP future driving this client is `!Send` and
/// single-threaded via `LocalSet`.
pub struct ClientEndpoint {
    output: OutputSink,
    updates: UnboundedSender<SessionUpdateEvent>,
    auto_approve: bool,
    allowed_write_paths: Option<Vec<PathBuf>>,
    terminals: RefCell<TerminalStub>,
    cancel_token: RefCell<Option<CancellationToken>>,
}

impl ClientEndpoint {
    pub fn new(
        output: OutputSink,
        updates: UnboundedSender<SessionUpdateEvent>,
        auto_approve: bool,
        allowed_write_paths: Option<Vec<PathBuf>>,
    ) -> Self {
        Self {
            output,
            updates,
            auto_approve,
            allowed_write_paths,
            terminals: RefCell::new(TerminalStub::new()),
            cancel_token: RefCell::new(None),
        }
    }

    /// Set (or clear) the cancellation signal for the prompt currently in
    /// flight, so `request_permission` can race an interactive prompt
    /// against it instead of blocking the executor until the user answers.
    pub fn set_cancel_token(&self, token: Option<CancellationToken>) {
        *self.cancel_token.borrow_mut() = token;
    }
}

#[async_trait::async_trait(?Send)]
impl Client for ClientEndpoint {
    async fn request_permission(
        &self,
        req: RequestPermissionRequest,
    ) -> agent_client_protocol::Result<RequestPermissionResponse> {
        let title = req.tool_call.title.clone().unwrap_or_default();
        let options = to_resolver_options(&req);

        let outcome = if self.auto_approve {
            permission::auto_approve(&options)
        } else {
            let (cancel_tx, cancel_rx) = std::sync::mpsc::channel();
            if let Some(token) = self.cancel_token.borrow().clone() {
                tokio::task::spawn_local(async move {
                    token.cancelled().await;
                    let _ = cancel_tx.send(());
                });
            }

            let output = self.output.clone();
            let notice: Arc<dyn Fn(&str) + Send + Sync> = Arc::new(move |line: &str| output(line));

            // Interactive input is blocking; run it on a dedicated thread so it
            // never stalls the single-threaded executor other sessions share.
            tokio::task::spawn_blocking(move || {
                let stdin = std::io::stdin();
                permission::interactive_cancellable(title, options, stdin.lock(), notice, cancel_rx)
            })
            .await
            .unwrap_or(Outcome::Cancelled)
        };

        Ok(outcome_to_response(outcome))
    }

    async fn session_notification(
        &self,
        notification: SessionNotification,
    ) -> agent_client_protocol::Result<()> {
        match notification.update {
            SessionUpdate::AgentMessageChunk(chunk) => {
                if let Some(text) = content_block_text(&chunk.content) {
                    output::agent_message(&self.output, text);
                    let _ = self
                        .updates
                        .send(SessionUpdateEvent::AgentMessageChunk(text.to_string()));
                }
            }
            SessionUpdate::AgentThoughtChunk(chunk) => {
                if let Some(text) = content_block_text(&chunk.content) {
                    output::agent_thought(&self.output, text);
                    let _ = self
                        .updates
                        .send(SessionUpdateEvent::AgentThoughtChunk(text.to_string()));
                }
            }
            SessionUpdate::ToolCall(tool_call) => {
                let id = tool_call.id.0.as_ref().to_string();
                let title = tool_call.title.clone();
                let status = format!("{:?}", tool_call.status);
                output::tool_call_status(&self.output, &id, &title, &status);
                let _ = self.updates.send(SessionUpdateEvent::ToolCall {
                    id,
                    title,
                    status,
                });
            }
            SessionUpdate::ToolCallUpdate(update) => {
                let id = update.id.0.as_ref().to_string();
                if let Some(status) = update.fields.status {
                    let status = format!("{status:?}");
                    let _ = self
                        .updates
                        .send(SessionUpdateEvent::ToolCallUpdate { id, status });
                }
            }
            SessionUpdate::Plan(_plan) => {
                output::plan_marker(&self.output);
                let _ = self.updates.send(SessionUpdateEvent::Plan);
            }
            _ => {}
        }
        Ok(())
    }

    async fn read_text_file(
        &self,
        req: ReadTextFileRequest,
    ) -> agent_client_protocol::Result<ReadTextFileResponse> {
        let line = req.line.map(|l| l as usize);
        let limit = req.limit.map(|l| l as usize);
        match fs_mediator::read(&req.path, line, limit) {
            Ok(content) => Ok(ReadTextFileResponse::new(content)),
            Err(e) => Err(AcpError::invalid_params().data(serde_json::json!(e.to_string()))),
        }
    }

    async fn write_text_file(
        &self,
        req: WriteTextFileRequest,
    ) -> agent_client_protocol::Result<WriteTextFileResponse> {
        if !path_is_writable(&self.allowed_write_paths, &req.path) {
            return Err(AcpError::invalid_params().data(serde_json::json!(format!(
                "write to {} is outside the allowed write paths",
                req.path.display()
            ))));
        }

        let output = self.output.clone();
        let notice = move |line: &str| output(line);
        match fs_mediator::write(&req.path, &req.content, &notice) {
            Ok(()) => Ok(WriteTextFileResponse::new()),
            Err(e) => Err(AcpError::internal_error().data(serde_json::json!(e.to_string()))),
        }
    }

    async fn create_terminal(
        &self,
        _req: CreateTerminalRequest,
    ) -> agent_client_protocol::Result<CreateTerminalResponse> {
        let id = self.terminals.borrow_mut().create();
        Ok(CreateTerminalResponse::new(
            agent_client_protocol::TerminalId::new(id),
        ))
    }

    async fn terminal_output(
        &self,
        req: TerminalOutputRequest,
    ) -> agent_client_protocol::Result<TerminalOutputResponse> {
        let id = req.terminal_id.0.as_ref().to_string();
        let terminals = self.terminals.borrow();
        match terminals.output(&id) {
            Ok(out) => Ok(TerminalOutputResponse::new(out.output, out.truncated)),
            Err(_) => Err(unknown_terminal(&id)),
        }
    }

    async fn wait_for_terminal_exit(
        &self,
        req: WaitForTerminalExitRequest,
    ) -> agent_client_protocol::Result<WaitForTerminalExitResponse> {
        let id = req.terminal_id.0.as_ref().to_string();
        let terminals = self.terminals.borrow();
        match terminals.wait_for_exit(&id) {
            Ok(status) => Ok(WaitForTerminalExitResponse::new(to_acp_status(status))),
            Err(_) => Err(unknown_terminal(&id)),
        }
    }

    async fn kill_terminal_command(
        &self,
        req: KillTerminalCommandRequest,
    ) -> agent_client_protocol::Result<KillTerminalCommandResponse> {
        let id = req.terminal_id.0.as_ref().to_string();
        let terminals = self.terminals.borrow();
        match terminals.kill(&id) {
            Ok(()) => Ok(KillTerminalCommandResponse::new()),
            Err(_) => Err(unknown_terminal(&id)),
        }
    }

    async fn release_terminal(
        &self,
        req: ReleaseTerminalRequest,
    ) -> agent_client_protocol::Result<ReleaseTerminalResponse> {
        let id = req.terminal_id.0.as_ref().to_string();
        let mut terminals = self.terminals.borrow_mut();
        match terminals.release(&id) {
            Ok(()) => Ok(ReleaseTerminalResponse::new()),
            Err(_) => Err(unknown_terminal(&id)),
        }
    }
}

fn unknown_terminal(id: &str) -> AcpError {
    AcpError::invalid_params().data(serde_json::json!(format!("terminal not found: {id}")))
}

fn to_acp_status(status: TerminalExitStatus) -> TerminalExitStatus {
    status
}
