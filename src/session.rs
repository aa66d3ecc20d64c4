//! Session manager.
//!
//! Keyed by workspace id; owns exactly one [`ConnectionController`] per key,
//! serializes prompt submissions (rejecting a second concurrent prompt with
//! `Busy` rather than queueing it), and fans `session_update` notifications
//! out to subscribers with a monotonic, per-session sequence number.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use agent_client_protocol::{ContentBlock, StopReason};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::connection::ConnectionController;
use crate::error::{MittoError, SessionError};
use crate::output::OutputSink;
use crate::process::RestrictedRunner;

/// A structured notification forwarded from the client endpoint, before
/// sequencing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdateEvent {
    AgentMessageChunk(String),
    AgentThoughtChunk(String),
    ToolCall {
        id: String,
        title: String,
        status: String,
    },
    ToolCallUpdate {
        id: String,
        status: String,
    },
    Plan,
    /// Synthetic event this layer injects on fatal connection failure.
    SessionFailed {
        reason: String,
    },
    /// Synthetic event this layer injects on `close()`.
    SessionClosed,
}

/// A [`SessionUpdateEvent`] tagged with its per-session sequence number.
/// Sequence numbers start at 1 and are gap-free and strictly increasing
/// per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedUpdate {
    pub sequence: u64,
    pub event: SessionUpdateEvent,
}

/// Per-subscriber delivery channel. Bounded and non-blocking: a subscriber
/// that can't keep up has events dropped for it
/// rather than stalling the fan-out for everyone else.
const SUBSCRIBER_CAPACITY: usize = 256;

struct Subscriber {
    id: u64,
    tx: mpsc::Sender<SequencedUpdate>,
}

/// One workspace's live session: a connection, its subscriber set, and the
/// bookkeeping needed to enforce "at most one prompt in flight."
pub struct Session {
    connection: Rc<RefCell<ConnectionController>>,
    subscribers: Rc<RefCell<Vec<Subscriber>>>,
    sequence: Rc<Cell<u64>>,
    busy: Cell<bool>,
    cancel_token: RefCell<Option<CancellationToken>>,
    next_subscriber_id: Cell<u64>,
    closed: Cell<bool>,
}

impl Session {
    fn new(connection: ConnectionController) -> Self {
        Self {
            connection: Rc::new(RefCell::new(connection)),
            subscribers: Rc::new(RefCell::new(Vec::new())),
            sequence: Rc::new(Cell::new(0)),
            busy: Cell::new(false),
            cancel_token: RefCell::new(None),
            next_subscriber_id: Cell::new(0),
            closed: Cell::new(false),
        }
    }

    /// Attach a subscriber; returns its id (for later [`unsubscribe`]) and
    /// the receiving end.
    pub fn subscribe(&self) -> (u64, mpsc::Receiver<SequencedUpdate>) {
        let id = self.next_subscriber_id.get();
        self.next_subscriber_id.set(id + 1);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        self.subscribers.borrow_mut().push(Subscriber { id, tx });
        (id, rx)
    }

    pub fn unsubscribe(&self, id: u64) {
        self.subscribers.borrow_mut().retain(|s| s.id != id);
    }

    fn publish(&self, event: SessionUpdateEvent) {
        let sequence = self.sequence.get() + 1;
        self.sequence.set(sequence);
        let update = SequencedUpdate { sequence, event };
        self.subscribers
            .borrow_mut()
            .retain(|s| s.tx.try_send(update.clone()).is_ok() || !s.tx.is_closed());
    }

    /// Submit a prompt. Rejects with [`SessionError::Busy`] if one is
    /// already in flight; otherwise blocks until the agent completes (or
    /// the submission is itself cancelled via the returned handle's
    /// counterpart passed at call time).
    pub async fn prompt(
        &self,
        content_blocks: Vec<ContentBlock>,
    ) -> Result<StopReason, SessionError> {
        if self.closed.get() {
            return Err(SessionError::ConnectionClosed);
        }
        if self.busy.replace(true) {
            tracing::warn!("prompt rejected: a prompt is already in flight");
            return Err(SessionError::Busy);
        }

        let cancel_token = CancellationToken::new();
        *self.cancel_token.borrow_mut() = Some(cancel_token.clone());

        let result = self
            .connection
            .borrow_mut()
            .prompt(content_blocks, cancel_token)
            .await;

        self.cancel_token.borrow_mut().take();
        self.busy.set(false);

        result.map_err(|e| match e {
            crate::error::ConnectionError::Cancelled => SessionError::Cancelled,
            _ => SessionError::ConnectionClosed,
        })
    }

    /// Cancel the in-flight prompt, if any. Delivers an ACP cancel
    /// notification via the connection and causes the pending `prompt()`
    /// call to resolve to `Cancelled`.
    pub fn cancel(&self) {
        if let Some(token) = self.cancel_token.borrow_mut().take() {
            token.cancel();
        }
    }

    /// Idempotent teardown: stop any in-flight prompt, close the
    /// connection, notify subscribers of `session_closed`, drop the
    /// subscriber set.
    pub async fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        tracing::info!("closing session");
        self.cancel();
        self.connection.borrow_mut().close().await;
        self.publish(SessionUpdateEvent::SessionClosed);
        self.subscribers.borrow_mut().clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

/// Owns every live [`Session`], keyed by workspace id.
#[derive(Default)]
pub struct SessionManager {
    sessions: RefCell<HashMap<String, Rc<Session>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) the session for `workspace_id`, spawning the
    /// agent and driving it through `initialize`/`new_session`. `runner`
    /// selects restricted-runner mode when present, direct spawn otherwise.
    /// A prior session under the same key, if any, must be closed by the
    /// caller first — this does not implicitly tear one down.
    #[allow(clippy::too_many_arguments)]
    pub async fn open(
        &self,
        workspace_id: impl Into<String>,
        program: &str,
        args: &[String],
        env: &HashMap<String, String>,
        cwd: PathBuf,
        allow_terminal: bool,
        allow_write: bool,
        allowed_write_paths: Option<Vec<PathBuf>>,
        output: OutputSink,
        auto_approve: bool,
        runner: Option<&dyn RestrictedRunner>,
    ) -> Result<Rc<Session>, MittoError> {
        let (updates_tx, mut updates_rx) = tokio::sync::mpsc::unbounded_channel();

        let mut connection = match runner {
            Some(runner) => ConnectionController::spawn_restricted(
                runner,
                program,
                args,
                env,
                cwd,
                allow_terminal,
                allow_write,
                allowed_write_paths,
                output,
                updates_tx,
                auto_approve,
            )?,
            None => ConnectionController::spawn_direct(
                program,
                args,
                env,
                cwd,
                allow_terminal,
                allow_write,
                allowed_write_paths,
                output,
                updates_tx,
                auto_approve,
            )?,
        };

        if let Err(e) = connection.initialize().await {
            connection.close().await;
            return Err(e.into());
        }
        if let Err(e) = connection.new_session().await {
            connection.close().await;
            return Err(e.into());
        }

        let workspace_id = workspace_id.into();
        tracing::info!(workspace_id = %workspace_id, "session opened");

        let session = Rc::new(Session::new(connection));
        let fanout_session = session.clone();
        tokio::task::spawn_local(async move {
            while let Some(event) = updates_rx.recv().await {
                fanout_session.publish(event);
            }
        });

        self.sessions
            .borrow_mut()
            .insert(workspace_id, session.clone());
        Ok(session)
    }

    pub fn get(&self, workspace_id: &str) -> Option<Rc<Session>> {
        self.sessions.borrow().get(workspace_id).cloned()
    }

    pub async fn close(&self, workspace_id: &str) {
        let session = self.sessions.borrow_mut().remove(workspace_id);
        if let Some(session) = session {
            session.close().await;
        }
    }
}
