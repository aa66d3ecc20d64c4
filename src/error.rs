//! The public error taxonomy for the agent-session subsystem.
//!
//! One variant per origin component (tokenizer, supervisor, filter/decoder,
//! controller, FS mediator, session manager). Library code returns
//! `MittoError` (or a narrower `Result<T, MittoError>` alias); `anyhow` is
//! reserved for the demo binary's outermost boundary.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MittoError>;

/// Errors produced by the command tokenizer.
#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("agent command is empty")]
    EmptyCommand,
    #[error("could not parse command: unclosed quote or trailing escape")]
    ParseError,
}

/// Errors produced by the process supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to spawn agent process: {0}")]
    SpawnFailed(#[source] std::io::Error),
    #[error("failed to acquire stdio pipe for agent process")]
    PipeError,
    #[error("restricted runner failed to start: {0}")]
    RunnerStartFailed(String),
}

/// Errors produced by the JSON-line filter / ACP decoder boundary.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("line exceeded the {0}-byte cap without a terminating newline")]
    LineTooLong(usize),
    #[error("I/O error while reading agent stdout: {0}")]
    Io(#[source] std::io::Error),
    #[error("failed to decode ACP frame: {0}")]
    Decode(String),
}

/// Errors produced by the connection controller.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("ACP initialize failed: {0}")]
    InitializeFailed(String),
    #[error("ACP new_session failed: {0}")]
    NewSessionFailed(String),
    #[error("ACP prompt failed: {0}")]
    PromptFailed(String),
    #[error("operation was cancelled")]
    Cancelled,
    #[error("connection is closed")]
    ConnectionClosed,
}

/// Errors produced by the filesystem mediator. These are also the
/// shape returned to the agent as a protocol error reply — never fatal to
/// the session.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("path is not absolute: {0}")]
    RelativePath(PathBuf),
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors produced by the session manager.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a prompt is already in flight for this session")]
    Busy,
    #[error("connection is closed")]
    ConnectionClosed,
    #[error("operation was cancelled")]
    Cancelled,
}

/// The union of every taxonomy kind, for callers that want one error type
/// across the whole subsystem (e.g. `WorkspaceSpec` construction, the demo
/// binary).
#[derive(Debug, Error)]
pub enum MittoError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl MittoError {
    /// `true` for errors the spec classifies as expected/not worth logging
    /// at error level: cancellation is an expected outcome, not a fault.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            MittoError::Connection(ConnectionError::Cancelled)
                | MittoError::Session(SessionError::Cancelled)
        )
    }
}
