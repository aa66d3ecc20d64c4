//! Terminal stub.
//!
//! This host is not in the business of running a shell on the user's
//! behalf, so every terminal RPC here returns a deterministic, neutral
//! answer instead of spawning a real subprocess. An agent that calls
//! `terminal/create` gets back a handle; every other call against that
//! handle reports "nothing happened, nothing is running."

use std::collections::HashSet;

use agent_client_protocol::TerminalExitStatus;

/// Tracks which terminal ids have been created (and not yet released), so
/// that operations against an unknown id can be told apart from a real one.
#[derive(Debug, Default)]
pub struct TerminalStub {
    next_id: u64,
    live: HashSet<String>,
}

/// Outcome of a terminal RPC against an id this stub never created.
#[derive(Debug, PartialEq, Eq)]
pub struct UnknownTerminal;

impl TerminalStub {
    pub fn new() -> Self {
        Self::default()
    }

    /// `terminal/create`. Always succeeds with a freshly minted id; no
    /// process is actually started.
    pub fn create(&mut self) -> String {
        self.next_id += 1;
        let id = format!("term-{}", self.next_id);
        self.live.insert(id.clone());
        id
    }

    /// `terminal/output`. Empty output, not truncated, no exit status — the
    /// stub never produces any bytes because it never runs anything.
    pub fn output(&self, terminal_id: &str) -> Result<StubOutput, UnknownTerminal> {
        self.require_live(terminal_id)?;
        Ok(StubOutput {
            output: String::new(),
            truncated: false,
            exit_status: None,
        })
    }

    /// `terminal/wait_for_exit`. Reports immediate, successful completion —
    /// there is nothing to wait for.
    pub fn wait_for_exit(&self, terminal_id: &str) -> Result<TerminalExitStatus, UnknownTerminal> {
        self.require_live(terminal_id)?;
        Ok(TerminalExitStatus {
            exit_code: Some(0),
            signal: None,
        })
    }

    /// `terminal/kill`. A no-op against a live id; nothing was running.
    pub fn kill(&self, terminal_id: &str) -> Result<(), UnknownTerminal> {
        self.require_live(terminal_id)
    }

    /// `terminal/release`. Frees the id; subsequent operations against it
    /// report [`UnknownTerminal`].
    pub fn release(&mut self, terminal_id: &str) -> Result<(), UnknownTerminal> {
        self.require_live(terminal_id)?;
        self.live.remove(terminal_id);
        Ok(())
    }

    fn require_live(&self, terminal_id: &str) -> Result<(), UnknownTerminal> {
        if self.live.contains(terminal_id) {
            Ok(())
        } else {
            Err(UnknownTerminal)
        }
    }
}

/// Response payload for `terminal/output`.
#[derive(Debug, PartialEq, Eq)]
pub struct StubOutput {
    pub output: String,
    pub truncated: bool,
    pub exit_status: Option<TerminalExitStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_yields_distinct_ids() {
        let mut stub = TerminalStub::new();
        let a = stub.create();
        let b = stub.create();
        assert_ne!(a, b);
    }

    #[test]
    fn output_against_live_id_is_empty_and_not_truncated() {
        let mut stub = TerminalStub::new();
        let id = stub.create();
        let out = stub.output(&id).unwrap();
        assert_eq!(out.output, "");
        assert!(!out.truncated);
        assert_eq!(out.exit_status, None);
    }

    #[test]
    fn wait_for_exit_reports_immediate_success() {
        let mut stub = TerminalStub::new();
        let id = stub.create();
        let status = stub.wait_for_exit(&id).unwrap();
        assert_eq!(status.exit_code, Some(0));
        assert_eq!(status.signal, None);
    }

    #[test]
    fn kill_against_live_id_succeeds() {
        let mut stub = TerminalStub::new();
        let id = stub.create();
        assert!(stub.kill(&id).is_ok());
    }

    #[test]
    fn operations_against_unknown_id_fail() {
        let stub = TerminalStub::new();
        assert_eq!(stub.output("term-999"), Err(UnknownTerminal));
        assert_eq!(stub.wait_for_exit("term-999"), Err(UnknownTerminal));
        assert_eq!(stub.kill("term-999"), Err(UnknownTerminal));
    }

    #[test]
    fn release_then_reuse_is_unknown() {
        let mut stub = TerminalStub::new();
        let id = stub.create();
        stub.release(&id).unwrap();
        assert_eq!(stub.output(&id), Err(UnknownTerminal));
        assert_eq!(stub.release(&id), Err(UnknownTerminal));
    }
}
