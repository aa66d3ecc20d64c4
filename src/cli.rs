//! CLI argument parsing. A `clap::Parser` struct for the one workspace this
//! demo binary drives: `mitto <agent-command> --cwd <dir> [--auto-approve]
//! [--runner sandbox-exec] [--env KEY=VALUE]...`.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;

/// Drives one ACP agent session from a terminal.
#[derive(Parser, Debug)]
#[command(name = "mitto", version, about, long_about = None)]
pub struct Args {
    /// Shell-style command used to launch the agent, e.g. "claude-code-acp".
    #[arg(value_name = "AGENT_COMMAND")]
    pub agent_command: String,

    /// Working directory handed to the agent as its session cwd.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub cwd: PathBuf,

    /// Auto-approve every permission request instead of prompting.
    #[arg(long)]
    pub auto_approve: bool,

    /// Restricted-runner name to use instead of direct spawn (e.g. "sandbox-exec").
    #[arg(long, value_name = "NAME", env = "MITTO_RUNNER")]
    pub runner: Option<String>,

    /// Environment overlay entries, `KEY=VALUE`, may be repeated.
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse the repeated `--env KEY=VALUE` entries into a map. Malformed
    /// entries (missing `=`) are reported by key position in the error.
    pub fn parse_env(&self) -> Result<HashMap<String, String>, String> {
        let mut map = HashMap::new();
        for (i, entry) in self.env.iter().enumerate() {
            match entry.split_once('=') {
                Some((k, v)) => {
                    map.insert(k.to_string(), v.to_string());
                }
                None => return Err(format!("--env entry {i} ('{entry}') is not KEY=VALUE")),
            }
        }
        Ok(map)
    }
}
