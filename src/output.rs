//! Output sink: a single-argument callable receiving human-readable lines.
//!
//! Plain `println!`/`eprintln!` with `colored` for warnings and errors, no
//! TUI layer — there is no embedded terminal UI in scope here.

use std::sync::Arc;

use colored::Colorize;

/// A sink that receives one human-readable line at a time. `Send + Sync`
/// so it can be shared across the background tasks that make up a
/// connection (stderr drain, stdin reader, notification dispatch).
pub type OutputSink = Arc<dyn Fn(&str) + Send + Sync>;

/// The default sink: plain stdout, one line per call.
pub fn stdout_sink() -> OutputSink {
    Arc::new(|line: &str| println!("{line}"))
}

/// A sink that discards everything — useful in tests that don't care about
/// notices.
pub fn null_sink() -> OutputSink {
    Arc::new(|_: &str| {})
}

/// Marker prefixed to an agent's thought chunks.
const THOUGHT_MARKER: &str = "\u{1F4AD}"; // 💭

pub fn agent_message(sink: &OutputSink, text: &str) {
    sink(text);
}

pub fn agent_thought(sink: &OutputSink, text: &str) {
    sink(&format!("{THOUGHT_MARKER} {text}"));
}

pub fn tool_call_status(sink: &OutputSink, id: &str, title: &str, status: &str) {
    sink(&format!("[tool] {title} ({id}) — {status}"));
}

pub fn plan_marker(sink: &OutputSink) {
    sink(&"[plan updated]".dimmed().to_string());
}

pub fn connection_up(sink: &OutputSink) {
    sink(&"connected".green().to_string());
}

pub fn cancellation_notice(sink: &OutputSink) {
    sink(&"cancelled".yellow().to_string());
}

pub fn fatal_error(sink: &OutputSink, message: &str) {
    sink(&message.red().to_string());
}

pub fn transient_error(sink: &OutputSink, message: &str) {
    sink(&message.yellow().to_string());
}

pub fn write_notice(sink: &OutputSink, bytes: usize, path: &str) {
    sink(&format!("Wrote {bytes} bytes to {path}"));
}
