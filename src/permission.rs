//! Permission resolver.
//!
//! The auto-approve path scans options in order, preferring an `AllowOnce`
//! or `AllowAlways` option, falling back to the first option otherwise, and
//! returning `cancelled` on an empty list — deterministic and total. The
//! interactive path prints a numbered menu and reads a selection from
//! stdin, racing a background reader against cancellation.

use std::io::BufRead;
use std::sync::mpsc;

/// One selectable option in a permission request, as presented to this
/// resolver (a minimal projection of the ACP `PermissionOption`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Option_ {
    pub option_id: String,
    pub kind: OptionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    AllowOnce,
    AllowAlways,
    RejectOnce,
    RejectAlways,
}

/// Outcome of resolving a permission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Selected(String),
    Cancelled,
}

/// Deterministic, total auto-approve policy: the first `allow-once` or `allow-always` option wins; failing that, the
/// first option of any kind; an empty list is `cancelled`.
pub fn auto_approve(options: &[Option_]) -> Outcome {
    if let Some(allow) = options
        .iter()
        .find(|o| matches!(o.kind, OptionKind::AllowOnce | OptionKind::AllowAlways))
    {
        return Outcome::Selected(allow.option_id.clone());
    }
    match options.first() {
        Some(first) => Outcome::Selected(first.option_id.clone()),
        None => Outcome::Cancelled,
    }
}

/// Render the numbered menu text for the interactive path.
pub fn render_menu(title: &str, options: &[Option_]) -> String {
    let mut lines = vec![format!("Permission requested: {title}")];
    for (i, opt) in options.iter().enumerate() {
        lines.push(format!("  {}) {} [{:?}]", i + 1, opt.option_id, opt.kind));
    }
    lines.push("Select an option by number:".to_string());
    lines.join("\n")
}

/// Parse one line of interactive input against `options`. `None` means the
/// input was unparseable or out of range and the caller should reprompt.
pub fn parse_selection(line: &str, options: &[Option_]) -> Option<String> {
    let index: usize = line.trim().parse().ok()?;
    if index == 0 || index > options.len() {
        return None;
    }
    Some(options[index - 1].option_id.clone())
}

/// Drive the interactive path against `reader` (the host's stdin, or a
/// substitute in tests), printing prompts via `notice` and reprompting on
/// unparseable or out-of-range input, until a selection is made or the
/// reader reaches EOF (which yields [`Outcome::Cancelled`]).
///
/// A caller races this against a cancellation signal by running it on a
/// dedicated reader task/thread; this function is the synchronous core the
/// task loops on.
pub fn interactive<R: BufRead>(
    title: &str,
    options: &[Option_],
    mut reader: R,
    notice: &dyn Fn(&str),
) -> Outcome {
    if options.is_empty() {
        return Outcome::Cancelled;
    }
    notice(&render_menu(title, options));
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return Outcome::Cancelled, // EOF
            Ok(_) => {
                if let Some(id) = parse_selection(&line, options) {
                    return Outcome::Selected(id);
                }
                notice("Invalid selection, try again:");
            }
            Err(_) => return Outcome::Cancelled,
        }
    }
}

/// A cancellation-aware variant used by the connection controller: runs
/// [`interactive`] on a background thread and races it against `cancel_rx`.
/// If `cancel_rx` fires first, the outcome is [`Outcome::Cancelled`] and the
/// reader thread is left to exit naturally on its next EOF or newline —
/// cancellation must never hold stdin hostage.
pub fn interactive_cancellable<R>(
    title: String,
    options: Vec<Option_>,
    reader: R,
    notice: std::sync::Arc<dyn Fn(&str) + Send + Sync>,
    cancel_rx: mpsc::Receiver<()>,
) -> Outcome
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let outcome = interactive(&title, &options, reader, &|s| notice(s));
        let _ = tx.send(outcome);
    });

    loop {
        if cancel_rx.try_recv().is_ok() {
            return Outcome::Cancelled;
        }
        match rx.recv_timeout(std::time::Duration::from_millis(20)) {
            Ok(outcome) => return outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return Outcome::Cancelled,
        }
    }
}
