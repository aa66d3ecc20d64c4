//! JSON-line filter.
//!
//! Wraps an agent's raw stdout and yields only lines that, after stripping
//! leading whitespace, begin with `{`. Everything else — ANSI escape
//! sequences, box-drawing banners, usage text emitted by a confused or
//! crashed agent — is dropped so the downstream ACP decoder never desyncs.
//!
//! A `spawn_local` background task owns the raw byte stream and republishes
//! the accepted subset through an in-memory pipe, keeping the filter purely
//! byte-oriented and ignorant of RPC structure.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, DuplexStream};

use crate::error::FilterError;

/// Initial reservation for the line-accumulation buffer.
const INITIAL_BUF_CAPACITY: usize = 1024 * 1024;
/// Hard cap on a single line before it is reported as `LineTooLong`.
const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;
/// Chunk size for each raw read from the underlying stream.
const READ_CHUNK: usize = 8 * 1024;
/// Capacity of the in-memory pipe feeding the downstream decoder.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Outcome of classifying one raw line (without its trailing newline).
#[derive(Debug, PartialEq, Eq)]
pub enum LineVerdict {
    /// The line, after stripping leading whitespace, begins with `{`.
    Json,
    /// Every other non-empty line — dropped, logged at debug level.
    Filtered,
    /// Blank or whitespace-only — dropped silently.
    Blank,
}

/// Classify a single line. Pure; no I/O, no logging — the thing tests pin
/// directly.
pub fn classify(line: &str) -> LineVerdict {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        LineVerdict::Blank
    } else if trimmed.starts_with('{') {
        LineVerdict::Json
    } else {
        LineVerdict::Filtered
    }
}

/// Truncate a filtered line for logging to roughly 200 characters.
fn truncate_for_log(line: &str) -> String {
    const MAX_LOG_CHARS: usize = 200;
    if line.chars().count() <= MAX_LOG_CHARS {
        line.to_string()
    } else {
        let truncated: String = line.chars().take(MAX_LOG_CHARS).collect();
        format!("{truncated}...")
    }
}

/// Spawn a background task that drains `raw`, filters its lines, and writes
/// the accepted subset (each followed by a single `\n`) into one end of an
/// in-memory pipe. The returned [`DuplexStream`] is handed to the ACP
/// decoder in place of the agent's raw stdout; the [`tokio::task::JoinHandle`]
/// resolves with `Err(FilterError::LineTooLong)` if a line exceeds the hard
/// cap, or `Err(FilterError::Io)` on a read error, and `Ok(())` on clean EOF.
///
/// Must be called from within a `tokio::task::LocalSet` — consistent with
/// every other background reader in this crate, since the connection
/// controller that owns this stream runs entirely inside one LocalSet.
pub fn spawn_filtered<R>(raw: R) -> (DuplexStream, tokio::task::JoinHandle<Result<(), FilterError>>)
where
    R: AsyncRead + Unpin + 'static,
{
    let (mut writer_side, reader_side) = tokio::io::duplex(PIPE_CAPACITY);

    let handle = tokio::task::spawn_local(async move {
        let mut raw = raw;
        let mut line_buf: Vec<u8> = Vec::with_capacity(INITIAL_BUF_CAPACITY.min(READ_CHUNK * 4));
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = raw.read(&mut chunk).await.map_err(FilterError::Io)?;
            if n == 0 {
                // EOF: flush whatever remains as a final (newline-less) line.
                if !line_buf.is_empty() {
                    process_line(&line_buf, &mut writer_side).await?;
                }
                break;
            }

            let mut start = 0;
            for i in 0..n {
                if chunk[i] == b'\n' {
                    line_buf.extend_from_slice(&chunk[start..i]);
                    process_line(&line_buf, &mut writer_side).await?;
                    line_buf.clear();
                    start = i + 1;
                }
            }
            line_buf.extend_from_slice(&chunk[start..n]);

            if line_buf.len() > MAX_LINE_BYTES {
                return Err(FilterError::LineTooLong(MAX_LINE_BYTES));
            }
        }

        Ok(())
    });

    (reader_side, handle)
}

async fn process_line(
    raw_line: &[u8],
    writer: &mut tokio::io::DuplexStream,
) -> Result<(), FilterError> {
    let text = String::from_utf8_lossy(raw_line);
    match classify(&text) {
        LineVerdict::Json => {
            writer.write_all(raw_line).await.map_err(FilterError::Io)?;
            writer.write_all(b"\n").await.map_err(FilterError::Io)?;
        }
        LineVerdict::Filtered => {
            tracing::debug!(line = %truncate_for_log(&text), "filtered non-JSON line from agent stdout");
        }
        LineVerdict::Blank => {}
    }
    Ok(())
}
