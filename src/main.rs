//! Thin interactive demo binary: opens one workspace, reads prompt lines
//! from stdin, submits them, prints streamed chunks. The entire body runs
//! inside one `LocalSet`, since that's where every `!Send` ACP future in
//! this crate lives.

use std::io::Write as _;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio::task::LocalSet;

use mitto::attachment;
use mitto::cli::Args;
use mitto::output;
use mitto::session::{SequencedUpdate, SessionManager, SessionUpdateEvent};
use mitto::tokenizer;
use mitto::workspace::WorkspaceSpec;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let local = LocalSet::new();
    match local.run_until(run()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    mitto::logging::init();

    let args = Args::parse_args();
    let env = args.parse_env().map_err(anyhow::Error::msg)?;

    if let Some(name) = &args.runner {
        anyhow::bail!(
            "no restricted-runner backend named {name:?} is available; this binary only supports direct spawn"
        );
    }

    let spec = WorkspaceSpec::new(args.agent_command.clone(), args.cwd.clone()).with_env(env);
    let (program, prog_args) =
        tokenizer::tokenize(&spec.agent_command).context("parsing agent command")?;

    let sink = output::stdout_sink();
    let manager = SessionManager::new();
    let session = manager
        .open(
            "default",
            &program,
            &prog_args,
            &spec.env,
            spec.working_dir.clone(),
            spec.restrictions.allow_terminal,
            spec.restrictions.allowed_write_paths.is_none(),
            spec.restrictions.allowed_write_paths.clone(),
            sink.clone(),
            args.auto_approve,
            None,
        )
        .await
        .context("opening session")?;

    output::connection_up(&sink);

    let (_sub_id, mut updates) = session.subscribe();
    let failure_sink = sink.clone();
    tokio::task::spawn_local(async move {
        while let Some(SequencedUpdate { event, .. }) = updates.recv().await {
            if let SessionUpdateEvent::SessionFailed { reason } = event {
                output::fatal_error(&failure_sink, &reason);
            }
        }
    });

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        let blocks = attachment::assemble(line, &[]);
        if let Err(e) = session.prompt(blocks).await {
            output::transient_error(&sink, &e.to_string());
        }
    }

    manager.close("default").await;
    Ok(())
}
