//! Launching the pipeline process and forwarding its output to the log.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::error::{PipelineError, Result};
use crate::settings::ResolvedCommand;
use crate::types::{RunId, RunOutcome};

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Run `cmd` to completion and describe how it exited.
///
/// stdout and stderr are drained by two independent tasks; each line is
/// logged as soon as it arrives, so the two streams interleave freely in the
/// log while each keeps its own order. Both readers are joined before this
/// returns, so every line is logged before the exit code.
///
/// The child is killed if this future is dropped before it exits, so the
/// process never outlives the run that owns the lock.
pub async fn run_to_exit(run_id: &RunId, cmd: &ResolvedCommand) -> Result<RunOutcome> {
    info!(
        run_id = %run_id,
        "starting process: {} {}",
        cmd.program.display(),
        cmd.script.display()
    );

    let mut child = Command::new(&cmd.program)
        .arg(&cmd.script)
        .current_dir(&cmd.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| PipelineError::Launch {
            program: cmd.program.display().to_string(),
            source,
        })?;

    let stdout = child
        .stdout
        .take()
        .map(|out| tokio::spawn(forward_lines(run_id.clone(), out, Stream::Stdout)));
    let stderr = child
        .stderr
        .take()
        .map(|err| tokio::spawn(forward_lines(run_id.clone(), err, Stream::Stderr)));

    let status = child.wait().await.map_err(PipelineError::Wait)?;

    let stdout_lines = join_reader(stdout).await;
    let stderr_lines = join_reader(stderr).await;

    info!(
        run_id = %run_id,
        exit_code = ?status.code(),
        "pipeline process finished"
    );
    Ok(RunOutcome::Exited {
        exit_code: status.code(),
        stdout_lines,
        stderr_lines,
    })
}

async fn join_reader(handle: Option<tokio::task::JoinHandle<u64>>) -> u64 {
    match handle {
        Some(h) => h.await.unwrap_or_else(|e| {
            warn!(error = %e, "output reader task failed");
            0
        }),
        None => 0,
    }
}

/// Log every line of `reader` until EOF. Returns the number of lines seen.
///
/// Invalid UTF-8 is replaced rather than ending the stream.
async fn forward_lines<R>(run_id: RunId, reader: R, stream: Stream) -> u64
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);
                count += 1;
                match stream {
                    Stream::Stdout => info!(run_id = %run_id, stream = "stdout", "{line}"),
                    Stream::Stderr => error!(run_id = %run_id, stream = "stderr", "{line}"),
                }
            }
            Err(e) => {
                warn!(run_id = %run_id, stream = ?stream, error = %e, "stopped reading pipeline output");
                break;
            }
        }
    }
    count
}
