//! Process execution with merged output capture
//!
//! The downloader interleaves progress lines on stdout with diagnostics on
//! stderr. Both pipes are read concurrently and funnelled through one channel
//! so the captured text keeps the order in which lines arrived, while each
//! line is echoed to the console as soon as it is read.

use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::core::error::{AppError, AppResult};

/// Captured result of one external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// stdout and stderr merged in arrival order
    pub combined_output: String,
    /// Exit code; `-1` when the process was killed by a signal
    pub exit_code: i32,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs `program args..` inside `cwd`, capturing merged output.
///
/// A non-zero exit code is returned as data. Only a failure to spawn the
/// process or to read its pipes is an error.
pub async fn run_captured(program: &str, args: &[String], cwd: &Path, echo: bool) -> AppResult<ProcessResult> {
    log::debug!("Running {} {:?} in {}", program, args, cwd.display());

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AppError::Process(format!("Failed to start '{}': {}", program, e)))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Process("stdout pipe was not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::Process("stderr pipe was not captured".to_string()))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let out_task = tokio::spawn(pump_lines(stdout, tx.clone()));
    let err_task = tokio::spawn(pump_lines(stderr, tx));

    let mut combined_output = String::new();
    let mut echo = echo;
    while let Some(line) = rx.recv().await {
        if echo {
            echo = echo_line(&mut std::io::stdout().lock(), &line, program);
        }
        combined_output.push_str(&line);
    }

    for task in [out_task, err_task] {
        task.await
            .map_err(|e| AppError::Process(format!("Output reader task failed: {}", e)))??;
    }

    let status = child.wait().await?;
    let exit_code = status.code().unwrap_or(-1);
    log::debug!("{} exited with code {}", program, exit_code);

    Ok(ProcessResult {
        combined_output,
        exit_code,
    })
}

/// Writes `line` to `out`. Returns `false` once the console stops accepting
/// output (closed stdout), after which echoing is skipped.
fn echo_line(out: &mut impl Write, line: &str, program: &str) -> bool {
    match out.write_all(line.as_bytes()).and_then(|_| out.flush()) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("Stopped echoing {} output: {}", program, e);
            false
        }
    }
}

/// Forwards every line (terminator included) from `reader` into `tx`.
async fn pump_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        if tx.send(String::from_utf8_lossy(&buf).into_owned()).is_err() {
            break;
        }
    }
    Ok(())
}
