// src/exec/compose.rs

//! `docker-compose up` as an executor backend.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RunnerSettings;
use crate::exec::backend::{BoxFuture, ExecutorBackend, ToolOutput};
use crate::types::NO_EXIT_STATUS;

/// Arguments passed after `-f <file>`.
pub const UP_ARGS: [&str; 5] = [
    "up",
    "--force-recreate",
    "--no-build",
    "--abort-on-container-exit",
    "--remove-orphans",
];

/// How long the process group gets after SIGTERM before SIGKILL.
pub const TERM_GRACE: Duration = Duration::from_secs(5);

type SharedLog = Arc<Mutex<String>>;

/// Runs the configured compose command against a topology file.
#[derive(Debug, Clone)]
pub struct ComposeBackend {
    command: Vec<String>,
}

impl ComposeBackend {
    /// `command` is the program followed by any fixed leading arguments,
    /// e.g. `["docker", "compose"]`.
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn from_settings(settings: &RunnerSettings) -> Self {
        Self::new(settings.compose_command.clone())
    }
}

impl ExecutorBackend for ComposeBackend {
    fn run_topology(
        &self,
        topology_file: PathBuf,
        cancel: CancellationToken,
    ) -> BoxFuture<Result<ToolOutput>> {
        let command = self.command.clone();
        Box::pin(async move { run_compose(&command, &topology_file, cancel).await })
    }
}

fn build_command(command: &[String], topology_file: &Path) -> Result<Command> {
    let (program, leading) = command
        .split_first()
        .context("compose command is empty")?;

    let mut cmd = Command::new(program);
    cmd.args(leading)
        .arg("-f")
        .arg(topology_file)
        .args(UP_ARGS)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group so cancellation reaches everything compose spawned.
    #[cfg(unix)]
    cmd.process_group(0);

    Ok(cmd)
}

async fn run_compose(
    command: &[String],
    topology_file: &Path,
    cancel: CancellationToken,
) -> Result<ToolOutput> {
    let mut cmd = build_command(command, topology_file)?;
    info!(
        topology = %topology_file.display(),
        program = %command.join(" "),
        "starting orchestration tool"
    );

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning '{}'", command.join(" ")))?;

    let log = SharedLog::default();
    let readers: Vec<JoinHandle<()>> = [
        child.stdout.take().map(|s| spawn_reader(s, log.clone())),
        child.stderr.take().map(|s| spawn_reader(s, log.clone())),
    ]
    .into_iter()
    .flatten()
    .collect();

    tokio::select! {
        status = child.wait() => {
            let status = status.context("waiting for orchestration tool")?;
            for reader in readers {
                let _ = reader.await;
            }
            let code = status.code().unwrap_or(NO_EXIT_STATUS);
            info!(exit_code = code, success = status.success(), "orchestration tool exited");
            Ok(ToolOutput {
                status: code,
                log: take_log(&log),
            })
        }
        _ = cancel.cancelled() => {
            warn!(topology = %topology_file.display(), "cancelled; terminating orchestration tool");
            terminate(&mut child).await;
            for reader in readers {
                reader.abort();
            }
            bail!("orchestration tool cancelled")
        }
    }
}

/// Drains `stream` into `log` until EOF. Bytes that are not UTF-8 are
/// replaced rather than ending the read, so the tool never sees a closed pipe.
fn spawn_reader<R>(stream: R, log: SharedLog) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&raw);
                    let line = text.trim_end_matches('\n').trim_end_matches('\r');
                    debug!("tool: {}", line);
                    let mut buf = log.lock().unwrap_or_else(|p| p.into_inner());
                    buf.push_str(line);
                    buf.push('\n');
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(error = %err, "reading tool output failed");
                    break;
                }
            }
        }
    })
}

fn take_log(log: &SharedLog) -> String {
    std::mem::take(&mut *log.lock().unwrap_or_else(|p| p.into_inner()))
}

#[cfg(unix)]
async fn terminate(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(id) = child.id() else {
        return;
    };
    let group = Pid::from_raw(id as i32);

    let _ = killpg(group, Signal::SIGTERM);
    if tokio::time::timeout(TERM_GRACE, child.wait()).await.is_err() {
        debug!(pgid = id, "grace period elapsed; sending SIGKILL");
    }
    let _ = killpg(group, Signal::SIGKILL);
    let _ = child.kill().await;
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child) {
    let _ = tokio::time::timeout(TERM_GRACE, child.kill()).await;
}
