//! External process execution with a hard wall-clock bound.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len());
        out.push_str(&self.stdout);
        out.push_str(&self.stderr);
        out
    }
}

/// Runs an external program to completion or until `timeout` elapses.
///
/// A non-zero exit is not an error at this layer; the caller inspects
/// [`ProcessOutput::exit_code`]. Elapsed timeouts return [`MediaError::Timeout`]
/// and must leave no process behind.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String], timeout: Duration)
        -> MediaResult<ProcessOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> MediaResult<ProcessOutput> {
        debug!(program, ?args, "Spawning process");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so a timeout can take down ffmpeg children too.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn()?;
        let pid = child.id();
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);
        let readers: Vec<AbortHandle> = [&stdout, &stderr]
            .into_iter()
            .flatten()
            .map(|reader| reader.abort_handle())
            .collect();

        // One deadline covers the exit and both pipe reads.
        let attempt = async {
            let status = child.wait().await?;
            // Leftover group members would keep the pipes open.
            kill_group(pid);
            Ok::<_, std::io::Error>(ProcessOutput {
                exit_code: status.code(),
                stdout: collect(stdout).await,
                stderr: collect(stderr).await,
            })
        };

        let outcome = tokio::time::timeout(timeout, attempt).await;
        match outcome {
            Ok(output) => Ok(output?),
            Err(_) => {
                warn!(program, timeout_secs = timeout.as_secs_f64(), "Process timed out, killing");
                terminate(&mut child, pid).await;
                for reader in readers {
                    reader.abort();
                }
                Err(MediaError::Timeout(timeout))
            }
        }
    }
}

fn drain<R>(mut reader: R) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf).await {
            debug!("Failed to read process output: {}", e);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn collect(reader: Option<JoinHandle<String>>) -> String {
    match reader {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

/// SIGKILL the whole process group led by `pid`.
#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else { return };
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => debug!(pid, "killpg failed: {}", e),
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

async fn terminate(child: &mut Child, pid: Option<u32>) {
    kill_group(pid);

    if let Err(e) = child.kill().await {
        debug!("Failed to kill child: {}", e);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_captures_output_and_exit_code() {
        let output = ProcessRunner
            .run(
                "sh",
                &args(&["-c", "echo out; echo err >&2; exit 3"]),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert_eq!(output.combined(), "out\nerr\n");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let start = Instant::now();
        let result = ProcessRunner
            .run("sleep", &args(&["5"]), Duration::from_millis(100))
            .await;

        assert!(matches!(result, Err(MediaError::Timeout(_))));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_timeout_kills_process_group() {
        let start = Instant::now();
        let result = ProcessRunner
            .run(
                "sh",
                &args(&["-c", "sleep 5 & sleep 5; wait"]),
                Duration::from_millis(100),
            )
            .await;

        assert!(result.unwrap_err().is_timeout());
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_background_child_does_not_outlive_deadline() {
        let start = Instant::now();
        let output = ProcessRunner
            .run(
                "sh",
                &args(&["-c", "sleep 6 & exit 0"]),
                Duration::from_millis(500),
            )
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(0));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let result = ProcessRunner
            .run("definitely-not-a-real-binary-xyz", &[], Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(MediaError::Io(_))));
    }
}
