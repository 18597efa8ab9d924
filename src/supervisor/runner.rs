//! The supervised invocation: spawn, drain, poll, classify, clean up.

use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use crate::command::CommandMasker;
use crate::dispatch::NotificationSink;
use crate::protocol::{pump, DecodeError};
use crate::supervisor::{Outcome, StderrBuffer, SupervisorError};

/// How often the poll loop checks whether the worker has exited. This is a
/// responsiveness parameter, not a deadline: the supervisor waits as long as
/// the worker runs.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default timeout for graceful worker termination during cleanup.
pub const DEFAULT_TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);

/// What a JVM prints to stderr when the worker's bytecode requires a newer
/// runtime. Once this appears, the cause has been fully reported and raising
/// a generic failure on top would only obscure it.
const VERSION_MISMATCH_MARKER: &str = "java.lang.UnsupportedClassVersionError";

/// Stands in for stderr text when a failing worker produced none.
const NO_DIAGNOSTIC_OUTPUT: &str = "<no diagnostic output captured>";

/// The possible states of a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommandState {
    /// Constructed but not yet run.
    #[default]
    NotStarted,
    /// `run` is in progress.
    Running,
    /// `run` completed with [`Outcome::Success`].
    Succeeded,
    /// `run` completed with any other result.
    Failed,
}

/// One supervised invocation of the worker program.
///
/// A command is single-use: it is constructed with a complete, pre-validated
/// argument vector and executes exactly once; a second `run` is rejected.
/// While the worker runs, its stdout is decoded into the supplied
/// [`NotificationSink`] and its stderr is forwarded as diagnostic `output`
/// notifications.
pub struct WorkerCommand {
    argv: Vec<String>,
    poll_interval: Duration,
    terminate_timeout: Duration,
    state: CommandState,
}

impl WorkerCommand {
    /// Creates a command for the given argument vector. The supervisor does
    /// not validate or augment the arguments.
    #[must_use]
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            poll_interval: DEFAULT_POLL_INTERVAL,
            terminate_timeout: DEFAULT_TERMINATE_TIMEOUT,
            state: CommandState::NotStarted,
        }
    }

    /// Overrides the poll interval.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the graceful termination timeout used during cleanup.
    #[must_use]
    pub fn terminate_timeout(mut self, timeout: Duration) -> Self {
        self.terminate_timeout = timeout;
        self
    }

    /// The current state of this command.
    #[must_use]
    pub fn state(&self) -> CommandState {
        self.state
    }

    /// The argument vector, as supplied.
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Runs the worker to completion, dispatching notifications into `sink`.
    ///
    /// Returns [`Outcome::Success`] on a clean exit, and
    /// [`Outcome::FailureReported`] when the worker failed with a signature
    /// that was already fully reported through the diagnostic channel (no
    /// second error is raised for it).
    ///
    /// # Errors
    ///
    /// [`SupervisorError::Decode`] if the notification stream was corrupt or
    /// truncated (raised immediately, without waiting for worker exit);
    /// [`SupervisorError::ToolFailure`] for an unrecognized non-zero exit;
    /// [`SupervisorError::Spawn`]/[`SupervisorError::Wait`] for
    /// infrastructure failures; [`SupervisorError::AlreadyRan`] if this
    /// command was run before.
    pub async fn run<S>(&mut self, sink: Arc<S>) -> Result<Outcome, SupervisorError>
    where
        S: NotificationSink + ?Sized + 'static,
    {
        if self.state != CommandState::NotStarted {
            return Err(SupervisorError::AlreadyRan);
        }
        self.state = CommandState::Running;

        let result = self.execute(sink).await;
        self.state = match result {
            Ok(Outcome::Success) => CommandState::Succeeded,
            _ => CommandState::Failed,
        };
        result
    }

    async fn execute<S>(&self, sink: Arc<S>) -> Result<Outcome, SupervisorError>
    where
        S: NotificationSink + ?Sized + 'static,
    {
        let program = self
            .argv
            .first()
            .ok_or_else(|| SupervisorError::Spawn(std::io::Error::other("empty command line")))?;

        let mut child = Command::new(program)
            .args(&self.argv[1..])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(SupervisorError::Spawn)?;

        tracing::debug!(program = %program, pid = ?child.id(), "worker spawned");

        let stdout = child.stdout.take().ok_or(SupervisorError::NoStdout)?;
        let stderr = child.stderr.take().ok_or(SupervisorError::NoStderr)?;

        let stderr_buffer = Arc::new(StderrBuffer::new());
        let stderr_task = tokio::spawn({
            let buffer = Arc::clone(&stderr_buffer);
            async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    buffer.append_line(&line);
                }
            }
        });

        // The pump records its error for the poll loop instead of unwinding
        // across the task boundary.
        let pump_error: Arc<Mutex<Option<DecodeError>>> = Arc::new(Mutex::new(None));
        let cancel = CancellationToken::new();
        let pump_task = tokio::spawn({
            let sink = Arc::clone(&sink);
            let pump_error = Arc::clone(&pump_error);
            let cancel = cancel.clone();
            async move {
                tokio::select! {
                    () = cancel.cancelled() => {}
                    result = pump(stdout, sink.as_ref()) => {
                        if let Err(err) = result {
                            *pump_error.lock().unwrap_or_else(PoisonError::into_inner) =
                                Some(err);
                        }
                    }
                }
            }
        });

        let result = self
            .poll(&mut child, sink.as_ref(), &stderr_buffer, &pump_error)
            .await;

        // Cleanup runs no matter how the loop ended: stop the pump, bring
        // down the worker if it is still alive, release the pipes.
        cancel.cancel();
        self.terminate(&mut child).await;
        pump_task.abort();
        stderr_task.abort();

        result
    }

    async fn poll<S>(
        &self,
        child: &mut Child,
        sink: &S,
        stderr: &StderrBuffer,
        pump_error: &Mutex<Option<DecodeError>>,
    ) -> Result<Outcome, SupervisorError>
    where
        S: NotificationSink + ?Sized,
    {
        loop {
            tokio::time::sleep(self.poll_interval).await;
            match child.try_wait().map_err(SupervisorError::Wait)? {
                Some(status) if status.success() => return Ok(Outcome::Success),
                Some(status) => {
                    let captured = stderr.drain();
                    if let Some(text) = &captured {
                        sink.output(text);
                    }
                    if captured
                        .as_deref()
                        .is_some_and(|text| text.contains(VERSION_MISMATCH_MARKER))
                    {
                        tracing::warn!(
                            code = ?status.code(),
                            "worker runtime version mismatch, cause already reported"
                        );
                        return Ok(Outcome::FailureReported);
                    }
                    if let Some(source) = take_error(pump_error) {
                        return Err(self.decode_failure(source));
                    }
                    return Err(SupervisorError::ToolFailure {
                        stderr: captured
                            .unwrap_or_else(|| NO_DIAGNOSTIC_OUTPUT.to_string()),
                    });
                }
                None => {
                    // Runtimes emit benign startup warnings on stderr;
                    // forward them without treating their presence as
                    // failure.
                    if let Some(text) = stderr.drain() {
                        sink.output(&text);
                    }
                    if let Some(source) = take_error(pump_error) {
                        return Err(self.decode_failure(source));
                    }
                }
            }
        }
    }

    fn decode_failure(&self, source: DecodeError) -> SupervisorError {
        SupervisorError::Decode {
            source,
            command: CommandMasker::new().render(&self.argv),
        }
    }

    /// Brings the worker down if it is still running. On unix this tries
    /// SIGTERM first and escalates to SIGKILL after the timeout; elsewhere it
    /// kills outright.
    async fn terminate(&self, child: &mut Child) {
        if matches!(child.try_wait(), Ok(Some(_))) {
            return;
        }

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = child.id() {
                let pid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
                let _ = kill(pid, Signal::SIGTERM);
                if tokio::time::timeout(self.terminate_timeout, child.wait())
                    .await
                    .is_ok()
                {
                    return;
                }
            }
        }

        if let Err(err) = child.kill().await {
            tracing::warn!(error = %err, "failed to kill worker");
        }
    }
}

fn take_error(pump_error: &Mutex<Option<DecodeError>>) -> Option<DecodeError> {
    pump_error
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::OrderedMap;

    struct NullSink;

    impl NotificationSink for NullSink {
        fn sysout(&self, _: &str) {}
        fn progress(&self, _: &OrderedMap) {}
        fn message(&self, _: &OrderedMap) {}
        fn output(&self, _: &str) {}
        fn scan_log(&self, _: &OrderedMap) {}
        fn unknown_text(&self, _: &str) {}
        fn unknown_map(&self, _: &OrderedMap) {}
    }

    #[test]
    fn new_command_is_not_started() {
        let command = WorkerCommand::new(vec!["true".to_string()]);
        assert_eq!(command.state(), CommandState::NotStarted);
        assert_eq!(command.argv(), ["true"]);
    }

    #[tokio::test]
    async fn empty_argv_is_a_spawn_failure() {
        let mut command = WorkerCommand::new(Vec::new());
        let err = command.run(Arc::new(NullSink)).await.unwrap_err();
        assert!(err.is_infrastructure());
        assert_eq!(command.state(), CommandState::Failed);
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_failure() {
        let mut command =
            WorkerCommand::new(vec!["definitely-not-a-real-binary-1f9a".to_string()]);
        let err = command.run(Arc::new(NullSink)).await.unwrap_err();
        assert!(matches!(err, SupervisorError::Spawn(_)));
    }

    #[tokio::test]
    async fn second_run_is_rejected() {
        let mut command = WorkerCommand::new(Vec::new());
        let _ = command.run(Arc::new(NullSink)).await;
        let err = command.run(Arc::new(NullSink)).await.unwrap_err();
        assert!(matches!(err, SupervisorError::AlreadyRan));
    }
}
