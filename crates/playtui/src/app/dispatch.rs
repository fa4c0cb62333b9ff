//! Engine dispatch: selection validation, spawn, and background run tracking.

use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::domain::errors::DispatchError;
use crate::domain::model::{CurrentSelection, ExecutionResult};

/// How often the waiter thread checks the child for exit.
const WAIT_POLL: Duration = Duration::from_millis(100);

/// Fixed invocation bundle passed to the engine CLI.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub program: String,
    pub connection: String,
    pub forks: u32,
    pub remote_user: String,
    pub become_method: String,
    pub become_user: String,
    pub timeout: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            program: "ansible-playbook".to_string(),
            connection: "ssh".to_string(),
            forks: 100,
            remote_user: "ansible".to_string(),
            become_method: "sudo".to_string(),
            become_user: "root".to_string(),
            timeout: None,
        }
    }
}

impl EngineOptions {
    /// Arguments for one run. Privilege escalation is always requested; no
    /// vault password and no tag filtering are passed.
    pub fn to_args(&self, inventory: &Path, playbook: &Path) -> Vec<OsString> {
        vec![
            OsString::from("-i"),
            inventory.as_os_str().to_os_string(),
            playbook.as_os_str().to_os_string(),
            OsString::from("--connection"),
            OsString::from(&self.connection),
            OsString::from("--forks"),
            OsString::from(self.forks.to_string()),
            OsString::from("--user"),
            OsString::from(&self.remote_user),
            OsString::from("--become"),
            OsString::from("--become-method"),
            OsString::from(&self.become_method),
            OsString::from("--become-user"),
            OsString::from(&self.become_user),
        ]
    }
}

/// Validates the selection and launches the engine as a background run.
#[derive(Debug, Default)]
pub struct ExecutionDispatcher {
    options: EngineOptions,
}

impl ExecutionDispatcher {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// Starts one engine run for the current selection.
    ///
    /// Fails fast with `SelectionIncomplete` before anything is spawned when
    /// either path is unset or not a regular file. Exactly one child process
    /// is spawned per successful call; its stdout and stderr stream into the
    /// log surface under the `engine` target while a waiter thread posts the
    /// final [`ExecutionResult`] to the returned handle.
    pub fn dispatch(&self, selection: &CurrentSelection) -> Result<RunHandle, DispatchError> {
        let (inventory, playbook) = selection.validated()?;

        let mut command = Command::new(&self.options.program);
        command
            .args(self.options.to_args(inventory, playbook))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(DispatchError::EngineInvocation)?;

        if let Some(stdout) = child.stdout.take() {
            spawn_line_reader(stdout, false);
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_reader(stderr, true);
        }

        let (sender, receiver) = std::sync::mpsc::channel();
        let child = Arc::new(Mutex::new(Some(child)));
        let cancelled = Arc::new(AtomicBool::new(false));
        let started_at = Instant::now();

        spawn_waiter(
            Arc::clone(&child),
            Arc::clone(&cancelled),
            self.options.timeout,
            started_at,
            sender,
        );

        Ok(RunHandle { receiver, child, cancelled, started_at })
    }
}

/// Handle over one background engine run.
#[derive(Debug)]
pub struct RunHandle {
    receiver: Receiver<ExecutionResult>,
    child: Arc<Mutex<Option<Child>>>,
    cancelled: Arc<AtomicBool>,
    started_at: Instant,
}

impl RunHandle {
    /// Non-blocking reap; yields the result once, when the run has finished.
    pub fn try_finish(&self) -> Option<ExecutionResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(ExecutionResult::failure(
                "engine monitor stopped unexpectedly".to_string(),
            )),
        }
    }

    /// Blocks until the run finishes or `limit` elapses.
    pub fn wait(&self, limit: Duration) -> Option<ExecutionResult> {
        self.receiver.recv_timeout(limit).ok()
    }

    /// Kills the child; the waiter then reports the run as cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Ok(mut guard) = self.child.lock() {
            if let Some(child) = guard.as_mut() {
                if let Err(err) = child.kill() {
                    tracing::debug!(error = %err, "engine process already gone");
                }
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

fn spawn_line_reader<R>(stream: R, stderr: bool)
where
    R: std::io::Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if stderr {
                        tracing::warn!(target: "engine", "{line}");
                    } else {
                        tracing::info!(target: "engine", "{line}");
                    }
                }
                Err(err) => {
                    tracing::debug!(target: "engine", error = %err, "output stream closed");
                    break;
                }
            }
        }
    });
}

fn spawn_waiter(
    child: Arc<Mutex<Option<Child>>>,
    cancelled: Arc<AtomicBool>,
    timeout: Option<Duration>,
    started_at: Instant,
    sender: Sender<ExecutionResult>,
) {
    thread::spawn(move || {
        let mut timed_out = false;
        let status = loop {
            {
                let mut guard = match child.lock() {
                    Ok(guard) => guard,
                    Err(_) => return,
                };
                match guard.as_mut().map(|child| child.try_wait()) {
                    None => return,
                    Some(Ok(Some(status))) => {
                        *guard = None;
                        break Some(status);
                    }
                    Some(Ok(None)) => {}
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "failed to poll engine process");
                        *guard = None;
                        break None;
                    }
                }
                if let Some(limit) = timeout
                    && started_at.elapsed() >= limit
                    && !timed_out
                {
                    timed_out = true;
                    if let Some(child) = guard.as_mut() {
                        let _ = child.kill();
                    }
                }
            }
            thread::sleep(WAIT_POLL);
        };

        let elapsed = started_at.elapsed();
        let result = summarize(status, cancelled.load(Ordering::SeqCst), timed_out, elapsed);
        if sender.send(result).is_err() {
            tracing::debug!("run finished after its handle was dropped");
        }
    });
}

fn summarize(
    status: Option<ExitStatus>,
    cancelled: bool,
    timed_out: bool,
    elapsed: Duration,
) -> ExecutionResult {
    let secs = elapsed.as_secs_f64();
    if cancelled {
        return ExecutionResult::failure(format!("run cancelled after {secs:.1}s"));
    }
    if timed_out {
        return ExecutionResult::failure(format!("run timed out after {secs:.1}s"));
    }
    match status {
        Some(status) if status.success() => {
            ExecutionResult::success(format!("engine finished in {secs:.1}s"))
        }
        Some(status) => match status.code() {
            Some(code) => ExecutionResult::failure(format!("engine exited with status {code}")),
            None => ExecutionResult::failure("engine terminated by signal".to_string()),
        },
        None => ExecutionResult::failure("engine status could not be determined".to_string()),
    }
}
