//! Lifecycle management for the external client process
//!
//! The supervisor owns at most one child process at a time. Start and stop
//! are mutually exclusive through a single lock around the handle; the lock
//! is never held across a blocking wait on a live process — the only reap
//! happens right after a successful kill.

use crate::relay::{self, LogSink, StreamKind};
use crate::store::ConfigStore;
use crate::{Error, Result};
use std::fs;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};

/// A launched client together with its transient plaintext config.
#[derive(Debug)]
struct RunningClient {
    child: Child,
    transient_config: PathBuf,
}

/// Supervisor for exactly one client process.
///
/// Constructed once and shared (by reference or `Arc`) with whatever
/// triggers start/stop; there is deliberately no global handle.
pub struct ProcessSupervisor {
    binary: PathBuf,
    store: Arc<ConfigStore>,
    sink: Arc<dyn LogSink>,
    client: Mutex<Option<RunningClient>>,
}

impl ProcessSupervisor {
    /// Create a supervisor launching `binary` with configs from `store`,
    /// relaying client output to `sink`.
    pub fn new(store: Arc<ConfigStore>, binary: PathBuf, sink: Arc<dyn LogSink>) -> Self {
        Self {
            binary,
            store,
            sink,
            client: Mutex::new(None),
        }
    }

    /// Supervisor using the client binary installed in the store root.
    pub fn from_store(store: Arc<ConfigStore>, sink: Arc<dyn LogSink>) -> Self {
        let binary = store.binary_path();
        Self::new(store, binary, sink)
    }

    fn lock(&self) -> MutexGuard<'_, Option<RunningClient>> {
        self.client.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start the client against the named stored artifact.
    ///
    /// Fails with [`Error::AlreadyRunning`] when a handle is already held.
    /// A spawn failure surfaces as [`Error::Launch`] and leaves the
    /// supervisor idle, with the transient plaintext removed.
    pub fn start(&self, artifact: &str) -> Result<u32> {
        let mut guard = self.lock();
        if guard.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let transient_config = self.store.materialize_plaintext(artifact)?;

        let mut child = match Command::new(&self.binary)
            .arg("-c")
            .arg(&transient_config)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                fs::remove_file(&transient_config).ok();
                return Err(Error::Launch(e));
            }
        };

        // Fire-and-forget readers; pipe closure ends them when the client
        // exits or is killed.
        if let Some(stdout) = child.stdout.take() {
            relay::spawn_reader(stdout, StreamKind::Stdout, self.sink.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            relay::spawn_reader(stderr, StreamKind::Stderr, self.sink.clone());
        }

        let pid = child.id();
        log::info!("client started (pid {})", pid);
        *guard = Some(RunningClient {
            child,
            transient_config,
        });
        Ok(pid)
    }

    /// Forcibly terminate the running client (no graceful-shutdown grace
    /// period) and release the handle.
    ///
    /// Fails with [`Error::NotRunning`] when idle. On a kill failure the
    /// handle is retained so the caller may retry.
    pub fn stop(&self) -> Result<()> {
        let mut guard = self.lock();
        let mut running = guard.take().ok_or(Error::NotRunning)?;

        if let Err(e) = running.child.kill() {
            *guard = Some(running);
            return Err(Error::Termination(e));
        }

        // The child is dead, so this reap returns promptly. Its exit status
        // is informational only.
        match running.child.wait() {
            Ok(status) => log::info!("client exited: {}", status),
            Err(e) => log::warn!("could not collect client exit status: {}", e),
        }

        // Best-effort cleanup of the transient plaintext
        if let Err(e) = fs::remove_file(&running.transient_config) {
            log::warn!(
                "could not remove transient config {}: {}",
                running.transient_config.display(),
                e
            );
        }

        Ok(())
    }

    /// Whether a client handle is currently held. A client that exited on
    /// its own still counts as held until [`stop`](Self::stop) reaps it.
    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }

    /// Process ID of the supervised client, if one is held.
    pub fn pid(&self) -> Option<u32> {
        self.lock().as_ref().map(|r| r.child.id())
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        // Do not leave an orphaned client or its plaintext behind
        if let Some(mut running) = self.lock().take() {
            running.child.kill().ok();
            running.child.wait().ok();
            fs::remove_file(&running.transient_config).ok();
        }
    }
}
