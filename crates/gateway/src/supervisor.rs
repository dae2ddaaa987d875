use anyhow::{Context, Result, bail};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Exclusive operating mode. At most one worker process exists at a time;
/// `Standby` means none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Mode {
    Standby,
    Inference,
    Training { spell: String },
    Debug,
}

impl Mode {
    pub fn is_standby(&self) -> bool {
        matches!(self, Mode::Standby)
    }
}

const SPAWN_GRACE: Duration = Duration::from_millis(200);
const REAP_POLL: Duration = Duration::from_millis(50);

/// Owns the worker process lifecycle: terminate-then-spawn on every mode
/// change, so two workers never contend for the camera or the frame channel.
pub struct Supervisor {
    worker_bin: PathBuf,
    term_timeout: Duration,
    mode: Mode,
    worker: Option<Child>,
}

impl Supervisor {
    pub fn new(worker_bin: PathBuf, term_timeout: Duration) -> Self {
        Self {
            worker_bin,
            term_timeout,
            mode: Mode::Standby,
            worker: None,
        }
    }

    /// Current mode, reconciled against reality: a worker that died on its
    /// own demotes us to standby.
    pub fn mode(&mut self) -> Mode {
        if let Some(child) = &mut self.worker
            && let Ok(Some(status)) = child.try_wait()
        {
            tracing::warn!(%status, previous = ?self.mode, "Worker exited on its own");
            self.worker = None;
            self.mode = Mode::Standby;
        }
        self.mode.clone()
    }

    /// Switch modes. The old worker is fully torn down before the new one
    /// spawns; on any failure the system lands in standby, never in a
    /// half-switched state.
    pub fn set_mode(&mut self, target: Mode) -> Result<Mode> {
        if let Mode::Training { spell } = &target
            && spell.trim().is_empty()
        {
            bail!("training mode requires a non-blank spell name");
        }

        if target == self.mode() {
            return Ok(self.mode.clone());
        }

        self.teardown()?;
        self.mode = Mode::Standby;

        if !target.is_standby() {
            self.worker = Some(self.spawn(&target)?);
            self.mode = target;
        }

        tracing::info!(mode = ?self.mode, "Mode switched");
        Ok(self.mode.clone())
    }

    fn spawn(&self, mode: &Mode) -> Result<Child> {
        let args = worker_command_args(mode);
        tracing::info!(bin = %self.worker_bin.display(), ?args, "Spawning worker");

        let mut child = Command::new(&self.worker_bin)
            .args(&args)
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.worker_bin.display()))?;

        // Catch immediate failures (bad args, missing camera) here rather
        // than reporting a mode switch that already fell over.
        std::thread::sleep(SPAWN_GRACE);
        if let Some(status) = child.try_wait().context("Failed to poll new worker")? {
            bail!("worker exited during startup: {status}");
        }

        tracing::info!(pid = child.id(), "Worker running");
        Ok(child)
    }

    /// SIGTERM, bounded wait, then SIGKILL. Always reaps.
    fn teardown(&mut self) -> Result<()> {
        let Some(mut child) = self.worker.take() else {
            return Ok(());
        };

        let pid = Pid::from_raw(child.id() as i32);
        tracing::info!(pid = child.id(), "Stopping worker");

        // ESRCH just means it already exited; try_wait below reaps it.
        let _ = kill(pid, Signal::SIGTERM);

        let deadline = Instant::now() + self.term_timeout;
        loop {
            if let Some(status) = child.try_wait().context("Failed to poll worker")? {
                tracing::info!(%status, "Worker stopped");
                return Ok(());
            }
            if Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(REAP_POLL);
        }

        tracing::warn!(pid = child.id(), "Worker ignored SIGTERM, sending SIGKILL");
        let _ = kill(pid, Signal::SIGKILL);
        let status = child.wait().context("Failed to reap worker")?;
        tracing::info!(%status, "Worker killed");
        Ok(())
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            tracing::warn!("Worker teardown on shutdown failed: {e}");
        }
    }
}

fn worker_command_args(mode: &Mode) -> Vec<String> {
    let args: Vec<&str> = match mode {
        // Callers must not ask for a standby worker.
        Mode::Standby => return Vec::new(),
        Mode::Inference => vec!["--mode", "inference", "--visualizer", "none", "--exit", "signal"],
        Mode::Debug => vec!["--mode", "debug", "--visualizer", "channel", "--exit", "signal"],
        Mode::Training { spell } => {
            return ["--mode", "training", "--spell", spell, "--visualizer", "channel", "--exit", "signal"]
                .iter()
                .map(|s| s.to_string())
                .collect();
        }
    };
    args.iter().map(|s| s.to_string()).collect()
}
