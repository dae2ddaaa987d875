use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// HTTP/WebSocket listen address.
    pub listen_addr: String,
    /// Target frame rate of the multiplexed stream.
    pub stream_fps: f64,
    /// Worker binary the supervisor spawns for non-standby modes.
    pub worker_bin: PathBuf,
    /// How long a worker gets to exit after SIGTERM before SIGKILL.
    pub worker_term_timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let listen_addr =
            env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let stream_fps = env::var("STREAM_FPS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24.0);

        // Default: a `worker` binary next to our own executable, the layout
        // both `cargo build` and the deploy image produce.
        let worker_bin = match env::var("WORKER_BIN") {
            Ok(path) => PathBuf::from(path),
            Err(_) => env::current_exe()
                .context("Failed to locate own executable")?
                .with_file_name("worker"),
        };

        let term_timeout_ms: u64 = env::var("WORKER_TERM_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .unwrap_or(5000);

        Ok(Self {
            listen_addr,
            stream_fps,
            worker_bin,
            worker_term_timeout: Duration::from_millis(term_timeout_ms),
        })
    }

    pub fn stream_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.stream_fps.max(1.0))
    }
}
