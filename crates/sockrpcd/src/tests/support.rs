//! Shared helpers for daemon integration tests.

use std::io::{BufRead, BufReader, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde_json::Value;
use sockrpc_config::Config;
use sockrpc_types::Response;
use tempfile::TempDir;

use crate::bootstrap::StaticConfigLoader;
use crate::process::{
    LaunchError, LaunchPlan, ShutdownCause, ShutdownError, ShutdownSignal, run_daemon_with,
};

pub(crate) const WAIT_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(10);
const SIGTERM: i32 = 15;

/// Shutdown trigger flipped by the test instead of a process signal.
#[derive(Clone, Default)]
pub(crate) struct TriggeredShutdown {
    triggered: Arc<AtomicBool>,
}

impl TriggeredShutdown {
    pub(crate) fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }
}

impl ShutdownSignal for TriggeredShutdown {
    fn wait(&self, listener_stopped: &dyn Fn() -> bool) -> Result<ShutdownCause, ShutdownError> {
        loop {
            if self.triggered.load(Ordering::SeqCst) {
                return Ok(ShutdownCause::Signal(SIGTERM));
            }
            if listener_stopped() {
                return Ok(ShutdownCause::ListenerStopped);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Temporary directory holding a daemon socket path.
pub(crate) struct SocketDir {
    _dir: TempDir,
    pub(crate) socket: Utf8PathBuf,
}

impl SocketDir {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
        Self {
            socket: root.join("run/rpc.sock"),
            _dir: dir,
        }
    }

    pub(crate) fn config(&self) -> Config {
        Config {
            socket_path: self.socket.clone(),
            log_filter: "warn".to_owned(),
            io_timeout_ms: 500,
            ..Config::default()
        }
    }
}

/// Daemon running on a background thread through `run_daemon_with`.
pub(crate) struct RunningDaemon {
    pub(crate) dir: SocketDir,
    shutdown: TriggeredShutdown,
    thread: Option<JoinHandle<Result<(), LaunchError>>>,
}

impl RunningDaemon {
    pub(crate) fn start() -> Self {
        Self::start_with(|_| {})
    }

    pub(crate) fn start_with(configure: impl FnOnce(&mut Config)) -> Self {
        let dir = SocketDir::new();
        let mut config = dir.config();
        configure(&mut config);
        Self::launch(dir, config)
    }

    pub(crate) fn launch(dir: SocketDir, config: Config) -> Self {
        let shutdown = TriggeredShutdown::default();
        let plan = LaunchPlan {
            loader: StaticConfigLoader::new(config),
            shutdown: shutdown.clone(),
        };
        let thread = thread::spawn(move || run_daemon_with(plan));
        let daemon = Self {
            dir,
            shutdown,
            thread: Some(thread),
        };
        assert!(
            wait_for(|| daemon.dir.socket.exists()),
            "daemon socket should appear"
        );
        daemon
    }

    pub(crate) fn connect(&self) -> UnixStream {
        let stream = UnixStream::connect(&self.dir.socket).expect("connect to daemon");
        stream
            .set_read_timeout(Some(WAIT_TIMEOUT))
            .expect("set read timeout");
        stream
    }

    /// Sends raw bytes, leaves the write side open, and reads one line.
    pub(crate) fn exchange(&self, raw: &[u8]) -> String {
        let mut stream = self.connect();
        stream.write_all(raw).expect("write request");
        read_line(&stream)
    }

    /// Sends raw bytes, half-closes the write side, and reads one line.
    pub(crate) fn exchange_half_closed(&self, raw: &[u8]) -> String {
        let mut stream = self.connect();
        stream.write_all(raw).expect("write request");
        stream.shutdown(Shutdown::Write).expect("half close");
        read_line(&stream)
    }

    pub(crate) fn call(&self, request: &Value) -> Response {
        let mut raw = serde_json::to_vec(request).expect("encode request");
        raw.push(b'\n');
        let line = self.exchange(&raw);
        serde_json::from_str(&line).expect("response parses")
    }

    /// Triggers shutdown and waits for `run_daemon_with` to return. The
    /// temporary directory outlives the call so tests can inspect it.
    pub(crate) fn stop(&mut self) -> Result<(), LaunchError> {
        self.shutdown.trigger();
        self.thread
            .take()
            .expect("daemon thread present")
            .join()
            .expect("daemon thread panicked")
    }
}

impl Drop for RunningDaemon {
    fn drop(&mut self) {
        self.shutdown.trigger();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub(crate) fn read_line(stream: &UnixStream) -> String {
    let mut line = String::new();
    BufReader::new(stream)
        .read_line(&mut line)
        .expect("read response");
    line
}

pub(crate) fn wait_for(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(POLL_INTERVAL);
    }
    false
}
