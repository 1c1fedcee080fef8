//! Listener implementation for the daemon's Unix socket.

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::thread;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, error, info, warn};

use super::{ConnectionHandler, LISTENER_TARGET, ListenerError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);
const DRAIN_POLL: Duration = Duration::from_millis(10);
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Listener bound to a Unix socket path.
#[derive(Debug)]
pub(crate) struct SocketListener {
    listener: UnixListener,
    socket_file: SocketFile,
}

impl SocketListener {
    /// Binds `path`, replacing a stale socket left by a previous run.
    pub(crate) fn bind(path: &Utf8Path) -> Result<Self, ListenerError> {
        let listener = bind_unix(path)?;
        Ok(Self {
            listener,
            socket_file: SocketFile {
                path: path.to_path_buf(),
            },
        })
    }

    pub(crate) fn path(&self) -> &Utf8Path {
        &self.socket_file.path
    }

    /// Starts the accept loop on a background thread.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        // On failure `self` drops here and the socket file goes with it.
        self.listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let shutdown_flag = Arc::clone(&shutdown);
        let counter = Arc::clone(&in_flight);
        let handle =
            thread::spawn(move || run_accept_loop(self, &shutdown_flag, &counter, &handler));
        Ok(ListenerHandle {
            shutdown,
            in_flight,
            handle: Some(handle),
        })
    }
}

/// Removes the socket file when the listener goes away.
#[derive(Debug)]
struct SocketFile {
    path: Utf8PathBuf,
}

impl Drop for SocketFile {
    fn drop(&mut self) {
        cleanup_unix_socket(&self.path);
    }
}

/// Handle to the background listener thread.
pub(crate) struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
    handle: Option<thread::JoinHandle<Result<(), ListenerError>>>,
}

impl ListenerHandle {
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Returns true once the accept loop has exited.
    pub(crate) fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .is_none_or(thread::JoinHandle::is_finished)
    }

    /// Number of connections currently being served.
    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Waits for the accept loop and then drains in-flight connections for
    /// up to five seconds.
    pub(crate) fn join(self) -> Result<(), ListenerError> {
        self.join_within(DEFAULT_DRAIN_TIMEOUT)
    }

    /// Waits for the accept loop and then for in-flight connections to
    /// finish, giving up on the latter after `drain_timeout`.
    pub(crate) fn join_within(mut self, drain_timeout: Duration) -> Result<(), ListenerError> {
        let outcome = match self.handle.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(ListenerError::ThreadPanic)),
            None => Ok(()),
        };
        self.drain(drain_timeout);
        outcome
    }

    fn drain(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while self.in_flight() > 0 {
            if Instant::now() >= deadline {
                warn!(
                    target: LISTENER_TARGET,
                    remaining = self.in_flight(),
                    "abandoning in-flight connections"
                );
                return;
            }
            thread::sleep(DRAIN_POLL);
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

/// Tracks one in-flight connection; decrements on drop, including on panic.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    listener: SocketListener,
    shutdown: &AtomicBool,
    in_flight: &Arc<AtomicUsize>,
    handler: &Arc<dyn ConnectionHandler>,
) -> Result<(), ListenerError> {
    info!(
        target: LISTENER_TARGET,
        path = %listener.path(),
        "socket listener active"
    );
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        match listener.listener.accept() {
            Ok((stream, _)) => {
                last_error = None;
                spawn_connection(stream, in_flight, handler);
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_BACKOFF);
            }
            Err(error) if is_transient(error.kind()) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "socket accept error"
                    );
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
            Err(source) => {
                error!(
                    target: LISTENER_TARGET,
                    error = %source,
                    "socket accept failed, stopping listener"
                );
                return Err(ListenerError::Accept { source });
            }
        }
    }

    info!(target: LISTENER_TARGET, "socket listener stopped");
    Ok(())
}

fn spawn_connection(
    stream: UnixStream,
    in_flight: &Arc<AtomicUsize>,
    handler: &Arc<dyn ConnectionHandler>,
) {
    if let Err(error) = stream.set_nonblocking(false) {
        warn!(
            target: LISTENER_TARGET,
            error = %error,
            "dropping connection that cannot block"
        );
        return;
    }
    let guard = InFlight::enter(in_flight);
    let handler = Arc::clone(handler);
    let spawned = thread::Builder::new()
        .name("sockrpcd-conn".to_owned())
        .spawn(move || {
            let _guard = guard;
            handler.handle(stream);
        });
    if let Err(error) = spawned {
        warn!(
            target: LISTENER_TARGET,
            error = %error,
            "failed to spawn connection thread"
        );
    } else {
        debug!(target: LISTENER_TARGET, "connection accepted");
    }
}

const fn is_transient(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::Interrupted
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

fn bind_unix(path: &Utf8Path) -> Result<UnixListener, ListenerError> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if !metadata.file_type().is_socket() {
                return Err(ListenerError::NotSocket {
                    path: path.to_path_buf(),
                });
            }
            remove_stale_socket(path)?;
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ListenerError::Metadata {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    UnixListener::bind(path).map_err(|source| ListenerError::BindUnix {
        path: path.to_path_buf(),
        source,
    })
}

fn remove_stale_socket(path: &Utf8Path) -> Result<(), ListenerError> {
    match UnixStream::connect(path) {
        Ok(_stream) => Err(ListenerError::InUse {
            path: path.to_path_buf(),
        }),
        Err(error)
            if error.kind() == io::ErrorKind::ConnectionRefused
                || error.kind() == io::ErrorKind::NotFound =>
        {
            info!(
                target: LISTENER_TARGET,
                path = %path,
                "removing stale unix socket"
            );
            fs::remove_file(path).map_err(|source| ListenerError::Cleanup {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(source) => Err(ListenerError::Connect {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn cleanup_unix_socket(path: &Utf8Path) {
    if let Err(error) = fs::remove_file(path)
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: LISTENER_TARGET,
            error = %error,
            path = %path,
            "failed to remove unix socket file"
        );
    }
}
