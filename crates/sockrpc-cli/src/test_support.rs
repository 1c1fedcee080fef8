//! Stub daemon used by client and runner tests.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixListener;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use camino::Utf8PathBuf;
use serde_json::{Value, json};
use sockrpc_types::Request;
use tempfile::TempDir;

/// Computes a canned reply for a decoded request.
pub(crate) type Reply = Box<dyn Fn(&Request) -> Value + Send>;

/// Single-threaded stub that answers a fixed number of connections.
pub(crate) struct StubDaemon {
    _dir: TempDir,
    pub(crate) socket: Utf8PathBuf,
    requests: Arc<Mutex<Vec<Request>>>,
    thread: Option<JoinHandle<()>>,
}

impl StubDaemon {
    /// Answers `connections` requests, echoing their ids.
    pub(crate) fn spawn(connections: usize, reply: Reply) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let socket =
            Utf8PathBuf::from_path_buf(dir.path().join("stub.sock")).expect("utf8 socket path");
        let listener = UnixListener::bind(&socket).expect("bind stub socket");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        let thread = thread::spawn(move || {
            for _ in 0..connections {
                let (stream, _) = listener.accept().expect("accept");
                let mut line = String::new();
                BufReader::new(&stream)
                    .read_line(&mut line)
                    .expect("read request");
                let request: Request = serde_json::from_str(&line).expect("decode request");
                let mut response = reply(&request);
                if let Some(object) = response.as_object_mut() {
                    object
                        .entry("id")
                        .or_insert_with(|| request.id.clone());
                }
                recorded.lock().expect("requests lock").push(request);
                let mut payload = serde_json::to_vec(&response).expect("encode response");
                payload.push(b'\n');
                (&stream).write_all(&payload).expect("write response");
            }
        });

        Self {
            _dir: dir,
            socket,
            requests,
            thread: Some(thread),
        }
    }

    /// Answers every request with `results` typed as `result_type`.
    pub(crate) fn success(connections: usize, results: Value, result_type: &str) -> Self {
        let result_type = result_type.to_owned();
        Self::spawn(
            connections,
            Box::new(move |_| json!({"results": results, "result_type": result_type})),
        )
    }

    /// Waits for the stub to finish and returns the requests it saw.
    pub(crate) fn finish(mut self) -> Vec<Request> {
        if let Some(thread) = self.thread.take() {
            thread.join().expect("stub thread");
        }
        self.requests.lock().expect("requests lock").clone()
    }
}
