//! Socket transport helpers for the client.
//!
//! A call opens a fresh connection, writes one newline-terminated request,
//! and reads a single response line. The daemon closes the connection after
//! answering, so end of stream also terminates the response.

use std::io::{self, BufRead, BufReader, Write};
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::time::Duration;

use camino::Utf8Path;
use socket2::{Domain, SockAddr, Socket, Type};
use sockrpc_types::{Request, Response};

use crate::errors::ClientError;

pub(crate) const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn connect(path: &Utf8Path, timeout: Option<Duration>) -> Result<UnixStream, ClientError> {
    connect_unix(path, timeout).map_err(|source| ClientError::Connect {
        path: path.to_path_buf(),
        source,
    })
}

fn connect_unix(path: &Utf8Path, timeout: Option<Duration>) -> io::Result<UnixStream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path.as_std_path())?;
    socket.connect_timeout(&address, CONNECTION_TIMEOUT)?;
    let stream = UnixStream::from(OwnedFd::from(socket));
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)?;
    Ok(stream)
}

pub(crate) fn send_request<W: Write>(writer: &mut W, request: &Request) -> Result<(), ClientError> {
    let mut payload = serde_json::to_vec(request).map_err(ClientError::SerialiseRequest)?;
    payload.push(b'\n');
    writer
        .write_all(&payload)
        .and_then(|()| writer.flush())
        .map_err(ClientError::SendRequest)
}

pub(crate) fn read_response<R: io::Read>(reader: R) -> Result<Response, ClientError> {
    let mut line = String::new();
    BufReader::new(reader)
        .read_line(&mut line)
        .map_err(ClientError::ReadResponse)?;
    if line.trim().is_empty() {
        return Err(ClientError::EmptyResponse);
    }
    serde_json::from_str(&line).map_err(ClientError::ParseResponse)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sockrpc_types::TypeTag;

    use super::*;

    #[test]
    fn requests_are_newline_terminated() {
        let request = Request::new("floor", vec![json!(1.5)], vec![TypeTag::Float], json!(1));
        let mut buffer = Vec::new();
        send_request(&mut buffer, &request).expect("send");
        assert_eq!(buffer.last(), Some(&b'\n'));
        let decoded: Request = serde_json::from_slice(&buffer).expect("decode");
        assert_eq!(decoded, request);
    }

    #[test]
    fn empty_stream_is_reported() {
        let error = read_response(io::empty()).expect_err("no response");
        assert!(matches!(error, ClientError::EmptyResponse));
    }

    #[test]
    fn response_without_newline_is_accepted() {
        let raw = br#"{"results":3,"result_type":"int","id":1}"#;
        let response = read_response(&raw[..]).expect("parse");
        assert_eq!(response.into_result(), Ok(json!(3)));
    }

    #[test]
    fn connect_reports_missing_socket() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("absent.sock"))
            .expect("utf8 path");
        let error = connect(&path, None).expect_err("nothing listening");
        assert!(error.is_daemon_not_running());
    }
}
