//! End-to-end tests driving the daemon over a real Unix socket.

use std::io::Write;
use std::thread;

use rstest::rstest;
use serde_json::{Value, json};
use sockrpc_types::{Response, ResultType};

use super::support::{RunningDaemon, read_line};

fn parse(line: &str) -> Response {
    serde_json::from_str(line).expect("response parses")
}

#[rstest]
#[case::floor("floor", json!([-3.2]), json!(-4), ResultType::Int)]
#[case::nroot("nroot", json!([27, 3]), json!(3.0), ResultType::Float)]
#[case::reverse("reverse", json!(["hello"]), json!("olleh"), ResultType::Str)]
#[case::anagram("validAnagram", json!(["Listen", "SILENT"]), json!(true), ResultType::Bool)]
#[case::sort("sort", json!([[3, 1, 2]]), json!([1, 2, 3]), ResultType::List)]
fn serves_builtin_methods(
    #[case] method: &str,
    #[case] params: Value,
    #[case] expected: Value,
    #[case] result_type: ResultType,
) {
    let daemon = RunningDaemon::start();
    let response = daemon.call(&json!({"method": method, "params": params, "id": 11}));
    assert_eq!(response, Response::success(expected, result_type, json!(11)));
}

#[test]
fn serves_client_that_neither_terminates_nor_half_closes() {
    let daemon = RunningDaemon::start();
    let line = daemon.exchange(
        br#"{"method": "validAnagram", "params": ["listen", "silent"], "param_Types": ["str", "str"], "id": 1}"#,
    );
    assert!(line.ends_with('\n'));
    assert_eq!(
        parse(&line),
        Response::success(Value::Bool(true), ResultType::Bool, json!(1))
    );
}

#[test]
fn serves_half_closed_request() {
    let daemon = RunningDaemon::start();
    let line = daemon.exchange_half_closed(br#"{"method":"floor","params":[2.5],"id":"h"}"#);
    assert_eq!(
        parse(&line),
        Response::success(json!(2), ResultType::Int, json!("h"))
    );
}

#[test]
fn malformed_request_gets_error_with_null_id() {
    let daemon = RunningDaemon::start();
    let response = parse(&daemon.exchange(b"this is not json\n"));
    let Response::Error(error) = response else {
        panic!("expected error response");
    };
    assert_eq!(error.id, Value::Null);
    assert!(error.error.starts_with("malformed request"), "{}", error.error);
}

#[test]
fn unknown_method_keeps_id() {
    let daemon = RunningDaemon::start();
    let response = daemon.call(&json!({"method": "sqrt", "params": [4], "id": 42}));
    assert_eq!(response, Response::error("method 'sqrt' not found", json!(42)));
}

#[test]
fn oversized_request_is_rejected() {
    let daemon = RunningDaemon::start_with(|config| config.max_request_bytes = 64);
    let padding = "x".repeat(200);
    let raw = format!("{{\"method\":\"reverse\",\"params\":[\"{padding}\"],\"id\":1}}\n");
    let response = parse(&daemon.exchange(raw.as_bytes()));
    let Response::Error(error) = response else {
        panic!("expected error response");
    };
    assert!(error.error.contains("too large"), "{}", error.error);
    assert_eq!(error.id, Value::Null);
}

#[test]
fn connection_closes_after_one_response() {
    let daemon = RunningDaemon::start();
    let mut stream = daemon.connect();
    stream
        .write_all(b"{\"method\":\"reverse\",\"params\":[\"ab\"],\"id\":1}\n")
        .expect("write request");
    let first = read_line(&stream);
    assert!(!first.is_empty());

    let second = read_line(&stream);
    assert!(second.is_empty(), "daemon should close after responding");
}

#[test]
fn silent_client_does_not_block_others() {
    let daemon = RunningDaemon::start();
    let _silent = daemon.connect();

    let response = daemon.call(&json!({"method": "reverse", "params": ["abc"], "id": 2}));
    assert_eq!(response.into_result(), Ok(json!("cba")));
}

#[test]
fn silent_client_is_timed_out() {
    let daemon = RunningDaemon::start_with(|config| config.io_timeout_ms = 50);
    let silent = daemon.connect();
    assert!(read_line(&silent).is_empty(), "idle connection should be closed");
}

#[test]
fn serves_concurrent_clients() {
    let daemon = RunningDaemon::start();
    thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|index| {
                let daemon = &daemon;
                scope.spawn(move || {
                    let word = format!("word{index}");
                    let response =
                        daemon.call(&json!({"method": "reverse", "params": [word], "id": index}));
                    (index, response)
                })
            })
            .collect();
        for worker in workers {
            let (index, response) = worker.join().expect("worker thread");
            assert_eq!(response.id(), &json!(index));
            let expected: String = format!("word{index}").chars().rev().collect();
            assert_eq!(response.into_result(), Ok(json!(expected)));
        }
    });
}
