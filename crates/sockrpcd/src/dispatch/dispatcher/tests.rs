//! Request lifecycle tests for the dispatcher.

use rstest::{fixture, rstest};
use serde_json::{Value, json};
use sockrpc_types::{ErrorResponse, Response, ResultType, SuccessResponse};

use super::*;
use crate::dispatch::ErrorKind;

#[fixture]
fn dispatcher() -> Dispatcher {
    Dispatcher::default()
}

fn respond(dispatcher: &Dispatcher, request: &Value) -> Response {
    let raw = serde_json::to_vec(request).expect("encode request");
    dispatcher.respond(&raw)
}

fn expect_success(response: Response) -> SuccessResponse {
    match response {
        Response::Success(success) => success,
        Response::Error(error) => panic!("expected success, got error: {}", error.error),
    }
}

fn expect_error(response: Response) -> ErrorResponse {
    match response {
        Response::Error(error) => error,
        Response::Success(success) => panic!("expected error, got {:?}", success.results),
    }
}

#[rstest]
#[case::floor("floor", json!([-3.2]), json!(-4), ResultType::Int)]
#[case::floor_positive("floor", json!([3.7]), json!(3), ResultType::Int)]
#[case::reverse("reverse", json!(["hello"]), json!("olleh"), ResultType::Str)]
#[case::reverse_empty("reverse", json!([""]), json!(""), ResultType::Str)]
#[case::anagram("validAnagram", json!(["listen", "silent"]), json!(true), ResultType::Bool)]
#[case::anagram_case("validAnagram", json!(["Listen", "SILENT"]), json!(true), ResultType::Bool)]
#[case::not_anagram("validAnagram", json!(["abc", "abd"]), json!(false), ResultType::Bool)]
#[case::sort(
    "sort",
    json!([["cat", "dog", "apple"]]),
    json!(["apple", "cat", "dog"]),
    ResultType::List
)]
#[case::nroot("nroot", json!([27, 3]), json!(3.0), ResultType::Float)]
fn dispatches_builtins(
    dispatcher: Dispatcher,
    #[case] method: &str,
    #[case] params: Value,
    #[case] expected: Value,
    #[case] expected_type: ResultType,
) {
    let params = params.as_array().cloned().expect("params array");
    let dispatched = dispatcher.dispatch(method, &params).expect("dispatch");
    assert_eq!(dispatched.results, expected);
    assert_eq!(dispatched.result_type, expected_type);
}

#[rstest]
#[case::zeroth_root_of_zero(json!([0, 0]))]
#[case::even_root_of_negative(json!([-8, 2]))]
fn nroot_rejects_invalid_arguments(dispatcher: Dispatcher, #[case] params: Value) {
    let params = params.as_array().cloned().expect("params array");
    let error = dispatcher.dispatch("nroot", &params).expect_err("should fail");
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
}

#[rstest]
fn sort_reports_long_mixed_lists_as_invalid_arguments(dispatcher: Dispatcher) {
    let items: Vec<Value> = (0..300_u32)
        .map(|index| {
            if index % 2 == 0 {
                json!(format!("item-{index}"))
            } else {
                json!(index)
            }
        })
        .collect();
    let error = dispatcher
        .dispatch("sort", &[Value::Array(items)])
        .expect_err("mixed kinds");
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
}

#[rstest]
fn unknown_method_preserves_id(dispatcher: Dispatcher) {
    let response = respond(
        &dispatcher,
        &json!({"method": "nonexistent", "params": [], "id": 42}),
    );
    let encoded = serde_json::to_value(&response).expect("encode");
    assert!(encoded.get("results").is_none());

    let error = expect_error(response);
    assert_eq!(error.id, json!(42));
    assert!(error.error.contains("not found"), "{}", error.error);
}

#[rstest]
#[case::too_few(json!([]))]
#[case::too_many(json!(["a", "b"]))]
fn arity_mismatch_never_yields_results(dispatcher: Dispatcher, #[case] params: Value) {
    let response = respond(
        &dispatcher,
        &json!({"method": "reverse", "params": params, "id": "r1"}),
    );
    let error = expect_error(response);
    assert_eq!(error.id, json!("r1"));
    assert!(error.error.contains("expects 1 parameter"), "{}", error.error);
}

#[rstest]
fn registry_types_override_caller_types(dispatcher: Dispatcher) {
    // The caller claims `str` for both parameters; coercion still follows
    // the registry's [int, float] schema.
    let response = respond(
        &dispatcher,
        &json!({
            "method": "nroot",
            "params": ["16", "2"],
            "param_types": ["str", "str"],
            "id": 1
        }),
    );
    let success = expect_success(response);
    assert_eq!(success.results, json!(4.0));
    assert_eq!(success.result_type, ResultType::Float);
}

#[rstest]
fn caller_types_cannot_force_incompatible_coercion(dispatcher: Dispatcher) {
    let response = respond(
        &dispatcher,
        &json!({
            "method": "floor",
            "params": ["abc"],
            "param_types": ["str"],
            "id": 2
        }),
    );
    let error = expect_error(response);
    assert!(error.error.contains("expects float"), "{}", error.error);
}

#[rstest]
fn accepts_legacy_client_request_shape(dispatcher: Dispatcher) {
    let response = dispatcher.respond(
        br#"{"method":"nroot","params":[16,2],"param_Types":["int","int"],"id":5}"#,
    );
    let success = expect_success(response);
    assert_eq!(success.results, json!(4.0));
    assert_eq!(success.id, json!(5));
}

#[rstest]
fn malformed_json_yields_null_id(dispatcher: Dispatcher) {
    let error = expect_error(dispatcher.respond(b"{not json"));
    assert_eq!(error.id, Value::Null);
    assert!(error.error.starts_with("malformed request"), "{}", error.error);
}

#[rstest]
fn missing_method_keeps_recoverable_id(dispatcher: Dispatcher) {
    let error = expect_error(respond(&dispatcher, &json!({"params": [1], "id": "x"})));
    assert_eq!(error.id, json!("x"));
    assert!(error.error.contains("method"), "{}", error.error);
}

#[rstest]
fn missing_id_echoes_null(dispatcher: Dispatcher) {
    let success = expect_success(respond(
        &dispatcher,
        &json!({"method": "reverse", "params": ["ab"]}),
    ));
    assert_eq!(success.id, Value::Null);
}

#[rstest]
#[case::success(json!({"method": "sort", "params": [[3, 1, 2]], "id": 1}))]
#[case::type_error(json!({"method": "sort", "params": ["abc"], "id": 2}))]
#[case::incomparable(json!({"method": "sort", "params": [["a", 1]], "id": 3}))]
#[case::unknown(json!({"method": "nope", "id": [1, 2]}))]
#[case::not_object(json!("floor"))]
fn every_response_round_trips_to_one_shape(dispatcher: Dispatcher, #[case] request: Value) {
    let response = respond(&dispatcher, &request);
    let encoded = serde_json::to_string(&response).expect("encode");
    let decoded: Value = serde_json::from_str(&encoded).expect("valid json");
    let has_results = decoded.get("results").is_some();
    let has_error = decoded.get("error").is_some();
    assert!(has_results != has_error, "exactly one shape: {encoded}");

    let reparsed: Response = serde_json::from_str(&encoded).expect("parses as envelope");
    assert_eq!(reparsed, response);
}

#[rstest]
#[case(json!(true), ResultType::Bool)]
#[case(json!(false), ResultType::Bool)]
#[case(json!(1), ResultType::Int)]
#[case(json!(u64::MAX), ResultType::Int)]
#[case(json!(1.5), ResultType::Float)]
#[case(json!("s"), ResultType::Str)]
#[case(json!([]), ResultType::List)]
#[case(json!(null), ResultType::Unknown)]
#[case(json!({"a": 1}), ResultType::Unknown)]
fn classifies_results(#[case] value: Value, #[case] expected: ResultType) {
    assert_eq!(classify(&value), expected);
}

#[test]
fn panic_payloads_become_messages() {
    let payload: Box<dyn Any + Send> = Box::new("boom");
    assert_eq!(panic_message(payload.as_ref()), "boom");
    let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
    assert_eq!(panic_message(payload.as_ref()), "bang");
    let payload: Box<dyn Any + Send> = Box::new(7_u8);
    assert_eq!(panic_message(payload.as_ref()), "procedure panicked");
}
