//! Check payload encoding and response parsing against the JSON test vectors
//! in `test-vectors/`.
//!
//! Payload cases compare raw strings, since the exact bytes are the point.
//! Response cases compare parsed JSON, or the start of the failure cause.

use data_request_core::{create_payload, ClientConfig, HttpClient, HttpRequest, HttpResponse, TransportError};
use serde_json::Value;

fn client() -> HttpClient<fn(&HttpRequest) -> Result<HttpResponse, TransportError>> {
    fn unreachable(_: &HttpRequest) -> Result<HttpResponse, TransportError> {
        Err(TransportError::connect("no network in vector tests"))
    }
    HttpClient::with_transport(
        ClientConfig::new("vector-key", "localhost", "3000", false),
        unreachable as fn(&HttpRequest) -> Result<HttpResponse, TransportError>,
    )
}

#[test]
fn payload_test_vectors() {
    let raw = include_str!("../../test-vectors/payloads.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected = case["expected"].as_str().unwrap();

        assert_eq!(create_payload(&case["input"]).unwrap(), expected, "{name}");
        assert_eq!(client().create_payload(&case["input"]).unwrap(), expected, "{name}: via client");

        // Decoding the canonical form gives back the input.
        let decoded: Value = serde_json::from_str(expected).unwrap();
        assert_eq!(decoded, case["input"], "{name}: decode");
    }
}

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let response = HttpResponse {
            status: u16::try_from(case["status"].as_u64().unwrap()).unwrap(),
            headers: Vec::new(),
            body: case["body"].as_str().unwrap().to_string(),
        };

        match case.get("error").and_then(Value::as_str) {
            Some(prefix) => {
                let err = c.parse_response(response).unwrap_err();
                assert!(err.cause().starts_with(prefix), "{name}: {err}");
            }
            None => {
                let envelope = c.parse_response(response).unwrap();
                assert_eq!(Value::Object(envelope), case["expected"], "{name}");
            }
        }
    }
}
