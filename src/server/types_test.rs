// ABOUTME: Tests for wire parsing - authorize replies, token replies, error codes.
// ABOUTME: Runs without a network against literal response bodies.

use std::time::Duration;

use serde_json::json;

use super::*;
use crate::error::{GrantError, InitiationError};

fn body(value: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&value).unwrap()
}

#[test]
fn test_parse_authorize_success() {
    let response = parse_authorize_response(
        200,
        &body(json!({"auth_req_id": "r1", "expires_in": 300, "interval": 2})),
    )
    .unwrap();

    assert_eq!(response.request_id, "r1");
    assert_eq!(response.expires_in, Duration::from_secs(300));
    assert_eq!(response.interval, Duration::from_secs(2));
}

#[test]
fn test_parse_authorize_fractional_seconds() {
    let response = parse_authorize_response(
        200,
        &body(json!({"auth_req_id": "r1", "expires_in": 3600, "interval": 0.0001})),
    )
    .unwrap();

    assert_eq!(response.interval, Duration::from_secs_f64(0.0001));
}

#[test]
fn test_parse_authorize_default_interval() {
    let response =
        parse_authorize_response(200, &body(json!({"auth_req_id": "r1", "expires_in": 120})))
            .unwrap();

    assert_eq!(response.interval, DEFAULT_POLL_INTERVAL);
}

#[test]
fn test_parse_authorize_negative_expiry_is_invalid() {
    let result =
        parse_authorize_response(200, &body(json!({"auth_req_id": "r1", "expires_in": -1})));

    assert!(matches!(result, Err(InitiationError::InvalidResponse(_))));
}

#[test]
fn test_parse_authorize_missing_request_id_is_invalid() {
    let result = parse_authorize_response(200, &body(json!({"expires_in": 10})));
    assert!(matches!(result, Err(InitiationError::InvalidResponse(_))));
}

#[test]
fn test_parse_authorize_api_error() {
    let result = parse_authorize_response(
        400,
        &body(json!({"error": "unknown_user_id", "error_description": "no such user"})),
    );

    match result {
        Err(InitiationError::Api {
            status,
            error,
            description,
        }) => {
            assert_eq!(status, 400);
            assert_eq!(error, "unknown_user_id");
            assert_eq!(description.as_deref(), Some("no such user"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[test]
fn test_parse_authorize_non_json_error() {
    let result = parse_authorize_response(502, b"Bad Gateway");
    match result {
        Err(InitiationError::Api { status, error, .. }) => {
            assert_eq!(status, 502);
            assert_eq!(error, "http_error");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[test]
fn test_parse_token_success() {
    let credential = parse_token_response(
        200,
        &body(json!({
            "access_token": "tok",
            "token_type": "Bearer",
            "expires_in": 86400,
            "scope": "openid stock:trade",
            "id_token": "eyJ..."
        })),
    )
    .unwrap();

    assert_eq!(credential.access_token, "tok");
    assert_eq!(credential.token_type, "Bearer");
    assert_eq!(credential.expires_in, Some(Duration::from_secs(86400)));
    assert_eq!(credential.scope.as_deref(), Some("openid stock:trade"));
    assert!(credential.id_token.is_some());
}

#[test]
fn test_parse_token_defaults_token_type() {
    let credential = parse_token_response(200, &body(json!({"access_token": "tok"}))).unwrap();
    assert_eq!(credential.token_type, "Bearer");
    assert_eq!(credential.authorization_header(), "Bearer tok");
}

#[test]
fn test_parse_token_error_codes() {
    let cases = [
        ("authorization_pending", GrantErrorCode::AuthorizationPending),
        ("slow_down", GrantErrorCode::SlowDown),
        ("access_denied", GrantErrorCode::AccessDenied),
        ("expired_token", GrantErrorCode::ExpiredToken),
        ("invalid_grant", GrantErrorCode::Other("invalid_grant".to_string())),
    ];

    for (wire, expected) in cases {
        let err = parse_token_response(400, &body(json!({"error": wire}))).unwrap_err();
        assert_eq!(err.code(), expected, "code {}", wire);
        assert_eq!(err.code().as_str(), wire);
    }
}

#[test]
fn test_parse_token_error_description() {
    let err = parse_token_response(
        403,
        &body(json!({"error": "access_denied", "error_description": "User rejected"})),
    )
    .unwrap_err();

    assert_eq!(err.description(), Some("User rejected"));
}

#[test]
fn test_parse_token_garbage_is_other() {
    let err = parse_token_response(500, b"<html>oops</html>").unwrap_err();
    assert!(matches!(err, GrantError::InvalidResponse(_)));
    assert!(matches!(err.code(), GrantErrorCode::Other(_)));
}

#[test]
fn test_parse_token_empty_access_token() {
    let err = parse_token_response(200, &body(json!({"access_token": ""}))).unwrap_err();
    assert!(matches!(err, GrantError::InvalidResponse(_)));
}
