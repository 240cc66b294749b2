// ABOUTME: Tests for ProtectionParams - builder validation, scope ordering,
// ABOUTME: and the slow_down backoff policies.

use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::error::GuardError;
use crate::store::InMemoryStore;

fn builder() -> ProtectionParamsBuilder<String> {
    ProtectionParams::builder("user-1", "Approve transfer")
        .on_rejection(|rejection: Rejection| async move { rejection.reason })
}

#[test]
fn test_build_minimal() {
    let params = builder().build().unwrap();
    assert_eq!(params.user_id(), "user-1");
    assert_eq!(params.binding_message(), "Approve transfer");
    assert_eq!(params.mode(), Mode::Block);
    assert_eq!(params.slow_down(), SlowDownPolicy::default());
    assert!(params.scopes().is_empty());
    assert!(params.store().is_none());
}

#[test]
fn test_scopes_are_ordered_set() {
    let params = builder()
        .scope("openid")
        .scopes(["stock:trade", "openid", "email"])
        .scope("stock:trade")
        .scope("")
        .build()
        .unwrap();

    assert_eq!(params.scopes(), ["openid", "stock:trade", "email"]);
}

#[test]
fn test_missing_rejection_handler() {
    let result = ProtectionParams::<String>::builder("u", "m").build();
    match result {
        Err(GuardError::Configuration(msg)) => assert!(msg.contains("rejection handler")),
        other => panic!("Expected Configuration error, got {:?}", other),
    }
}

#[test]
fn test_empty_user_or_message() {
    let no_user = ProtectionParams::builder(" ", "m")
        .on_rejection(|_| async {})
        .build();
    assert!(matches!(no_user, Err(GuardError::Configuration(_))));

    let no_message = ProtectionParams::builder("u", "")
        .on_rejection(|_| async {})
        .build();
    assert!(matches!(no_message, Err(GuardError::Configuration(_))));
}

#[test]
fn test_interrupt_requires_store() {
    let result = builder().mode(Mode::Interrupt).build();
    assert!(matches!(result, Err(GuardError::Configuration(_))));

    let params = builder()
        .mode(Mode::Interrupt)
        .store(Arc::new(InMemoryStore::new()))
        .build()
        .unwrap();
    assert_eq!(params.mode(), Mode::Interrupt);
    assert!(params.store().is_some());
}

#[tokio::test]
async fn test_rejection_handler_invoked() {
    let params = builder().build().unwrap();
    let result = (params.rejection_handler())(Rejection::denied("r1", "nope")).await;
    assert_eq!(result, "nope");
}

#[test]
fn test_slow_down_increment() {
    let policy = SlowDownPolicy::Increment(Duration::from_secs(5));
    assert_eq!(policy.apply(Duration::from_secs(2)), Duration::from_secs(7));
    assert_eq!(
        SlowDownPolicy::default().apply(Duration::from_secs(1)),
        Duration::from_secs(6)
    );
}

#[test]
fn test_slow_down_zero_increment_still_grows() {
    let policy = SlowDownPolicy::Increment(Duration::ZERO);
    let interval = Duration::from_millis(10);
    assert!(policy.apply(interval) > interval);
}

#[test]
fn test_slow_down_double() {
    let policy = SlowDownPolicy::Double;
    assert_eq!(
        policy.apply(Duration::from_micros(100)),
        Duration::from_micros(200)
    );
    assert_eq!(policy.apply(Duration::MAX), Duration::MAX);
}

#[test]
fn test_rejection_constructors() {
    let denied = Rejection::denied("r1", "User said no");
    assert_eq!(denied.kind, RejectionKind::Denied);
    assert_eq!(denied.to_string(), "User said no");

    let expired = Rejection::expired("r2");
    assert_eq!(expired.kind, RejectionKind::Expired);
    assert_eq!(expired.request_id, "r2");
    assert!(expired.reason.contains("expired"));
}
