//! Tests for error classification and the retry policy

use super::*;
use crate::config::BackoffConfig;
use crate::error::{ApiError, Error};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use test_case::test_case;

fn oauth(code: i64) -> ApiError {
    ApiError::new(Some(400), "oauth").with_type("OAuthException").with_code(code)
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(BackoffConfig::constant(Duration::from_millis(1), max_attempts))
}

// ============================================================================
// Classifier Tests
// ============================================================================

#[test_case(1 ; "unknown api error")]
#[test_case(2 ; "service temporarily unavailable")]
#[test_case(4 ; "app request limit")]
#[test_case(17 ; "user request limit")]
#[test_case(341 ; "application limit")]
#[test_case(368 ; "temporarily blocked")]
fn test_retryable_oauth_codes(code: i64) {
    assert_eq!(classify(&oauth(code)), Verdict::Retryable);
}

#[test_case(4)]
#[test_case(17)]
#[test_case(32)]
#[test_case(613)]
fn test_rate_limit_codes_without_type(code: i64) {
    let err = ApiError::new(Some(400), "limit").with_code(code);
    assert_eq!(classify(&err), Verdict::Retryable);
}

#[test]
fn test_http_429_is_retryable() {
    assert_eq!(
        classify(&ApiError::new(Some(429), "Too Many Requests")),
        Verdict::Retryable
    );
}

#[test]
fn test_object_not_ready_is_retryable() {
    let err = ApiError::new(Some(400), "Unsupported get request")
        .with_code(100)
        .with_subcode(33);
    assert_eq!(classify(&err), Verdict::Retryable);

    // Same code and subcode on another status is not the race
    let err = ApiError::new(Some(500), "Unsupported get request")
        .with_code(100)
        .with_subcode(33);
    assert_eq!(classify(&err), Verdict::Fatal);
}

#[test]
fn test_transient_flag_is_retryable() {
    let err = ApiError::new(Some(500), "An unexpected error has occurred")
        .with_code(2_000)
        .with_transient(true);
    assert_eq!(classify(&err), Verdict::Retryable);
    assert_eq!(classify(&ApiError::transient("timed out")), Verdict::Retryable);
}

#[test]
fn test_not_enough_viewers_is_expected_empty() {
    let err = ApiError::new(
        Some(400),
        "(#10) Not enough viewers for the media to show insights",
    )
    .with_code(10)
    .with_type("OAuthException");
    assert_eq!(classify(&err), Verdict::ExpectedEmpty);
    assert!(is_too_few_viewers(&err));
}

#[test]
fn test_code_10_without_viewer_message_is_fatal() {
    let err = ApiError::new(Some(400), "(#10) Application does not have permission")
        .with_code(10)
        .with_type("OAuthException");
    assert_eq!(classify(&err), Verdict::Fatal);
}

#[test]
fn test_pre_conversion_media_is_expected_empty() {
    let err = ApiError::new(Some(400), "Invalid parameter")
        .with_code(100)
        .with_subcode(2_108_006);
    assert_eq!(classify(&err), Verdict::ExpectedEmpty);
    assert!(is_pre_conversion_media(&err));
}

#[test]
fn test_transient_wins_over_pre_conversion() {
    let err = ApiError::new(Some(400), "flaky")
        .with_subcode(2_108_006)
        .with_transient(true);
    assert_eq!(classify(&err), Verdict::Retryable);
}

#[test_case(ApiError::new(Some(400), "Invalid parameter").with_code(100) ; "invalid parameter")]
#[test_case(ApiError::new(Some(403), "forbidden").with_code(200) ; "permission")]
#[test_case(oauth(190) ; "expired token")]
#[test_case(ApiError::new(Some(500), "boom") ; "bare server error")]
#[test_case(ApiError::default() ; "empty error")]
fn test_everything_else_is_fatal(err: ApiError) {
    assert_eq!(classify(&err), Verdict::Fatal);
}

// ============================================================================
// Retry Policy Tests
// ============================================================================

#[tokio::test]
async fn test_retry_until_success() {
    let policy = fast_policy(5);
    let counter = AtomicU32::new(0);
    let calls = &counter;

    let result = policy
        .run("profile", move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(Error::Api(ApiError::new(Some(429), "slow down")))
            } else {
                Ok(n)
            }
        })
        .await
        .unwrap();

    assert_eq!(result, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(policy.retries(), 2);
}

#[tokio::test]
async fn test_retry_ceiling_becomes_fatal() {
    let policy = fast_policy(3);
    let counter = AtomicU32::new(0);
    let calls = &counter;

    let err = policy
        .run("media", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Error::Api(ApiError::new(Some(400), "limit").with_code(613)))
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(err.verdict(), Verdict::Fatal);
}

#[tokio::test]
async fn test_fatal_is_not_retried() {
    let policy = fast_policy(5);
    let counter = AtomicU32::new(0);
    let calls = &counter;

    let err = policy
        .run("media", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Error::Api(ApiError::new(Some(400), "bad").with_code(100)))
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(err, Error::Api(_)));
    assert_eq!(policy.retries(), 0);
}

#[tokio::test]
async fn test_expected_empty_is_surfaced_without_retry() {
    let policy = fast_policy(5);
    let counter = AtomicU32::new(0);
    let calls = &counter;

    let err = policy
        .run("media_insights", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Error::Api(
                ApiError::new(Some(400), "too old").with_subcode(2_108_006),
            ))
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(err.is_expected_empty());
    assert!(is_pre_conversion_media(err.api_error().unwrap()));
}

#[tokio::test]
async fn test_non_api_errors_pass_through() {
    let policy = fast_policy(5);
    let counter = AtomicU32::new(0);
    let calls = &counter;

    let err = policy
        .run("users", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Error::decode("not json"))
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(err, Error::Decode { .. }));
}
