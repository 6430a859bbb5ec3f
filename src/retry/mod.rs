//! Upstream error classification and retry
//!
//! Decides which Graph API failures are worth retrying and retries them.
//!
//! # Overview
//!
//! The retry module provides:
//! - `classify` - Pure verdict over an [`ApiError`](crate::error::ApiError)
//! - `Verdict` - Retryable, expected-empty, or fatal
//! - `RetryPolicy` - Deterministic backoff around any fallible upstream call
//!
//! Classification never looks at attempt counts, and the policy never looks
//! at vendor codes; the two meet only through `Verdict`.

mod classify;
mod policy;

pub use classify::{classify, is_pre_conversion_media, is_too_few_viewers, Verdict};
pub use policy::RetryPolicy;

#[cfg(test)]
mod tests;
