//! Error classifier
//!
//! Rules are evaluated in order and the first match wins.

use crate::error::ApiError;

/// OAuth error codes that indicate a transient token or session fault
const RETRYABLE_OAUTH_CODES: [i64; 6] = [1, 2, 4, 17, 341, 368];

/// Rate limiting error codes
const RATE_LIMIT_CODES: [i64; 4] = [4, 17, 32, 613];

/// Subcode for media published before the business-account conversion
pub(crate) const PRE_CONVERSION_SUBCODE: i64 = 2_108_006;

/// What to do about a failed upstream call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Transient; try again after a backoff
    Retryable,
    /// Legitimately no data; the call site picks a fallback
    ExpectedEmpty,
    /// Give up and fail the run
    Fatal,
}

/// Classify a failed Graph API call
pub fn classify(err: &ApiError) -> Verdict {
    let code = err.code;

    if err.error_type.as_deref() == Some("OAuthException")
        && code.is_some_and(|c| RETRYABLE_OAUTH_CODES.contains(&c))
    {
        return Verdict::Retryable;
    }

    if code.is_some_and(|c| RATE_LIMIT_CODES.contains(&c)) {
        return Verdict::Retryable;
    }

    if err.http_status == Some(429) {
        return Verdict::Retryable;
    }

    if is_too_few_viewers(err) {
        return Verdict::ExpectedEmpty;
    }

    // Object not ready yet, seen right after insight window boundaries
    if err.http_status == Some(400) && code == Some(100) && err.error_subcode == Some(33) {
        return Verdict::Retryable;
    }

    if err.is_transient {
        return Verdict::Retryable;
    }

    if is_pre_conversion_media(err) {
        return Verdict::ExpectedEmpty;
    }

    Verdict::Fatal
}

/// Audience too small for insights to be computed
pub fn is_too_few_viewers(err: &ApiError) -> bool {
    err.code == Some(10) && err.message.contains("Not enough viewers")
}

/// Media posted before the account became a business account
pub fn is_pre_conversion_media(err: &ApiError) -> bool {
    err.error_subcode == Some(PRE_CONVERSION_SUBCODE)
}
