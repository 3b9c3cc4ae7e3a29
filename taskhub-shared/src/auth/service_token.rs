/// Shared service token
///
/// The bot is the only client of the API and authenticates every request with
/// one static token configured through `API_KEY`. The token is never stored in
/// the database; it is held in memory and compared in constant time.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::service_token::ServiceToken;
///
/// let token = ServiceToken::new("bot-secret");
/// assert!(token.matches("bot-secret"));
/// assert!(!token.matches("bot-secreT"));
/// ```

use std::fmt;
use std::sync::Arc;

/// The configured token, cheap to clone into request state.
#[derive(Clone)]
pub struct ServiceToken(Arc<str>);

impl ServiceToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::from(token.into()))
    }

    /// Constant-time check of a presented token.
    pub fn matches(&self, presented: &str) -> bool {
        constant_time_compare(&self.0, presented)
    }
}

// Keep the secret out of logs and panics.
impl fmt::Debug for ServiceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServiceToken(***)")
    }
}

/// Compares two strings without short-circuiting on the first differing byte.
///
/// Only the length is observable through timing.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_service_token_matches() {
        let token = ServiceToken::new("s3cret");
        assert!(token.matches("s3cret"));
        assert!(!token.matches(""));
        assert!(!token.matches("S3cret"));
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let token = ServiceToken::new("s3cret");
        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("s3cret"));
    }
}
