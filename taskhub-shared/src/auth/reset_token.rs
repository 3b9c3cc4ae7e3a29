/// Password reset tokens
///
/// A reset token is a random base62 string handed to the bot once. Only its
/// SHA-256 digest is persisted, so a database leak does not expose live
/// tokens.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of the plaintext token
pub const RESET_TOKEN_LENGTH: usize = 32;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A freshly generated token. `token` is shown to the user, `token_hash` is stored.
#[derive(Debug, Clone)]
pub struct IssuedResetToken {
    pub token: String,
    pub token_hash: String,
    pub expire_date: DateTime<Utc>,
}

/// Generates a token valid for `ttl` from now.
pub fn issue_reset_token(ttl: Duration) -> IssuedResetToken {
    let mut rng = rand::thread_rng();
    let token: String = (0..RESET_TOKEN_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();

    IssuedResetToken {
        token_hash: hash_reset_token(&token),
        token,
        expire_date: Utc::now() + ttl,
    }
}

/// Hex SHA-256 of a token.
pub fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
