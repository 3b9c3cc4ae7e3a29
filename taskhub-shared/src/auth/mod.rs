/// Authentication primitives
///
/// # Modules
///
/// - [`service_token`]: the static token the bot authenticates with
/// - [`middleware`]: axum middleware and header parsing for that token
/// - [`password`]: Argon2id hashing of user passwords
/// - [`reset_token`]: one-time password reset tokens

pub mod middleware;
pub mod password;
pub mod reset_token;
pub mod service_token;
