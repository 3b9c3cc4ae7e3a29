/// Password hashing using Argon2id
///
/// Users set a password when they register through the bot. The password is
/// hashed with Argon2id and the result is stored in two columns:
///
/// - `hashed_password`: the full PHC string (`$argon2id$v=19$m=...$salt$hash`)
/// - `salt`: the per-user salt, also embedded in the PHC string
///
/// Verification parses the PHC string and refuses records whose embedded salt
/// does not match the `salt` column.
///
/// # Parameters
///
/// - Memory: 64 MB
/// - Iterations: 3
/// - Parallelism: 4 lanes
/// - Output: 32 bytes
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hashed = hash_password("qwerty123")?;
/// assert!(verify_password("qwerty123", &hashed.hash, &hashed.salt)?);
/// assert!(!verify_password("qwerty124", &hashed.hash, &hashed.salt)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a valid PHC string or does not match the stored salt
    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

/// Result of hashing a new password
#[derive(Debug, Clone)]
pub struct HashedPassword {
    /// PHC string for the `hashed_password` column
    pub hash: String,

    /// B64 salt for the `salt` column
    pub salt: String,
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with a fresh random salt.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if Argon2 rejects the input.
pub fn hash_password(password: &str) -> Result<HashedPassword, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(HashedPassword {
        hash: hash.to_string(),
        salt: salt.as_str().to_string(),
    })
}

/// Checks a password attempt against a stored hash and salt.
///
/// Returns `Ok(false)` for a wrong password. Errors are reserved for records
/// that cannot be verified at all.
pub fn verify_password(
    password: &str,
    stored_hash: &str,
    stored_salt: &str,
) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match parsed.salt {
        Some(salt) if salt.as_str() == stored_salt => {}
        _ => {
            return Err(PasswordError::InvalidHash(
                "salt does not match stored salt".to_string(),
            ))
        }
    }

    // Parameters are read back from the PHC string.
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_format() {
        let hashed = hash_password("test_password_123").expect("Hash should succeed");

        assert!(hashed.hash.starts_with("$argon2id$v=19$"));
        assert!(hashed.hash.contains("m=65536,t=3,p=4"));
        assert!(hashed.hash.contains(&hashed.salt));
    }

    #[test]
    fn test_fresh_salt_per_hash() {
        let a = hash_password("same").expect("Hash should succeed");
        let b = hash_password("same").expect("Hash should succeed");

        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_verify_password() {
        let hashed = hash_password("correct horse").expect("Hash should succeed");

        assert!(verify_password("correct horse", &hashed.hash, &hashed.salt).unwrap());
        assert!(!verify_password("wrong horse", &hashed.hash, &hashed.salt).unwrap());
        assert!(!verify_password("", &hashed.hash, &hashed.salt).unwrap());
    }

    #[test]
    fn test_verify_rejects_salt_mismatch() {
        let hashed = hash_password("pw").expect("Hash should succeed");
        let other = hash_password("pw").expect("Hash should succeed");

        let result = verify_password("pw", &hashed.hash, &other.salt);
        assert!(matches!(result, Err(PasswordError::InvalidHash(_))));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        let result = verify_password("pw", "not-a-phc-string", "salt");
        assert!(matches!(result, Err(PasswordError::InvalidHash(_))));
    }
}
