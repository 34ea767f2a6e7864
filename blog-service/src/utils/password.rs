use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::fmt;
use std::sync::OnceLock;

/// Newtype for password to prevent accidental logging
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// Newtype for password hash
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash a password using Argon2id with a random salt.
///
/// Fails only if the hasher itself fails (entropy source or parameters).
pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(PasswordHashString::new(password_hash))
}

/// Verify a password against a stored hash.
///
/// A malformed hash verifies as `false`; it is never an error.
pub fn verify_password(password: &Password, password_hash: &PasswordHashString) -> bool {
    match PasswordHash::new(password_hash.as_str()) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_str().as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

/// Burn one verification against a throwaway hash.
///
/// Used when there is no real hash to check so that response time does not
/// reveal whether an account exists.
pub fn verify_against_dummy(password: &Password) {
    static DUMMY_HASH: OnceLock<Option<PasswordHashString>> = OnceLock::new();

    let dummy = DUMMY_HASH.get_or_init(|| {
        hash_password(&Password::new("dummy-password-for-timing".to_string())).ok()
    });

    if let Some(hash) = dummy {
        let _ = verify_password(password, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(hash.as_str().starts_with("$argon2"));
    }

    #[test]
    fn test_verify_password_correct_and_incorrect() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(verify_password(&password, &hash));
        assert!(!verify_password(
            &Password::new("wrongPassword".to_string()),
            &hash
        ));
    }

    #[test]
    fn test_malformed_hash_is_false_not_error() {
        let password = Password::new("mySecurePassword123".to_string());
        let garbage = PasswordHashString::new("not-a-phc-string".to_string());

        assert!(!verify_password(&password, &garbage));
    }

    #[test]
    fn test_salts_differ() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash1 = hash_password(&password).expect("Failed to hash password");
        let hash2 = hash_password(&password).expect("Failed to hash password");

        assert_ne!(hash1.as_str(), hash2.as_str());
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("hunter2hunter2".to_string());
        assert!(!format!("{:?}", password).contains("hunter2"));
        assert_eq!(password.char_len(), 14);
    }
}
