//! Password hashing, verification and strength policy.
//!
//! DDD: Encapsulates password handling as a domain value object.
//! The `CredentialVerifier` trait is the seam services depend on, so the
//! work factor is configured once and tests can observe verifier calls.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde::Serialize;

use crate::config::{HashSettings, MIN_PASSWORD_LENGTH, PASSWORD_SYMBOLS};
use crate::errors::{AppError, AppResult};

/// A single password strength rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordRule {
    MinLength,
    Uppercase,
    Lowercase,
    Digit,
    Symbol,
}

impl PasswordRule {
    /// Human-readable description of the rule
    pub fn message(&self) -> &'static str {
        match self {
            PasswordRule::MinLength => "Password must be at least 8 characters long",
            PasswordRule::Uppercase => "Password must contain at least one uppercase letter",
            PasswordRule::Lowercase => "Password must contain at least one lowercase letter",
            PasswordRule::Digit => "Password must contain at least one number",
            PasswordRule::Symbol => "Password must contain at least one special character",
        }
    }
}

/// Outcome of a strength check, listing every violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PasswordStrength {
    pub violations: Vec<PasswordRule>,
}

impl PasswordStrength {
    /// Evaluate every rule against `plain_text` without short-circuiting.
    pub fn check(plain_text: &str) -> Self {
        let mut violations = Vec::new();

        if plain_text.chars().count() < MIN_PASSWORD_LENGTH {
            violations.push(PasswordRule::MinLength);
        }
        if !plain_text.chars().any(|c| c.is_uppercase()) {
            violations.push(PasswordRule::Uppercase);
        }
        if !plain_text.chars().any(|c| c.is_lowercase()) {
            violations.push(PasswordRule::Lowercase);
        }
        if !plain_text.chars().any(|c| c.is_ascii_digit()) {
            violations.push(PasswordRule::Digit);
        }
        if !plain_text.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
            violations.push(PasswordRule::Symbol);
        }

        Self { violations }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Convert into a `WeakPassword` error when any rule failed.
    pub fn into_result(self) -> AppResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(AppError::WeakPassword(self.violations))
        }
    }
}

/// Password hash value object.
///
/// DDD: Value object - immutable, compared by value.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output (security)
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Create a Password from an existing hash (from database).
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Password {}

/// Slow, salted one-way hashing and verification of passwords.
pub trait CredentialVerifier: Send + Sync {
    /// Hash a plain text password with a fresh salt.
    fn hash(&self, plain_text: &str) -> AppResult<Password>;

    /// Verify a plain text password. Malformed hashes verify as `false`.
    fn verify(&self, plain_text: &str, hash: &Password) -> bool;
}

/// Argon2id implementation of [`CredentialVerifier`].
#[derive(Debug, Clone)]
pub struct Argon2Credentials {
    params: Params,
}

impl Argon2Credentials {
    /// Build a verifier with the given work factor.
    pub fn new(settings: HashSettings) -> AppResult<Self> {
        let params = Params::new(
            settings.memory_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(|e| AppError::internal(format!("Invalid password hash settings: {}", e)))?;
        Ok(Self { params })
    }

    /// Get Argon2 instance with the configured work factor.
    #[inline]
    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialVerifier for Argon2Credentials {
    fn hash(&self, plain_text: &str) -> AppResult<Password> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?;
        Ok(Password::from_hash(hash.to_string()))
    }

    fn verify(&self, plain_text: &str, hash: &Password) -> bool {
        match PasswordHash::new(hash.as_str()) {
            // Argon2 compares digests in constant time
            Ok(parsed) => self
                .argon2()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> Argon2Credentials {
        Argon2Credentials::new(HashSettings {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_password_hash_and_verify() {
        let credentials = verifier();
        let plain = "SecurePassword123!";
        let password = credentials.hash(plain).unwrap();

        assert!(credentials.verify(plain, &password));
        assert!(!credentials.verify("WrongPassword123!", &password));
    }

    #[test]
    fn test_password_from_hash() {
        let credentials = verifier();
        let plain = "TestPassword123!";
        let hash = credentials.hash(plain).unwrap().into_string();

        let restored = Password::from_hash(hash);
        assert!(credentials.verify(plain, &restored));
    }

    #[test]
    fn test_same_password_different_salts() {
        let credentials = verifier();
        let plain = "SamePassword123!";
        let pass1 = credentials.hash(plain).unwrap();
        let pass2 = credentials.hash(plain).unwrap();

        // Different salts produce different hashes
        assert_ne!(pass1, pass2);
        // But both verify correctly
        assert!(credentials.verify(plain, &pass1));
        assert!(credentials.verify(plain, &pass2));
    }

    #[test]
    fn test_verify_malformed_hash_returns_false() {
        let credentials = verifier();
        let garbage = Password::from_hash("not-a-phc-string".to_string());
        assert!(!credentials.verify("anything", &garbage));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let password = Password::from_hash("$argon2id$secret".to_string());
        assert!(!format!("{:?}", password).contains("secret"));
    }

    #[test]
    fn test_invalid_work_factor_rejected() {
        let result = Argon2Credentials::new(HashSettings {
            memory_kib: 1024,
            iterations: 0,
            parallelism: 1,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_strong_password_passes() {
        assert!(PasswordStrength::check("Sup3r$ecret").is_valid());
    }

    #[test]
    fn test_strength_collects_every_violation() {
        let strength = PasswordStrength::check("abc");
        assert_eq!(
            strength.violations,
            vec![
                PasswordRule::MinLength,
                PasswordRule::Uppercase,
                PasswordRule::Digit,
                PasswordRule::Symbol,
            ]
        );
    }

    #[test]
    fn test_symbol_must_come_from_policy_set() {
        let strength = PasswordStrength::check("Password123_");
        assert_eq!(strength.violations, vec![PasswordRule::Symbol]);
    }

    #[test]
    fn test_into_result_maps_to_weak_password() {
        let err = PasswordStrength::check("short").into_result().unwrap_err();
        assert!(matches!(err, AppError::WeakPassword(v) if v.contains(&PasswordRule::MinLength)));
    }
}
