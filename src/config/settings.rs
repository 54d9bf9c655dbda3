//! Application settings loaded from environment variables.

use std::env;
use std::str::FromStr;

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_HASH_ITERATIONS, DEFAULT_HASH_MEMORY_KIB,
    DEFAULT_HASH_PARALLELISM, DEFAULT_LOCKOUT_MINUTES, DEFAULT_MAX_LOGIN_ATTEMPTS,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_SESSION_LIFETIME_HOURS,
    MAX_SESSION_LIFETIME_HOURS,
};

/// Argon2 work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashSettings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashSettings {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_HASH_MEMORY_KIB,
            iterations: DEFAULT_HASH_ITERATIONS,
            parallelism: DEFAULT_HASH_PARALLELISM,
        }
    }
}

/// Failed-login lockout settings.
///
/// Non-positive values switch locking off entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutSettings {
    pub max_attempts: i32,
    pub lockout_minutes: i64,
}

impl Default for LockoutSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
            lockout_minutes: DEFAULT_LOCKOUT_MINUTES,
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub hashing: HashSettings,
    pub lockout: LockoutSettings,
    pub session_lifetime_hours: i64,
    pub session_secure_cookie: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("hashing", &self.hashing)
            .field("lockout", &self.lockout)
            .field("session_lifetime_hours", &self.session_lifetime_hours)
            .field("session_secure_cookie", &self.session_secure_cookie)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            hashing: HashSettings::default(),
            lockout: LockoutSettings::default(),
            session_lifetime_hours: DEFAULT_SESSION_LIFETIME_HOURS,
            session_secure_cookie: false,
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Keep the session lifetime within `1..=MAX_SESSION_LIFETIME_HOURS`.
fn sanitize_session_lifetime(hours: i64) -> i64 {
    match hours {
        h if h <= 0 => {
            tracing::warn!(hours, "SESSION_LIFETIME_HOURS must be positive, using default");
            DEFAULT_SESSION_LIFETIME_HOURS
        }
        h if h > MAX_SESSION_LIFETIME_HOURS => {
            tracing::warn!(hours, max = MAX_SESSION_LIFETIME_HOURS, "SESSION_LIFETIME_HOURS too large, clamping");
            MAX_SESSION_LIFETIME_HOURS
        }
        h => h,
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` when present).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let session_lifetime_hours = sanitize_session_lifetime(env_or(
            "SESSION_LIFETIME_HOURS",
            DEFAULT_SESSION_LIFETIME_HOURS,
        ));

        let lockout = LockoutSettings {
            max_attempts: env_or("MAX_LOGIN_ATTEMPTS", DEFAULT_MAX_LOGIN_ATTEMPTS),
            lockout_minutes: env_or("LOCKOUT_DURATION_MINUTES", DEFAULT_LOCKOUT_MINUTES),
        };
        if lockout.max_attempts <= 0 || lockout.lockout_minutes <= 0 {
            tracing::warn!(?lockout, "Non-positive lockout settings, account locking disabled");
        }

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: env_or("SERVER_PORT", DEFAULT_SERVER_PORT),
            hashing: HashSettings {
                memory_kib: env_or("PASSWORD_HASH_MEMORY_KIB", DEFAULT_HASH_MEMORY_KIB),
                iterations: env_or("PASSWORD_HASH_ITERATIONS", DEFAULT_HASH_ITERATIONS),
                parallelism: env_or("PASSWORD_HASH_PARALLELISM", DEFAULT_HASH_PARALLELISM),
            },
            lockout,
            session_lifetime_hours,
            session_secure_cookie: env_or("SESSION_SECURE_COOKIE", false),
        }
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
