//! Application configuration

use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Authentication
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            // Authentication
            jwt_secret: {
                let secret =
                    env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
                // Reject signing keys too short to resist brute force
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "JWT_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap_or(24),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure config tests run serially (they modify shared env vars)
    static CONFIG_TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn setup_minimal_config() {
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var(
            "JWT_SECRET",
            "test-jwt-secret-must-be-at-least-32-characters-long",
        );
    }

    fn cleanup_config() {
        env::remove_var("DATABASE_URL");
        env::remove_var("JWT_SECRET");
        env::remove_var("JWT_EXPIRY_HOURS");
        env::remove_var("BIND_ADDRESS");
    }

    #[test]
    fn test_jwt_secret_validation() {
        let _lock = CONFIG_TEST_MUTEX.lock().unwrap();

        // Missing secret
        setup_minimal_config();
        env::remove_var("JWT_SECRET");
        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));

        // Too-short secret rejected
        env::set_var("JWT_SECRET", "short");
        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::WeakSecret(_))));

        // Valid secret accepted, defaults applied
        setup_minimal_config();
        let config = Config::from_env().unwrap();
        assert_eq!(config.jwt_expiry_hours, 24);
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.database_max_connections, 5);

        cleanup_config();
    }
}
