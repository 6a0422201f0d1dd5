//! Config module contains the top-level config for the coupons engine.
use std::env;

use config_crate::{Config as RawConfig, ConfigError, Environment, File};

/// Basic settings - database url and size of the cpu pool
#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub database: String,
    pub thread_count: usize,
}

/// Hex digits in a uuid v4, the source of generated code characters
pub const MAX_GENERATED_CODE_LENGTH: usize = 32;

/// Settings of coupon issuance
#[derive(Debug, Deserialize, Clone)]
pub struct Coupons {
    /// How long a coupon minted from a reward redemption stays valid
    pub redemption_validity_days: u64,
    pub generated_code_prefix: String,
    pub generated_code_length: usize,
    pub code_generation_attempts: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimit {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: Server,
    pub coupons: Coupons,
    pub rate_limit: RateLimit,
}

impl Config {
    /// Creates config from base.toml, which are overwritten by <env>.toml, where env is one of development,
    /// test, production. After that it could be overwritten by env variables like DOCTERBEE_SERVER.DATABASE
    pub fn new() -> Result<Self, ConfigError> {
        let env = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Config::with_env(env)
    }

    pub fn with_env(env: impl Into<String>) -> Result<Self, ConfigError> {
        let mut s = RawConfig::new();

        s.merge(File::with_name("config/base"))?;
        // Optional file specific for environment
        s.merge(File::with_name(&format!("config/{}", env.into())).required(false))?;
        s.merge(Environment::with_prefix("DOCTERBEE"))?;

        let config: Config = s.try_into()?;
        config.checked()
    }

    /// Rejects settings the engine can not honour
    pub fn checked(self) -> Result<Self, ConfigError> {
        let length = self.coupons.generated_code_length;
        if length == 0 || length > MAX_GENERATED_CODE_LENGTH {
            return Err(ConfigError::Message(format!(
                "coupons.generated_code_length must be between 1 and {}, got {}",
                MAX_GENERATED_CODE_LENGTH, length
            )));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_config_is_loaded() {
        let config = Config::with_env("test").unwrap();
        assert_eq!(config.coupons.redemption_validity_days, 30);
        assert!(config.coupons.code_generation_attempts > 0);
        assert!(config.rate_limit.max_requests > 0);
        assert!(config.coupons.generated_code_length >= 16);
    }

    #[test]
    fn test_code_length_beyond_uuid_is_rejected() {
        let mut config = Config::with_env("test").unwrap();
        config.coupons.generated_code_length = MAX_GENERATED_CODE_LENGTH + 1;
        match config.clone().checked() {
            Err(ConfigError::Message(message)) => assert!(message.contains("generated_code_length")),
            other => panic!("unexpected result {:?}", other),
        }

        config.coupons.generated_code_length = 0;
        assert!(config.clone().checked().is_err());

        config.coupons.generated_code_length = MAX_GENERATED_CODE_LENGTH;
        assert!(config.checked().is_ok());
    }
}
