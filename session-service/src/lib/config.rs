use std::env;
use std::fmt;
use std::time::Duration as StdDuration;

use auth::HashingCost;
use auth::KeyError;
use auth::SecretHasher;
use auth::SigningKey;
use auth::SigningKeySet;
use auth::TokenCodec;
use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use config::FileFormat;
use serde::Deserialize;

use crate::domain::session::service::SessionPolicy;

/// Longest accepted token lifetime (one year).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// Largest accepted clock skew tolerance (one hour).
pub const MAX_CLOCK_SKEW_SECS: i64 = 60 * 60;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub token: TokenConfig,
    #[serde(default)]
    pub hashing: HashingConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub revocation: RevocationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    #[serde(default = "default_lifetime_secs")]
    pub lifetime_secs: i64,
    #[serde(default = "default_clock_skew_secs")]
    pub clock_skew_secs: i64,
    #[serde(default = "default_true")]
    pub rotate_on_refresh: bool,
    /// First key signs, all keys verify
    pub signing_keys: Vec<SigningKeyConfig>,
}

#[derive(Deserialize, Clone)]
pub struct SigningKeyConfig {
    pub id: String,
    pub secret: String,
}

impl fmt::Debug for SigningKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyConfig")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HashingConfig {
    /// Argon2 iteration count
    #[serde(default = "default_hashing_cost")]
    pub cost: u32,
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DirectoryConfig {
    pub database_url: Option<String>,
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RevocationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_lifetime_secs() -> i64 {
    7 * 24 * 60 * 60
}

fn default_clock_skew_secs() -> i64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_hashing_cost() -> u32 {
    HashingCost::default().iterations
}

fn default_memory_kib() -> u32 {
    HashingCost::default().memory_kib
}

fn default_parallelism() -> u32 {
    HashingCost::default().parallelism
}

fn default_lookup_timeout_ms() -> u64 {
    2000
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            cost: default_hashing_cost(),
            memory_kib: default_memory_kib(),
            parallelism: default_parallelism(),
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (TOKEN__LIFETIME_SECS, HASHING__COST, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Self = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Check every derived setting, reporting the first invalid one.
    ///
    /// # Errors
    /// * `Message` - A key, lifetime, skew, timeout, interval or hashing setting is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.token_codec()?;
        self.session_policy()?;
        self.sweep_interval()?;
        SecretHasher::with_cost(self.hashing_cost())
            .map_err(|e| ConfigError::Message(format!("hashing: {}", e)))?;

        Ok(())
    }

    /// Parse configuration from a TOML document, without file or environment layers.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        ConfigBuilder::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Build the ordered signing key set.
    ///
    /// # Errors
    /// * `Empty` - No keys configured
    /// * `TooShort` / `EmptyId` / `DuplicateId` - Invalid key entries
    pub fn signing_keys(&self) -> Result<SigningKeySet, KeyError> {
        let keys = self
            .token
            .signing_keys
            .iter()
            .map(|key| SigningKey::new(key.id.clone(), key.secret.as_bytes().to_vec()))
            .collect::<Result<Vec<_>, _>>()?;

        SigningKeySet::new(keys)
    }

    /// Clock skew tolerance.
    ///
    /// # Errors
    /// * `Message` - Skew is negative or above `MAX_CLOCK_SKEW_SECS`
    pub fn clock_skew(&self) -> Result<Duration, ConfigError> {
        let secs = self.token.clock_skew_secs;
        if !(0..=MAX_CLOCK_SKEW_SECS).contains(&secs) {
            return Err(ConfigError::Message(format!(
                "token.clock_skew_secs must be between 0 and {}, got {}",
                MAX_CLOCK_SKEW_SECS, secs
            )));
        }

        Ok(Duration::seconds(secs))
    }

    /// Build the token codec from the key set and skew tolerance.
    ///
    /// # Errors
    /// * `Message` - Invalid signing keys or clock skew
    pub fn token_codec(&self) -> Result<TokenCodec, ConfigError> {
        let keys = self
            .signing_keys()
            .map_err(|e| ConfigError::Message(format!("token.signing_keys: {}", e)))?;

        Ok(TokenCodec::new(keys).with_clock_skew(self.clock_skew()?))
    }

    pub fn hashing_cost(&self) -> HashingCost {
        HashingCost {
            iterations: self.hashing.cost,
            memory_kib: self.hashing.memory_kib,
            parallelism: self.hashing.parallelism,
        }
    }

    /// Session policy.
    ///
    /// # Errors
    /// * `Message` - Token lifetime outside `1..=MAX_TOKEN_LIFETIME_SECS`, or zero lookup timeout
    pub fn session_policy(&self) -> Result<SessionPolicy, ConfigError> {
        let lifetime_secs = self.token.lifetime_secs;
        let token_lifetime = Some(lifetime_secs)
            .filter(|secs| (1..=MAX_TOKEN_LIFETIME_SECS).contains(secs))
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "token.lifetime_secs must be between 1 and {}, got {}",
                    MAX_TOKEN_LIFETIME_SECS, lifetime_secs
                ))
            })?;

        if self.directory.lookup_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "directory.lookup_timeout_ms must be positive".to_string(),
            ));
        }

        Ok(SessionPolicy {
            token_lifetime,
            lookup_timeout: StdDuration::from_millis(self.directory.lookup_timeout_ms),
            rotate_on_refresh: self.token.rotate_on_refresh,
        })
    }

    /// Interval between revocation sweeps.
    ///
    /// # Errors
    /// * `Message` - Interval is zero
    pub fn sweep_interval(&self) -> Result<StdDuration, ConfigError> {
        if self.revocation.sweep_interval_secs == 0 {
            return Err(ConfigError::Message(
                "revocation.sweep_interval_secs must be positive".to_string(),
            ));
        }

        Ok(StdDuration::from_secs(self.revocation.sweep_interval_secs))
    }
}
