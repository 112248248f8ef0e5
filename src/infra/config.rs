//! Configuration management infrastructure.
//!
//! This module provides configuration file support, allowing users to save
//! and load signing preferences, timestamp server lists and the chain
//! building policy.

use crate::adapters::timestamp_http_client::TimestampHttpConfig;
use crate::domain::chain::{ChainPolicy, RevocationMode};
use crate::domain::types::TimestampUrl;
use crate::infra::error::{SigningError, SigningResult};
use crate::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Application configuration with all signing preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfiguration {
    /// Default hash algorithm for the signature
    pub default_hash_algorithm: String,

    /// Default hash algorithm for the timestamp message imprint
    pub default_timestamp_hash_algorithm: String,

    /// Primary timestamp server
    pub primary_timestamp_server: String,

    /// Fallback timestamp servers
    pub fallback_timestamp_servers: Vec<String>,

    /// Network timeout settings
    pub network_timeout_seconds: u64,

    /// Number of attempts per timestamp server
    pub retry_attempts: usize,

    /// Delay between attempts against the same server
    pub retry_delay_millis: u64,

    /// Certificate chain building preferences
    pub chain_policy: ChainPolicyConfig,
}

/// Certificate chain building configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainPolicyConfig {
    /// Whether the code signing EKU must be in the chain's application policy
    pub require_code_signing_eku: bool,

    /// Revocation checking mode for leaf and intermediates ("online", "offline", "none")
    pub revocation_mode: String,

    /// Upper bound for revocation data retrieval
    pub url_retrieval_timeout_seconds: u64,

    /// Fall back to a single-certificate chain when chain building fails.
    /// Needed for self-signed development certificates.
    pub allow_untrusted_fallback: bool,
}

impl Default for SignerConfiguration {
    fn default() -> Self {
        Self {
            default_hash_algorithm: "sha256".to_string(),
            default_timestamp_hash_algorithm: "sha256".to_string(),
            primary_timestamp_server: "http://timestamp.digicert.com".to_string(),
            fallback_timestamp_servers: vec![
                "http://timestamp.sectigo.com".to_string(),
                "http://ts.ssl.com".to_string(),
            ],
            network_timeout_seconds: 30,
            retry_attempts: 3,
            retry_delay_millis: 2000,
            chain_policy: ChainPolicyConfig::default(),
        }
    }
}

impl Default for ChainPolicyConfig {
    fn default() -> Self {
        Self {
            require_code_signing_eku: true,
            revocation_mode: "online".to_string(),
            url_retrieval_timeout_seconds: 15,
            allow_untrusted_fallback: true,
        }
    }
}

impl SignerConfiguration {
    /// Resolved signature hash algorithm.
    pub fn signature_hash_algorithm(&self) -> SigningResult<HashAlgorithm> {
        self.default_hash_algorithm.parse()
    }

    /// Resolved timestamp hash algorithm.
    pub fn timestamp_hash_algorithm(&self) -> SigningResult<HashAlgorithm> {
        self.default_timestamp_hash_algorithm.parse()
    }

    /// Build the timestamp HTTP client settings from this configuration.
    pub fn timestamp_http_config(&self) -> SigningResult<TimestampHttpConfig> {
        Ok(TimestampHttpConfig {
            primary: TimestampUrl::new(&self.primary_timestamp_server)?,
            fallbacks: self
                .fallback_timestamp_servers
                .iter()
                .map(TimestampUrl::new)
                .collect::<SigningResult<Vec<_>>>()?,
            timeout: Duration::from_secs(self.network_timeout_seconds),
            retries_per_server: self.retry_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_millis),
        })
    }

    /// Build the chain policy evaluated at `verification_time`.
    pub fn chain_policy(&self, verification_time: SystemTime) -> SigningResult<ChainPolicy> {
        let revocation_mode: RevocationMode = self.chain_policy.revocation_mode.parse()?;
        let mut policy = ChainPolicy::code_signing(verification_time)
            .with_revocation_mode(revocation_mode)
            .with_url_retrieval_timeout(Duration::from_secs(
                self.chain_policy.url_retrieval_timeout_seconds,
            ));
        if !self.chain_policy.require_code_signing_eku {
            policy = policy.without_application_policy();
        }
        Ok(policy)
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> SigningResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> SigningResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("nupkg-signer").join("config.toml"))
        } else {
            Ok(PathBuf::from("nupkg-signer-config.toml"))
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default(&self) -> SigningResult<SignerConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = SignerConfiguration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> SigningResult<SignerConfiguration> {
        log::info!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            SigningError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: SignerConfiguration = toml::from_str(&content).map_err(|e| {
            SigningError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &SignerConfiguration) -> SigningResult<()> {
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SigningError::ConfigurationError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            SigningError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            SigningError::ConfigurationError(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(config: &SignerConfiguration) -> SigningResult<()> {
        for name in [
            &config.default_hash_algorithm,
            &config.default_timestamp_hash_algorithm,
        ] {
            name.parse::<HashAlgorithm>().map_err(|_| {
                SigningError::ConfigurationError(format!("Invalid hash algorithm: {name}"))
            })?;
        }

        TimestampUrl::new(&config.primary_timestamp_server)?;
        for url in &config.fallback_timestamp_servers {
            TimestampUrl::new(url)?;
        }

        if config.network_timeout_seconds == 0 {
            return Err(SigningError::ConfigurationError(
                "Network timeout must be greater than 0".to_string(),
            ));
        }

        if config.retry_attempts == 0 {
            return Err(SigningError::ConfigurationError(
                "Retry attempts must be greater than 0".to_string(),
            ));
        }

        config
            .chain_policy
            .revocation_mode
            .parse::<RevocationMode>()
            .map_err(|_| {
                SigningError::ConfigurationError(format!(
                    "Invalid revocation mode: {}",
                    config.chain_policy.revocation_mode
                ))
            })?;

        Ok(())
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
