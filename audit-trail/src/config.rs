//! Configuration for the audit trail

use serde::{Deserialize, Serialize};

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Ledger network name ("testnet" or "mainnet")
    pub network: String,

    /// Operator account id on the ledger network
    pub operator_account: Option<String>,

    /// Operator private key
    pub operator_key: Option<String>,

    /// Topic the audit messages are submitted to
    pub topic_id: Option<String>,

    /// Explorer/mirror base URL override
    pub mirror_base_url: Option<String>,

    /// Per-attempt submit timeout (milliseconds)
    pub submit_timeout_ms: u64,

    /// Retry configuration
    pub retry: RetryConfig,
}

/// Retry configuration for publish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum submit attempts per publish
    pub max_attempts: u32,

    /// Base backoff delay (milliseconds); attempt N waits N x base
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            network: "testnet".to_string(),
            operator_account: None,
            operator_key: None,
            topic_id: None,
            mirror_base_url: None,
            submit_timeout_ms: 10_000,
            retry: RetryConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AuditConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Self {
        let mut config = AuditConfig::default();

        if let Ok(network) = std::env::var("AUDIT_LEDGER_NETWORK") {
            config.network = network;
        }
        config.operator_account = std::env::var("AUDIT_OPERATOR_ACCOUNT").ok();
        config.operator_key = std::env::var("AUDIT_OPERATOR_KEY").ok();
        config.topic_id = std::env::var("AUDIT_TOPIC_ID").ok();
        config.mirror_base_url = std::env::var("AUDIT_MIRROR_BASE_URL").ok();

        config
    }

    /// True when enough is configured to reach a live ledger
    pub fn is_configured(&self) -> bool {
        self.operator_account.is_some() && self.operator_key.is_some() && self.topic_id.is_some()
    }

    /// Mirror base URL, falling back to the public mirror for the network
    pub fn mirror_base(&self) -> String {
        match &self.mirror_base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None if self.network == "mainnet" => {
                "https://mainnet-public.mirrornode.hedera.com".to_string()
            }
            None => "https://testnet.mirrornode.hedera.com".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuditConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 100);
        assert!(!config.is_configured());
    }

    #[test]
    fn test_mirror_base_per_network() {
        let mut config = AuditConfig::default();
        assert!(config.mirror_base().contains("testnet"));

        config.network = "mainnet".to_string();
        assert!(config.mirror_base().contains("mainnet"));

        config.mirror_base_url = Some("https://mirror.internal/".to_string());
        assert_eq!(config.mirror_base(), "https://mirror.internal");
    }

    #[test]
    fn test_is_configured_requires_all_three() {
        let mut config = AuditConfig::default();
        config.operator_account = Some("0.0.1001".to_string());
        config.operator_key = Some("key".to_string());
        assert!(!config.is_configured());

        config.topic_id = Some("0.0.2002".to_string());
        assert!(config.is_configured());
    }
}
