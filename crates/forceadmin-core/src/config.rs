use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::errors::ConfigError;
use crate::traits::AuthorityProvider;

pub const DEFAULT_PREFIX: &str = "terra";

/// Module configuration as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub governance_authority: String,

    #[serde(default = "default_prefix")]
    pub bech32_prefix: String,

    /// Hex ed25519 public key of the governance authority. When set, only
    /// requests it has signed are accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governance_pubkey: Option<String>,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl ModuleConfig {
    pub fn new(governance_authority: impl Into<String>, bech32_prefix: impl Into<String>) -> Self {
        Self {
            governance_authority: governance_authority.into(),
            bech32_prefix: bech32_prefix.into(),
            governance_pubkey: None,
        }
    }

    pub fn with_pubkey(mut self, pubkey: &[u8; 32]) -> Self {
        self.governance_pubkey = Some(hex::encode(pubkey));
        self
    }

    /// Load a config file.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("cannot read config {path}"))?;
        serde_json::from_str(&content).with_context(|| format!("{path}: invalid config JSON"))
    }

    /// Save a config file (pretty JSON).
    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("cannot write config {path}"))
    }

    /// Parse the authority and check it against the prefix.
    pub fn validate(&self) -> Result<Params, ConfigError> {
        let prefix = &self.bech32_prefix;
        if prefix.is_empty()
            || !prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ConfigError::InvalidPrefix(prefix.clone()));
        }
        let authority = Address::parse_with_prefix(&self.governance_authority, prefix)
            .map_err(ConfigError::InvalidAuthority)?;
        let governance_pubkey = self
            .governance_pubkey
            .as_deref()
            .map(decode_pubkey)
            .transpose()?;
        Ok(Params {
            authority,
            bech32_prefix: prefix.clone(),
            governance_pubkey,
        })
    }
}

/// Validated module parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    authority: Address,
    bech32_prefix: String,
    governance_pubkey: Option<[u8; 32]>,
}

impl Params {
    pub fn bech32_prefix(&self) -> &str {
        &self.bech32_prefix
    }

    pub fn governance_pubkey(&self) -> Option<&[u8; 32]> {
        self.governance_pubkey.as_ref()
    }
}

fn decode_pubkey(raw: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = hex::decode(raw).map_err(|e| ConfigError::InvalidPubkey(e.to_string()))?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| ConfigError::InvalidPubkey(format!("got {} bytes", bytes.len())))
}

impl AuthorityProvider for Params {
    fn governance_authority(&self) -> &Address {
        &self.authority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gov() -> Address {
        Address::from_bytes("terra", &[0xAA; 20]).unwrap()
    }

    #[test]
    fn prefix_defaults_to_terra() {
        let json = format!(r#"{{"governance_authority": "{}"}}"#, gov());
        let config: ModuleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.bech32_prefix, "terra");
        let params = config.validate().unwrap();
        assert_eq!(params.governance_authority(), &gov());
        assert_eq!(params.bech32_prefix(), "terra");
    }

    #[test]
    fn rejects_malformed_authority() {
        let config = ModuleConfig::new("terra1authorityaddress", "terra");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAuthority(_))
        ));
    }

    #[test]
    fn rejects_authority_with_other_prefix() {
        let config = ModuleConfig::new(gov().to_string(), "cosmos");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAuthority(_))
        ));
    }

    #[test]
    fn rejects_bad_prefix() {
        for prefix in ["", "Terra", "ter ra"] {
            let config = ModuleConfig::new(gov().to_string(), prefix);
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidPrefix(_))
            ));
        }
    }

    #[test]
    fn pubkey_is_optional_and_checked() {
        let params = ModuleConfig::new(gov().to_string(), "terra")
            .validate()
            .unwrap();
        assert_eq!(params.governance_pubkey(), None);

        let config = ModuleConfig::new(gov().to_string(), "terra").with_pubkey(&[9u8; 32]);
        assert_eq!(config.governance_pubkey.as_deref(), Some("09".repeat(32).as_str()));
        assert_eq!(config.validate().unwrap().governance_pubkey(), Some(&[9u8; 32]));

        for bad in ["zz", "0909"] {
            let mut config = ModuleConfig::new(gov().to_string(), "terra");
            config.governance_pubkey = Some(bad.to_string());
            assert!(matches!(config.validate(), Err(ConfigError::InvalidPubkey(_))));
        }
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gov.json");
        let path = path.to_str().unwrap();
        let config = ModuleConfig::new(gov().to_string(), "terra").with_pubkey(&[3u8; 32]);
        config.save(path).unwrap();
        assert_eq!(ModuleConfig::load(path).unwrap(), config);
    }
}
