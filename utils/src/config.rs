use std::{fmt::Display, path::PathBuf, time::Duration};

use alloy::primitives::{address, uint, Address};
use holdboard_common::TokenId;
use serde::Deserialize;

use crate::{alchemy::TransferCategory, disk_storage::DiskStorageInterface};

/// Upstream data provider a run pulls from.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Infura NFT API, current owners of the token.
    #[default]
    Infura,
    /// Moralis NFT API, current owners of the token.
    Moralis,
    /// Alchemy `alchemy_getAssetTransfers`, full transfer history.
    Alchemy,
    /// Etherscan v2 `token1155tx`, full transfer history.
    Etherscan,
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProviderKind::Infura => "infura",
            ProviderKind::Moralis => "moralis",
            ProviderKind::Alchemy => "alchemy",
            ProviderKind::Etherscan => "etherscan",
        };
        f.write_str(name)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub provider: ProviderKind,
    pub chain_id: u64,
    pub contract_address: Address,
    pub token_id: TokenId,
    pub output: PathBuf,
    /// Forwarded as the provider's page size parameter where it has one.
    pub page_size: Option<u32>,
    /// Extra attempts per page for transient failures. Zero fails on the first error.
    pub retry_attempts: usize,
    pub request_timeout_secs: Option<u64>,
    /// Alchemy subdomain, e.g. `base-mainnet`. Derived from `chain_id` when unset.
    pub alchemy_network: Option<String>,
    pub alchemy_categories: Vec<TransferCategory>,
    /// Leave the zero address out of the published leaderboard.
    pub omit_burn_address: bool,
    /// Abort instead of warning when a replayed balance ends up negative.
    pub fail_on_negative_balance: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Infura,
            chain_id: 8453,
            contract_address: address!("0xc1374b803DFb1A9c87eaB9e76929222DBa3a8C39"),
            token_id: TokenId::new(uint!(
                233135866589270025735431199023256918527023659760796851524427037696933759150_U256
            )),
            output: PathBuf::from("leaderboard.json"),
            page_size: None,
            retry_attempts: 0,
            request_timeout_secs: None,
            alchemy_network: None,
            alchemy_categories: vec![TransferCategory::Erc1155],
            omit_burn_address: false,
            fail_on_negative_balance: false,
        }
    }
}

impl DiskStorageInterface for Config {
    const FILE_NAME: &'static str = "config";

    fn validate(&self) -> crate::Result<()> {
        if self.page_size == Some(0) {
            return Err(crate::Error::InvalidConfig(
                "page_size must be at least 1".to_string(),
            ));
        }
        if self.alchemy_categories.is_empty() {
            return Err(crate::Error::InvalidConfig(
                "alchemy_categories must name at least one category".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
provider = "alchemy"
token_id = "0x2a"
retry_attempts = 3
alchemy_categories = ["erc1155", "erc721"]
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();

        assert_eq!(config.provider, ProviderKind::Alchemy);
        assert_eq!(config.token_id, TokenId::from(42u64));
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(
            config.alchemy_categories,
            [TransferCategory::Erc1155, TransferCategory::Erc721]
        );
        assert_eq!(config.chain_id, 8453);
        assert_eq!(config.output, PathBuf::from("leaderboard.json"));
        assert_eq!(config.contract_address, Config::default().contract_address);
    }

    #[test]
    fn test_unknown_key_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "provder = \"infura\"\n").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, crate::Error::TomlParsingFailed(..)));
        assert!(err.is_config());
    }

    #[test]
    fn test_missing_explicit_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_integer_token_id() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "token_id = 42\n").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.token_id, TokenId::from(42u64));
    }

    #[test]
    fn test_zero_page_size_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "page_size = 0\n").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidConfig(_)));
        assert!(err.is_config());
    }

    #[test]
    fn test_empty_alchemy_categories_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "provider = \"alchemy\"\nalchemy_categories = []\n").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidConfig(_)));
        assert!(err.is_config());
    }

    #[test]
    fn test_defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_default_token_id_matches_deployment() {
        assert_eq!(
            Config::default().token_id.to_string(),
            "233135866589270025735431199023256918527023659760796851524427037696933759150"
        );
    }
}
