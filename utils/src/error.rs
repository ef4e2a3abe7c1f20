use std::path::PathBuf;

use crate::reqwest::{ReqwestErrorContext, ReqwestInnerError, ReqwestStage};

pub type Result<T> = std::result::Result<T, UtilsError>;

#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    #[error(transparent)]
    Common(#[from] holdboard_common::Error),

    #[error("Environment variable {var} is not set, the {provider} provider needs it.")]
    CredentialMissing {
        var: &'static str,
        provider: &'static str,
    },

    #[error("The {provider} provider does not know chain id {chain_id}, set its network name in the config.")]
    UnsupportedChain {
        provider: &'static str,
        chain_id: u64,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to get base directories.")]
    BaseDirsFailed,

    #[error("Failed to create directory: {0:?}. (Error: {1:?})")]
    CreateDirAllFailed(PathBuf, std::io::Error),

    #[error("Failed to read the file: {0}. (Error: {1:?})")]
    FileReadFailed(PathBuf, std::io::Error),

    #[error("Failed to write to the file: {0}. (Error: {1:?})")]
    FileWriteFailed(PathBuf, std::io::Error),

    #[error("Failed to move {from} over {to}. (Error: {error:?})")]
    FileRenameFailed {
        from: PathBuf,
        to: PathBuf,
        error: std::io::Error,
    },

    #[error("Parsing the toml file failed: {0}. (Error: {1:?})")]
    TomlParsingFailed(PathBuf, toml::de::Error),

    #[error("Parsing the json file failed: {0}. (Error: {1:?})")]
    JsonParsingFailed(PathBuf, serde_json::Error),

    #[error("Formatting to json failed. (Error: {0:?})")]
    JsonFormattingFailed(serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Please check your internet connection, the URL seems to be unreachable: {0}")]
    Internet(String),

    #[error("Request '{url}' failed at stage '{stage:?}' (Error='{inner:?}', Context='{context:?}')", url = context.url)]
    ReqwestFailed {
        stage: ReqwestStage,
        context: Box<ReqwestErrorContext>,
        inner: ReqwestInnerError,
    },

    #[error("Reqwest builder missing error context, this is a bug please report it.")]
    ReqwestErrorContextMissing,

    #[error("The {provider} provider rejected the request: {message}")]
    ProviderRejected {
        provider: &'static str,
        message: String,
    },

    #[error("The {provider} provider returned a record we cannot use: {reason}")]
    MalformedRecord {
        provider: &'static str,
        reason: String,
    },

    #[error("The {provider} provider returned cursor '{cursor}' twice in a row.")]
    PaginationStalled {
        provider: &'static str,
        cursor: String,
    },

    #[error("Holder {address} ended with a negative balance of {balance}.")]
    NegativeBalance { address: String, balance: String },

    #[error("Running balance of {address} overflowed 256 bits.")]
    BalanceOverflow { address: String },
}

impl UtilsError {
    /// Problems with credentials or configuration, detected before any request goes out.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::CredentialMissing { .. }
                | Self::UnsupportedChain { .. }
                | Self::InvalidConfig(_)
                | Self::BaseDirsFailed
                | Self::FileReadFailed(..)
                | Self::TomlParsingFailed(..)
        )
    }

    /// Failures worth another attempt: unreachable host, timeouts, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Internet(_) => true,
            Self::ReqwestFailed {
                stage: ReqwestStage::Send,
                inner,
                ..
            } => inner.is_connect() || inner.is_timeout(),
            Self::ReqwestFailed {
                stage: ReqwestStage::Status,
                inner,
                ..
            } => inner
                .status()
                .is_some_and(|status| status.as_u16() == 429 || status.is_server_error()),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_flagged() {
        let missing = UtilsError::CredentialMissing {
            var: "ALCHEMY_API_KEY",
            provider: "alchemy",
        };
        assert!(missing.is_config());
        assert!(!missing.is_transient());

        let rejected = UtilsError::ProviderRejected {
            provider: "etherscan",
            message: "NOTOK".to_string(),
        };
        assert!(!rejected.is_config());
        assert!(!rejected.is_transient());
    }

    #[test]
    fn test_unreachable_host_is_transient() {
        let err = UtilsError::Internet("https://nft-api.infura.io/".to_string());
        assert!(err.is_transient());
        assert!(!err.is_config());
    }

    #[test]
    fn test_invalid_config_is_a_config_error() {
        let err = UtilsError::InvalidConfig("page_size must be at least 1".to_string());
        assert!(err.is_config());
        assert!(!err.is_transient());
    }
}
