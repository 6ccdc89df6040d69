use std::path::PathBuf;

use alloy::primitives::Address;
use url::Url;

use crate::reqwest::{ReqwestErrorContext, ReqwestInnerError, ReqwestStage};

pub type Result<T> = std::result::Result<T, UtilsError>;

#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    #[error(transparent)]
    Common(#[from] statement_common::Error),

    #[error(transparent)]
    SerdePathToError(#[from] serde_path_to_error::Error<serde_json::Error>),

    #[error("Address '{0}' is not a valid Ethereum address.")]
    InvalidAddress(String),

    #[error("No addresses given, please enter at least one address.")]
    NoAddresses,

    #[error("Start date {start} is after end date {end}.")]
    InvalidDateRange { start: String, end: String },

    #[error("Etherscan API key not set in config, please set it.")]
    EtherscanApiKeyNotSet,

    #[error("Etherscan request for {action} failed: {message} ({result}).")]
    EtherscanResponse {
        action: &'static str,
        message: String,
        result: String,
    },

    #[error("Etherscan rate limit reached: {0}.")]
    EtherscanRateLimited(String),

    #[error("Failed to parse Etherscan {action} row for {hash}: {reason}.")]
    EtherscanRow {
        action: &'static str,
        hash: String,
        reason: String,
    },

    #[error("Could not load transactions for {}.", .0.iter().map(|(a, _)| a.to_string()).collect::<Vec<_>>().join(", "))]
    FetchFailed(Vec<(Address, UtilsError)>),

    #[error("Fetch task for {0} did not complete. (Error: {1:?})")]
    FetchTaskFailed(Address, tokio::task::JoinError),

    #[error("Fetch was cancelled because the statement parameters changed.")]
    FetchCancelled,

    #[error("Failed to get base directories.")]
    BaseDirsFailed,

    #[error("Failed to create directory: {0:?}. (Error: {1:?})")]
    CreateDirAllFailed(PathBuf, std::io::Error),

    #[error("Failed to read the file: {0}. (Error: {1:?})")]
    FileReadFailed(PathBuf, std::io::Error),

    #[error("Failed to write to the file: {0}. (Error: {1:?})")]
    FileWriteFailed(PathBuf, std::io::Error),

    #[error("Parsing the toml file failed: {0}. (Error: {1:?})")]
    TomlParsingFailed(PathBuf, toml::de::Error),

    #[error("Formatting to toml format failed: {0}. (Error: {1:?})")]
    TomlFormattingFailed(String, toml::ser::Error),

    #[error("Failed to install the logger. (Error: {0})")]
    LoggerInstallFailed(#[from] log::SetLoggerError),

    #[error("Please check your internet connection, the URL seems to be unreachable: {0}")]
    Internet(Url),

    #[error("Request '{url}' failed at stage '{stage:?}' (Error='{inner:?}', Context='{context:?}')", url = context.url)]
    ReqwestFailed {
        stage: ReqwestStage,
        context: Box<ReqwestErrorContext>,
        inner: ReqwestInnerError,
    },

    #[error("Reqwest builder missing error context, this is a bug please report it.")]
    ReqwestErrorContextMissing,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl UtilsError {
    pub fn is_connect(&self) -> bool {
        match self {
            Self::Internet(_) => true,
            Self::ReqwestFailed { inner, .. } => inner.is_connect(),
            Self::FetchFailed(errors) => errors.iter().any(|(_, e)| e.is_connect()),
            _ => false,
        }
    }

    /// Transient upstream failures that the caller may retry as is.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::EtherscanRateLimited(_) => true,
            Self::FetchFailed(errors) => errors.iter().all(|(_, e)| e.is_retryable()),
            _ => self.is_connect(),
        }
    }

    /// Engine invariant violations, which indicate a bug rather than bad input.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Common(_))
    }
}
