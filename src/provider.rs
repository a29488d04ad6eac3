//! Common contract for the metadata providers

use crate::models::DiscMetadata;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{provider} returned status {status}")]
    Status { provider: &'static str, status: u16 },
    #[error("Malformed {provider} response: {message}")]
    Malformed {
        provider: &'static str,
        message: String,
    },
    #[error("No answer within {0:?}")]
    Timeout(Duration),
}

/// A metadata source queried by some disc key.
///
/// `Ok(None)` means the provider has no record for the query. That is a
/// normal outcome, not an error.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    type Query: Send + Sync;

    fn name(&self) -> &'static str;

    async fn fetch(&self, query: &Self::Query) -> Result<Option<DiscMetadata>, ProviderError>;
}

/// Why one provider contributed nothing to a resolution
#[derive(Debug)]
pub enum FetchFailure {
    NotFound,
    /// The provider answered with a record lacking a title
    MissingTitle,
    Error(ProviderError),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::NotFound => f.write_str("no match found"),
            FetchFailure::MissingTitle => f.write_str("result has no title"),
            FetchFailure::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<ProviderError> for FetchFailure {
    fn from(e: ProviderError) -> Self {
        FetchFailure::Error(e)
    }
}
