//! Metadata resolution across GNUDB and MusicBrainz
//!
//! In the common case both providers are queried at once and both answers
//! are awaited before [`reconcile`] picks the result. GNUDB text wins when it
//! has any, while the MusicBrainz release ID always wins because only that ID
//! can be used to find cover art.

use crate::cd::{DiscIdentity, LegacyToc};
use crate::models::DiscMetadata;
use crate::musicbrainz::ReleaseQuery;
use crate::provider::{FetchFailure, MetadataProvider, ProviderError};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub type LegacyProvider = dyn MetadataProvider<Query = LegacyToc>;
pub type ReleaseProvider = dyn MetadataProvider<Query = ReleaseQuery>;

type FetchResult = Result<Option<DiscMetadata>, ProviderError>;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to fetch from both sources: GNUDB: {legacy}; MusicBrainz: {release}")]
    Combined {
        legacy: FetchFailure,
        release: FetchFailure,
    },
    #[error("MusicBrainz release lookup failed: {0}")]
    Lookup(FetchFailure),
}

pub struct Resolver {
    legacy: Box<LegacyProvider>,
    release: Box<ReleaseProvider>,
    timeout: Option<Duration>,
}

impl Resolver {
    pub fn new(
        legacy: Box<LegacyProvider>,
        release: Box<ReleaseProvider>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            legacy,
            release,
            timeout,
        }
    }

    /// Look a release up by MBID. GNUDB is not consulted.
    pub async fn resolve_release(&self, release_id: &str) -> Result<DiscMetadata, ResolveError> {
        let query = ReleaseQuery::ReleaseId(release_id.to_string());
        let result = self.bounded(self.release.fetch(&query)).await;

        match into_success(result) {
            Ok(metadata) => Ok(metadata),
            Err((_, failure)) => Err(ResolveError::Lookup(failure)),
        }
    }

    /// Query both providers concurrently and reconcile their answers
    pub async fn resolve_disc(
        &self,
        identity: &DiscIdentity,
    ) -> Result<DiscMetadata, ResolveError> {
        info!(
            "🔍 Starting parallel lookup: {} + {}",
            self.legacy.name(),
            self.release.name()
        );

        let release_query = ReleaseQuery::Toc(identity.release_toc.clone());
        let (legacy_result, release_result) = tokio::join!(
            self.bounded(self.legacy.fetch(&identity.legacy_toc)),
            self.bounded(self.release.fetch(&release_query)),
        );

        reconcile(legacy_result, release_result)
    }

    async fn bounded<F>(&self, fetch: F) -> FetchResult
    where
        F: Future<Output = FetchResult>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .unwrap_or(Err(ProviderError::Timeout(limit))),
            None => fetch.await,
        }
    }
}

/// Split a provider answer into a usable result or the reason it is not.
/// The failure side still carries any metadata the provider returned.
fn into_success(
    result: FetchResult,
) -> Result<DiscMetadata, (Option<DiscMetadata>, FetchFailure)> {
    match result {
        Ok(Some(metadata)) if metadata.is_valid() => Ok(metadata),
        Ok(Some(metadata)) => Err((Some(metadata), FetchFailure::MissingTitle)),
        Ok(None) => Err((None, FetchFailure::NotFound)),
        Err(e) => Err((None, FetchFailure::Error(e))),
    }
}

/// Pick the final metadata from the two provider answers.
///
/// GNUDB seeds the result when usable, MusicBrainz otherwise. Whenever
/// MusicBrainz returned a record its ID replaces the seed's ID.
pub fn reconcile(legacy: FetchResult, release: FetchResult) -> Result<DiscMetadata, ResolveError> {
    let legacy = into_success(legacy);
    let release = into_success(release);

    let release_id = match &release {
        Ok(metadata) | Err((Some(metadata), _)) => Some(metadata.id.clone()),
        Err((None, _)) => None,
    };

    let mut resolved = match (legacy, release) {
        (Ok(metadata), release) => {
            if let Err((_, failure)) = &release {
                log_failure("MusicBrainz", failure);
            }
            info!("✓ Using GNUDB metadata");
            metadata
        }
        (Err((_, legacy_failure)), Ok(metadata)) => {
            log_failure("GNUDB", &legacy_failure);
            info!("✓ Using MusicBrainz metadata");
            metadata
        }
        (Err((_, legacy)), Err((_, release))) => {
            return Err(ResolveError::Combined { legacy, release });
        }
    };

    if let Some(id) = release_id {
        resolved.id = id;
    }

    Ok(resolved)
}

fn log_failure(provider: &str, failure: &FetchFailure) {
    match failure {
        FetchFailure::NotFound => info!("{}: no match", provider),
        other => warn!("✗ {} lookup failed: {}", provider, other),
    }
}
