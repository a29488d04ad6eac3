//! Fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use disc_cuer::cd::{DiscIdentity, DiscReadError, DiscReader, LegacyToc, ReleaseToc};
use disc_cuer::config::Config;
use disc_cuer::cover_art::{CoverArtError, CoverArtFetcher};
use disc_cuer::models::DiscMetadata;
use disc_cuer::provider::{MetadataProvider, ProviderError};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const DISC_ID: &str = "a50c6c0c";

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Shared call counter that survives moving its owner into a `Box`
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn identity() -> DiscIdentity {
    DiscIdentity {
        legacy_toc: LegacyToc::parse("a50c6c0c 3 150 18051 34963 2926").unwrap(),
        release_toc: ReleaseToc::new("1 3 219450 150 18051 34963"),
    }
}

/// Config rooted at `cache` with GNUDB credentials set
pub fn config(cache: &Path) -> Config {
    let mut config = Config::new(cache);
    config.gnudb_hello_email = Some("me@example.org".to_string());
    config
}

pub fn gnudb_metadata() -> DiscMetadata {
    DiscMetadata {
        id: String::new(),
        artist: "AC/DC".to_string(),
        title: "Back In Black".to_string(),
        release_date: Some("1980".to_string()),
        genre: Some("Hard Rock".to_string()),
        tracks: vec![
            "Hells Bells".to_string(),
            "Shoot to Thrill".to_string(),
            "What Do You Do for Money Honey".to_string(),
        ],
        cover_art_path: None,
    }
}

pub fn musicbrainz_metadata() -> DiscMetadata {
    DiscMetadata {
        id: "mbid-1".to_string(),
        artist: "AC/DC".to_string(),
        title: "Back in Black".to_string(),
        release_date: Some("1980-07-25".to_string()),
        genre: None,
        tracks: vec![
            "Hells Bells".to_string(),
            "Shoot to Thrill".to_string(),
            "What Do You Do for Money Honey".to_string(),
        ],
        cover_art_path: None,
    }
}

pub struct FakeDiscReader {
    identity: Option<DiscIdentity>,
    pub calls: Calls,
}

impl FakeDiscReader {
    pub fn new(identity: DiscIdentity) -> Self {
        Self {
            identity: Some(identity),
            calls: Calls::default(),
        }
    }

    /// A drive without a readable disc
    pub fn empty() -> Self {
        Self {
            identity: None,
            calls: Calls::default(),
        }
    }
}

#[async_trait]
impl DiscReader for FakeDiscReader {
    async fn read_identity(&self) -> Result<DiscIdentity, DiscReadError> {
        self.calls.hit();
        self.identity.clone().ok_or_else(|| DiscReadError::Unreadable {
            device: "/dev/fake".to_string(),
            message: "no medium found".to_string(),
        })
    }
}

/// Provider answering every query with the same canned result
pub struct FakeProvider<Q> {
    name: &'static str,
    answer: fn() -> Result<Option<DiscMetadata>, ProviderError>,
    pub calls: Calls,
    _query: PhantomData<fn(Q)>,
}

impl<Q> FakeProvider<Q> {
    pub fn new(
        name: &'static str,
        answer: fn() -> Result<Option<DiscMetadata>, ProviderError>,
    ) -> Self {
        Self {
            name,
            answer,
            calls: Calls::default(),
            _query: PhantomData,
        }
    }
}

#[async_trait]
impl<Q: Send + Sync + 'static> MetadataProvider for FakeProvider<Q> {
    type Query = Q;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, _query: &Q) -> Result<Option<DiscMetadata>, ProviderError> {
        self.calls.hit();
        (self.answer)()
    }
}

pub struct FakeCoverArt {
    succeed: bool,
    pub calls: Calls,
}

impl FakeCoverArt {
    pub fn new(succeed: bool) -> Self {
        Self {
            succeed,
            calls: Calls::default(),
        }
    }
}

#[async_trait]
impl CoverArtFetcher for FakeCoverArt {
    async fn fetch_front(&self, _release_id: &str, dest: &Path) -> Result<(), CoverArtError> {
        self.calls.hit();
        if !self.succeed {
            return Err(CoverArtError::NotFound(404));
        }
        tokio::fs::write(dest, b"\xFF\xD8\xFF\xE0").await?;
        Ok(())
    }
}
