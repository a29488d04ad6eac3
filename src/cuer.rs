//! Disc to playlist pipeline
//!
//! [`Cuer::generate`] reads the disc (unless a release ID is given),
//! returns the cached playlist when there is one, and otherwise resolves
//! metadata and writes a fresh playlist.

use crate::cache::{MaterializeError, PlaylistCache};
use crate::cd::{self, DiscReadError, DiscReader};
use crate::config::Config;
use crate::cover_art::{CoverArtArchive, CoverArtFetcher};
use crate::gnudb::GnuDbClient;
use crate::musicbrainz::MusicBrainzClient;
use crate::resolver::{ResolveError, Resolver};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CuerError {
    #[error("Failed to read disc: {0}")]
    Read(#[from] DiscReadError),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}

/// Per-invocation options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Regenerate even when a cached playlist exists
    pub overwrite: bool,
    /// MusicBrainz release ID; skips reading the disc and GNUDB
    pub release_id: Option<String>,
    /// Disc ID to file the playlist under, only with `release_id`
    pub disc_id: Option<String>,
}

impl GenerateOptions {
    pub fn validate(&self) -> Result<(), CuerError> {
        if self.disc_id.is_some() && self.release_id.is_none() {
            return Err(CuerError::Configuration(
                "a disc ID can only be given together with a MusicBrainz release ID".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct Cuer {
    config: Config,
    resolver: Resolver,
    cache: PlaylistCache,
    cover_art: Box<dyn CoverArtFetcher>,
    disc_reader: Box<dyn DiscReader>,
}

impl Cuer {
    pub fn new(
        config: Config,
        resolver: Resolver,
        cover_art: Box<dyn CoverArtFetcher>,
        disc_reader: Box<dyn DiscReader>,
    ) -> Self {
        let cache = PlaylistCache::new(&config.cache_location);
        Self {
            config,
            resolver,
            cache,
            cover_art,
            disc_reader,
        }
    }

    /// Wire the real providers, cover art client and disc reader
    pub fn from_config(config: &Config) -> Result<Self, CuerError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| CuerError::Configuration(format!("HTTP client: {}", e)))?;

        let gnudb = GnuDbClient::new(
            client.clone(),
            &config.gnudb_url,
            config.gnudb_hello().unwrap_or_default(),
        );
        let musicbrainz = MusicBrainzClient::new(client.clone(), &config.musicbrainz_url);
        let resolver = Resolver::new(
            Box::new(gnudb),
            Box::new(musicbrainz),
            config.provider_timeout,
        );

        Ok(Self::new(
            config.clone(),
            resolver,
            Box::new(CoverArtArchive::new(client, &config.cover_art_url)),
            cd::reader_from_config(config),
        ))
    }

    pub fn cache(&self) -> &PlaylistCache {
        &self.cache
    }

    /// Produce the playlist for the current disc or the given release and
    /// return its path.
    pub async fn generate(&self, options: &GenerateOptions) -> Result<PathBuf, CuerError> {
        options.validate()?;

        let playlist = match &options.release_id {
            Some(release_id) => self.generate_for_release(release_id, options).await?,
            None => self.generate_for_disc(options.overwrite).await?,
        };

        self.write_env_file(&playlist).await;
        Ok(playlist)
    }

    async fn generate_for_release(
        &self,
        release_id: &str,
        options: &GenerateOptions,
    ) -> Result<PathBuf, CuerError> {
        let key = options.disc_id.as_deref().unwrap_or(release_id);
        if let Some(cached) = self.cached(key, options.overwrite).await {
            return Ok(cached);
        }

        let mut metadata = self.resolver.resolve_release(release_id).await?;
        let path = self
            .cache
            .materialize(&mut metadata, key, self.cover_art.as_ref())
            .await?;
        Ok(path)
    }

    async fn generate_for_disc(&self, overwrite: bool) -> Result<PathBuf, CuerError> {
        if self.config.gnudb_hello().is_none() {
            return Err(CuerError::Configuration(
                "GNUDB lookups need gnudb_hello_email to be set".to_string(),
            ));
        }

        let identity = self.disc_reader.read_identity().await?;
        let key = identity.disc_id().to_string();
        if let Some(cached) = self.cached(&key, overwrite).await {
            return Ok(cached);
        }

        let mut metadata = self.resolver.resolve_disc(&identity).await?;
        let path = self
            .cache
            .materialize(&mut metadata, &key, self.cover_art.as_ref())
            .await?;
        Ok(path)
    }

    async fn cached(&self, key: &str, overwrite: bool) -> Option<PathBuf> {
        if overwrite {
            debug!("Overwrite requested for {}", key);
            return None;
        }
        if !self.cache.exists(key).await {
            return None;
        }
        let path = self.cache.playlist_path(key);
        info!("Playlist already exists at {}", path.display());
        Some(path)
    }

    async fn write_env_file(&self, playlist: &Path) {
        let Some(env_file) = &self.config.env_file else {
            return;
        };
        let content = format!("CUE_FILE={}", playlist.display());
        if let Err(e) = tokio::fs::write(env_file, content).await {
            warn!("Failed to write env file {}: {}", env_file.display(), e);
        }
    }
}
