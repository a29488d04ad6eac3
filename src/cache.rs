use crate::cover_art::CoverArtFetcher;
use crate::cue::render_playlist;
use crate::models::DiscMetadata;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

const PLAYLIST_FILE: &str = "playlist.cue";
const COVER_FILE: &str = "cover.jpg";

/// Errors that abort a materialization
#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("Failed to create cache directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write playlist {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// On-disk playlist cache, one directory per disc identifier:
///
/// ```text
/// <root>/<key>/playlist.cue
/// <root>/<key>/cover.jpg
/// ```
#[derive(Debug, Clone)]
pub struct PlaylistCache {
    root: PathBuf,
}

impl PlaylistCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_dir(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    pub fn playlist_path(&self, key: &str) -> PathBuf {
        self.entry_dir(key).join(PLAYLIST_FILE)
    }

    pub fn cover_path(&self, key: &str) -> PathBuf {
        self.entry_dir(key).join(COVER_FILE)
    }

    /// Whether a playlist has already been written for this key.
    /// Cover art and the bare directory don't count.
    pub async fn exists(&self, key: &str) -> bool {
        fs::metadata(self.playlist_path(key))
            .await
            .is_ok_and(|m| m.is_file())
    }

    /// Write the playlist for `key`, replacing any previous one.
    ///
    /// Cover art is fetched first when the metadata has none yet and a release
    /// ID is known. A failed cover download only leaves the cover out.
    pub async fn materialize(
        &self,
        metadata: &mut DiscMetadata,
        key: &str,
        cover_art: &dyn CoverArtFetcher,
    ) -> Result<PathBuf, MaterializeError> {
        let dir = self.entry_dir(key);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| MaterializeError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        if !metadata.has_cover_art() {
            self.attach_cover(metadata, key, cover_art).await;
        }

        let playlist = self.playlist_path(key);
        fs::write(&playlist, render_playlist(metadata))
            .await
            .map_err(|source| MaterializeError::Write {
                path: playlist.clone(),
                source,
            })?;

        info!("Wrote playlist {}", playlist.display());
        Ok(playlist)
    }

    async fn attach_cover(
        &self,
        metadata: &mut DiscMetadata,
        key: &str,
        cover_art: &dyn CoverArtFetcher,
    ) {
        if metadata.id.is_empty() {
            debug!("No release ID for {}, skipping cover art", key);
            return;
        }

        let dest = self.cover_path(key);
        match cover_art.fetch_front(&metadata.id, &dest).await {
            Ok(()) => metadata.cover_art_path = Some(dest),
            Err(e) => warn!("Cover art unavailable for release {}: {}", metadata.id, e),
        }
    }
}
