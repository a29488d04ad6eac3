use crate::cd::ReleaseToc;
use crate::models::DiscMetadata;
use crate::provider::{MetadataProvider, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info, warn};

const PROVIDER: &str = "MusicBrainz";
const INCLUDES: &str = "inc=artists+recordings&fmt=json";

/// How to look a release up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseQuery {
    /// Fuzzy TOC lookup, first candidate wins
    Toc(ReleaseToc),
    /// Exact release MBID
    ReleaseId(String),
}

impl fmt::Display for ReleaseQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseQuery::Toc(toc) => write!(f, "TOC '{}'", toc),
            ReleaseQuery::ReleaseId(id) => write!(f, "release ID '{}'", id),
        }
    }
}

/// Response of `/discid/-?toc=...`
#[derive(Debug, Deserialize)]
struct ReleaseList {
    #[serde(default)]
    releases: Vec<ReleaseResponse>,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    id: String,
    #[serde(default)]
    title: String,
    date: Option<String>,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    media: Vec<Medium>,
}

#[derive(Debug, Deserialize)]
struct ArtistCredit {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Medium {
    #[serde(default)]
    tracks: Vec<TrackResponse>,
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
    title: String,
}

#[derive(Clone)]
pub struct MusicBrainzClient {
    client: Client,
    base_url: String,
}

impl MusicBrainzClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, query: &ReleaseQuery) -> String {
        match query {
            ReleaseQuery::Toc(toc) => format!(
                "{}/discid/-?toc={}&{}",
                self.base_url,
                toc.query_form(),
                INCLUDES
            ),
            ReleaseQuery::ReleaseId(id) => format!(
                "{}/release/{}?{}",
                self.base_url,
                urlencoding::encode(id),
                INCLUDES
            ),
        }
    }

    /// GET a JSON document; `None` on 404
    async fn get_json<T>(&self, url: &str) -> Result<Option<T>, ProviderError>
    where
        T: for<'de> Deserialize<'de>,
    {
        debug!("MusicBrainz API request: {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            warn!("MusicBrainz API error response ({})", status);
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ProviderError::Malformed {
                provider: PROVIDER,
                message: format!("failed to parse JSON: {}", e),
            })
    }
}

#[async_trait]
impl MetadataProvider for MusicBrainzClient {
    type Query = ReleaseQuery;

    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, query: &ReleaseQuery) -> Result<Option<DiscMetadata>, ProviderError> {
        info!("🎵 MusicBrainz: Looking up {}", query);
        let url = self.url_for(query);

        let release = match query {
            ReleaseQuery::Toc(_) => self
                .get_json::<ReleaseList>(&url)
                .await?
                .and_then(|list| list.releases.into_iter().next()),
            ReleaseQuery::ReleaseId(_) => self.get_json::<ReleaseResponse>(&url).await?,
        };

        let Some(release) = release else {
            info!("MusicBrainz: no release for {}", query);
            return Ok(None);
        };

        let metadata = release_to_metadata(release)?;
        info!(
            "✓ MusicBrainz found '{}' by '{}' ({})",
            metadata.title, metadata.artist, metadata.id
        );
        Ok(Some(metadata))
    }
}

fn release_to_metadata(release: ReleaseResponse) -> Result<DiscMetadata, ProviderError> {
    let medium = release
        .media
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Malformed {
            provider: PROVIDER,
            message: format!("release {} has no media", release.id),
        })?;

    let artist = release
        .artist_credit
        .into_iter()
        .next()
        .map(|credit| credit.name)
        .unwrap_or_default();

    Ok(DiscMetadata {
        id: release.id,
        artist,
        title: release.title,
        release_date: release.date.filter(|d| !d.is_empty()),
        genre: None,
        tracks: medium.tracks.into_iter().map(|t| t.title).collect(),
        cover_art_path: None,
    })
}
