use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata for one audio disc, as resolved from a metadata provider.
///
/// Built fresh on every run; only its playlist projection is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscMetadata {
    /// Release ID (MusicBrainz) or empty when only GNUDB answered
    pub id: String,
    pub artist: String,
    pub title: String,
    /// Free-form date as the provider returned it ("1980", "2024-01-01")
    pub release_date: Option<String>,
    pub genre: Option<String>,
    /// Track titles in physical track order
    pub tracks: Vec<String>,
    /// Local path of the downloaded front cover, once fetched
    pub cover_art_path: Option<PathBuf>,
}

impl DiscMetadata {
    /// A result is only usable when it carries a title.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn has_cover_art(&self) -> bool {
        self.cover_art_path
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_requires_title() {
        let mut metadata = DiscMetadata {
            artist: "AC/DC".to_string(),
            tracks: vec!["Hells Bells".to_string()],
            ..Default::default()
        };
        assert!(!metadata.is_valid());

        metadata.title = "   ".to_string();
        assert!(!metadata.is_valid());

        metadata.title = "Back In Black".to_string();
        assert!(metadata.is_valid());
    }

    #[test]
    fn test_empty_cover_path_is_no_cover() {
        let mut metadata = DiscMetadata::default();
        assert!(!metadata.has_cover_art());

        metadata.cover_art_path = Some(PathBuf::new());
        assert!(!metadata.has_cover_art());

        metadata.cover_art_path = Some(PathBuf::from("/tmp/cover.jpg"));
        assert!(metadata.has_cover_art());
    }
}
