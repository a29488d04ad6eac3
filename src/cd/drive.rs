//! CD drive access and TOC encodings

use async_trait::async_trait;
use discid::DiscId;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// CD audio runs at 75 sectors per second
const SECTORS_PER_SECOND: u32 = 75;

#[derive(Debug, Error)]
pub enum DiscReadError {
    #[error("Failed to read disc in {device}: {message}")]
    Unreadable { device: String, message: String },
    #[error("Invalid table of contents: {0}")]
    InvalidToc(String),
    #[error("{program} failed: {message}")]
    Command { program: String, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// CDDB-style TOC: `<freedb-id> <track-count> <offset>... <length-seconds>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyToc(String);

impl LegacyToc {
    /// Validate a TOC line such as `cd-discid` prints it
    pub fn parse(line: &str) -> Result<Self, DiscReadError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(DiscReadError::InvalidToc(format!(
                "expected at least 4 fields, got '{}'",
                line.trim()
            )));
        }

        let disc_id = fields[0];
        if disc_id.len() != 8 || !disc_id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DiscReadError::InvalidToc(format!(
                "'{}' is not a FreeDB disc ID",
                disc_id
            )));
        }

        let numbers = parse_numbers(&fields[1..])?;
        let track_count = numbers[0] as usize;
        if track_count == 0 || numbers.len() != track_count + 2 {
            return Err(DiscReadError::InvalidToc(format!(
                "{} tracks announced but {} offsets given",
                track_count,
                numbers.len().saturating_sub(2)
            )));
        }

        Ok(LegacyToc(fields.join(" ")))
    }

    /// Build the TOC from a FreeDB ID, track start sectors and the lead-out
    pub fn from_offsets(freedb_id: &str, offsets: &[u32], leadout: u32) -> Self {
        let mut fields = vec![freedb_id.to_string(), offsets.len().to_string()];
        fields.extend(offsets.iter().map(|o| o.to_string()));
        fields.push((leadout / SECTORS_PER_SECOND).to_string());
        LegacyToc(fields.join(" "))
    }

    /// FreeDB disc ID, the first field
    pub fn disc_id(&self) -> &str {
        self.0.split(' ').next().unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Space separators replaced by `+` for use inside a query string
    pub fn query_form(&self) -> String {
        self.0.replace(' ', "+")
    }
}

impl fmt::Display for LegacyToc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// MusicBrainz TOC: `<first> <last> <lead-out> <offset>...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseToc(String);

impl ReleaseToc {
    pub fn new(toc: impl Into<String>) -> Self {
        ReleaseToc(toc.into())
    }

    /// Convert `cd-discid --musicbrainz` output (`<count> <offset>... <lead-out>`)
    pub fn from_cd_discid(line: &str) -> Result<Self, DiscReadError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            return Err(DiscReadError::InvalidToc("empty MusicBrainz TOC".to_string()));
        }
        let numbers = parse_numbers(&fields)?;
        let track_count = numbers[0] as usize;
        if track_count == 0 || numbers.len() != track_count + 2 {
            return Err(DiscReadError::InvalidToc(format!(
                "malformed MusicBrainz TOC '{}'",
                line.trim()
            )));
        }

        let offsets = &numbers[1..=track_count];
        let leadout = numbers[track_count + 1];
        Ok(Self::from_offsets(1, offsets, leadout))
    }

    pub fn from_offsets(first_track: u32, offsets: &[u32], leadout: u32) -> Self {
        let last_track = first_track + offsets.len() as u32 - 1;
        let mut fields = vec![
            first_track.to_string(),
            last_track.to_string(),
            leadout.to_string(),
        ];
        fields.extend(offsets.iter().map(|o| o.to_string()));
        ReleaseToc(fields.join(" "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn query_form(&self) -> String {
        self.0.replace(' ', "+")
    }
}

impl fmt::Display for ReleaseToc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn parse_numbers(fields: &[&str]) -> Result<Vec<u32>, DiscReadError> {
    fields
        .iter()
        .map(|f| {
            f.parse::<u32>()
                .map_err(|_| DiscReadError::InvalidToc(format!("'{}' is not a sector count", f)))
        })
        .collect()
}

/// Identity of the inserted disc, computed once per read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscIdentity {
    pub legacy_toc: LegacyToc,
    pub release_toc: ReleaseToc,
}

impl DiscIdentity {
    /// FreeDB disc ID, used as the cache key
    pub fn disc_id(&self) -> &str {
        self.legacy_toc.disc_id()
    }
}

/// Source of the inserted disc's identity
#[async_trait]
pub trait DiscReader: Send + Sync {
    async fn read_identity(&self) -> Result<DiscIdentity, DiscReadError>;
}

/// Reads the TOC through libdiscid
#[derive(Debug, Clone)]
pub struct LibDiscIdReader {
    device: String,
}

impl LibDiscIdReader {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }
}

#[async_trait]
impl DiscReader for LibDiscIdReader {
    async fn read_identity(&self) -> Result<DiscIdentity, DiscReadError> {
        let device = self.device.clone();
        info!("💿 Reading TOC from {}", device);

        // The drive handle lives only inside this closure
        let identity = tokio::task::spawn_blocking(move || {
            let disc = DiscId::read(Some(device.as_str())).map_err(|e| DiscReadError::Unreadable {
                device: device.clone(),
                message: e.to_string(),
            })?;
            identity_from_disc(&disc)
        })
        .await
        .map_err(|e| DiscReadError::Unreadable {
            device: self.device.clone(),
            message: format!("read task failed: {}", e),
        })??;

        debug!("GNU TOC: {}", identity.legacy_toc);
        debug!("MusicBrainz TOC: {}", identity.release_toc);
        Ok(identity)
    }
}

fn identity_from_disc(disc: &DiscId) -> Result<DiscIdentity, DiscReadError> {
    let offsets: Vec<u32> = disc
        .tracks()
        .map(|track| {
            u32::try_from(track.offset).map_err(|_| {
                DiscReadError::InvalidToc(format!(
                    "track {} has negative offset {}",
                    track.number, track.offset
                ))
            })
        })
        .collect::<Result<_, _>>()?;

    if offsets.is_empty() {
        return Err(DiscReadError::InvalidToc("disc has no tracks".to_string()));
    }

    let leadout = u32::try_from(disc.sectors())
        .map_err(|_| DiscReadError::InvalidToc(format!("invalid lead-out {}", disc.sectors())))?;

    Ok(DiscIdentity {
        legacy_toc: LegacyToc::from_offsets(&disc.freedb_id(), &offsets, leadout),
        release_toc: ReleaseToc::new(disc.toc_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_legacy_toc() {
        let toc = LegacyToc::parse("a50c6c0c 3 150 18051 34963 2926\n").unwrap();
        assert_eq!(toc.disc_id(), "a50c6c0c");
        assert_eq!(toc.as_str(), "a50c6c0c 3 150 18051 34963 2926");
        assert_eq!(toc.query_form(), "a50c6c0c+3+150+18051+34963+2926");
    }

    #[test]
    fn test_parse_legacy_toc_rejects_garbage() {
        assert!(LegacyToc::parse("").is_err());
        assert!(LegacyToc::parse("zzzzzzzz 1 150 60").is_err());
        assert!(LegacyToc::parse("a50c6c0c 3 150 18051 2926").is_err());
        assert!(LegacyToc::parse("a50c6c0c 0 2926 1").is_err());
    }

    #[test]
    fn test_legacy_toc_from_offsets() {
        let toc = LegacyToc::from_offsets("a50c6c0c", &[150, 18051, 34963], 219450);
        assert_eq!(toc.as_str(), "a50c6c0c 3 150 18051 34963 2926");
        assert_eq!(LegacyToc::parse(toc.as_str()).unwrap(), toc);
    }

    #[test]
    fn test_release_toc_from_cd_discid() {
        let toc = ReleaseToc::from_cd_discid("3 150 18051 34963 219450").unwrap();
        assert_eq!(toc.as_str(), "1 3 219450 150 18051 34963");
        assert_eq!(toc.query_form(), "1+3+219450+150+18051+34963");
    }

    #[test]
    fn test_release_toc_from_cd_discid_rejects_bad_counts() {
        assert!(ReleaseToc::from_cd_discid("").is_err());
        assert!(ReleaseToc::from_cd_discid("4 150 18051 219450").is_err());
        assert!(ReleaseToc::from_cd_discid("3 150 x 34963 219450").is_err());
    }

    #[test]
    fn test_identity_disc_id_is_freedb_id() {
        let identity = DiscIdentity {
            legacy_toc: LegacyToc::from_offsets("0a0b0c0d", &[150], 15000),
            release_toc: ReleaseToc::from_offsets(1, &[150], 15000),
        };
        assert_eq!(identity.disc_id(), "0a0b0c0d");
        assert_eq!(identity.release_toc.as_str(), "1 1 15000 150");
    }
}
