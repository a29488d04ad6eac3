//! GNUDB client (CDDB protocol over HTTP)

use crate::cd::LegacyToc;
use crate::models::DiscMetadata;
use crate::provider::{MetadataProvider, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;
use tracing::{debug, info};

const PROVIDER: &str = "GNUDB";
const CGI_PATH: &str = "/~cddb/cddb.cgi";
const PROTOCOL_LEVEL: u32 = 6;
const GNUDB_USER_AGENT: &str = "curl/8.9.1";
const EXACT_MATCH: &str = "Found exact matches";

// Record keys
const KEY_TITLE: &str = "DTITLE=";
const KEY_YEAR: &str = "DYEAR=";
const KEY_GENRE: &str = "DGENRE=";
const KEY_TRACK: &str = "TTITLE";

#[derive(Clone)]
pub struct GnuDbClient {
    client: Client,
    base_url: String,
    hello: String,
}

impl GnuDbClient {
    /// `hello` is the CDDB hello string, already `+`-joined
    pub fn new(client: Client, base_url: impl Into<String>, hello: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            hello: hello.into(),
        }
    }

    /// Issue one CDDB command (words joined with `+`) and return the body
    async fn command(&self, cmd: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}{}?cmd={}&hello={}&proto={}",
            self.base_url, CGI_PATH, cmd, self.hello, PROTOCOL_LEVEL
        );
        debug!("GNUDB request: {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, GNUDB_USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: response.status().as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl MetadataProvider for GnuDbClient {
    type Query = LegacyToc;

    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, toc: &LegacyToc) -> Result<Option<DiscMetadata>, ProviderError> {
        info!("📀 GNUDB: Looking up disc '{}'", toc.disc_id());

        let body = self
            .command(&format!("cddb+query+{}", toc.query_form()))
            .await?;
        if !body.contains(EXACT_MATCH) {
            info!("GNUDB: no exact match for {}", toc.disc_id());
            return Ok(None);
        }

        let record_id = parse_match_id(&body)?;
        debug!("GNUDB match: {}", record_id);

        let record = self
            .command(&format!("cddb+read+data+{}", record_id))
            .await?;
        let metadata = parse_record(&record)?;

        info!(
            "✓ GNUDB found '{}' by '{}' ({} tracks)",
            metadata.title,
            metadata.artist,
            metadata.tracks.len()
        );
        Ok(Some(metadata))
    }
}

/// Record ID from a query response: second field of the second line
fn parse_match_id(body: &str) -> Result<String, ProviderError> {
    body.lines()
        .nth(1)
        .and_then(|line| line.split_whitespace().nth(1))
        .map(|id| id.to_string())
        .ok_or_else(|| ProviderError::Malformed {
            provider: PROVIDER,
            message: "exact match announced without a match line".to_string(),
        })
}

/// Parse a `cddb read` record. Repeated keys continue the previous value.
fn parse_record(body: &str) -> Result<DiscMetadata, ProviderError> {
    let mut dtitle = String::new();
    let mut year = String::new();
    let mut genre = String::new();
    let mut tracks: BTreeMap<usize, String> = BTreeMap::new();

    for line in body.lines().map(|l| l.trim_end_matches('\r')) {
        if let Some(value) = line.strip_prefix(KEY_TITLE) {
            dtitle.push_str(value);
        } else if let Some(value) = line.strip_prefix(KEY_YEAR) {
            year.push_str(value);
        } else if let Some(value) = line.strip_prefix(KEY_GENRE) {
            genre.push_str(value);
        } else if let Some(rest) = line.strip_prefix(KEY_TRACK) {
            if let Some((index, value)) = rest.split_once('=') {
                if let Ok(index) = index.parse::<usize>() {
                    tracks.entry(index).or_default().push_str(value);
                }
            }
        }
    }

    let (artist, title) = match dtitle.split_once(" / ") {
        Some((artist, title)) => (artist.trim().to_string(), title.trim().to_string()),
        None => (String::new(), dtitle.trim().to_string()),
    };

    if title.is_empty() {
        return Err(ProviderError::Malformed {
            provider: PROVIDER,
            message: "no valid title in record".to_string(),
        });
    }

    Ok(DiscMetadata {
        id: String::new(),
        artist,
        title,
        release_date: non_empty(year),
        genre: non_empty(genre),
        tracks: tracks.into_values().collect(),
        cover_art_path: None,
    })
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    const QUERY_RESPONSE: &str = "210 Found exact matches, list follows (until terminating `.')\r\n\
        rock a50c6c0c AC/DC / Back In Black\r\n\
        .\r\n";

    const READ_RESPONSE: &str = "210 data a50c6c0c CD database entry follows (until terminating `.')\r\n\
        # xmcd\r\n\
        DISCID=a50c6c0c\r\n\
        DTITLE=AC/DC / Back In Black\r\n\
        DYEAR=1980\r\n\
        DGENRE=Hard Rock\r\n\
        TTITLE0=Hells Bells\r\n\
        TTITLE1=Shoot to Thrill\r\n\
        TTITLE2=What Do You Do for Money Honey\r\n\
        EXTD=\r\n\
        PLAYORDER=\r\n\
        .\r\n";

    /// Matches on the raw `cmd=` prefix of the query string
    struct Cmd(&'static str);

    impl Match for Cmd {
        fn matches(&self, request: &Request) -> bool {
            request
                .url
                .query()
                .is_some_and(|q| q.starts_with(&format!("cmd={}", self.0)))
        }
    }

    fn toc() -> LegacyToc {
        LegacyToc::parse("a50c6c0c 3 150 18051 34963 2926").unwrap()
    }

    fn client(server: &MockServer) -> GnuDbClient {
        GnuDbClient::new(Client::new(), server.uri(), "me%40example.org+example.org+disc-cuer+0.3")
    }

    #[test]
    fn test_parse_record() {
        let metadata = parse_record(READ_RESPONSE).unwrap();
        assert_eq!(metadata.artist, "AC/DC");
        assert_eq!(metadata.title, "Back In Black");
        assert_eq!(metadata.release_date.as_deref(), Some("1980"));
        assert_eq!(metadata.genre.as_deref(), Some("Hard Rock"));
        assert_eq!(
            metadata.tracks,
            vec![
                "Hells Bells",
                "Shoot to Thrill",
                "What Do You Do for Money Honey"
            ]
        );
        assert!(metadata.id.is_empty());
    }

    #[test]
    fn test_parse_record_continuation_lines() {
        let body = "DTITLE=Some Artist / A Very Long\nDTITLE= Title\nTTITLE1=Second\nTTITLE0=Fir\nTTITLE0=st\n";
        let metadata = parse_record(body).unwrap();
        assert_eq!(metadata.title, "A Very Long Title");
        assert_eq!(metadata.tracks, vec!["First", "Second"]);
        assert!(metadata.release_date.is_none());
        assert!(metadata.genre.is_none());
    }

    #[test]
    fn test_parse_record_without_separator() {
        let metadata = parse_record("DTITLE=Untitled Compilation\nTTITLE0=One\n").unwrap();
        assert_eq!(metadata.artist, "");
        assert_eq!(metadata.title, "Untitled Compilation");
    }

    #[test]
    fn test_parse_record_without_title_is_malformed() {
        assert!(matches!(
            parse_record("DYEAR=1980\nTTITLE0=One\n"),
            Err(ProviderError::Malformed { .. })
        ));
        assert!(parse_record("DTITLE=Artist / \n").is_err());
    }

    #[test]
    fn test_parse_match_id() {
        assert_eq!(parse_match_id(QUERY_RESPONSE).unwrap(), "a50c6c0c");
        assert!(parse_match_id("210 Found exact matches").is_err());
    }

    #[tokio::test]
    async fn test_fetch_exact_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CGI_PATH))
            .and(Cmd("cddb+query+a50c6c0c+3+150+18051+34963+2926"))
            .respond_with(ResponseTemplate::new(200).set_body_string(QUERY_RESPONSE))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(CGI_PATH))
            .and(Cmd("cddb+read+data+a50c6c0c"))
            .respond_with(ResponseTemplate::new(200).set_body_string(READ_RESPONSE))
            .expect(1)
            .mount(&server)
            .await;

        let metadata = client(&server).fetch(&toc()).await.unwrap().unwrap();
        assert_eq!(metadata.title, "Back In Black");
        assert_eq!(metadata.tracks.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_no_exact_match_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CGI_PATH))
            .and(Cmd("cddb+query+"))
            .respond_with(ResponseTemplate::new(200).set_body_string("202 No match found\r\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(Cmd("cddb+read+"))
            .respond_with(ResponseTemplate::new(200).set_body_string(READ_RESPONSE))
            .expect(0)
            .mount(&server)
            .await;

        assert!(client(&server).fetch(&toc()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(matches!(
            client(&server).fetch(&toc()).await,
            Err(ProviderError::Status { status: 503, .. })
        ));
    }
}
