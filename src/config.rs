use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const APP_NAME: &str = "disc-cuer";
pub const APP_VERSION: &str = "0.3";

const ENV_PREFIX: &str = "DISC_CUER_";
const DEFAULT_DEVICE: &str = "/dev/cdrom";
const DEFAULT_GNUDB_URL: &str = "https://gnudb.gnudb.org";
const DEFAULT_MUSICBRAINZ_URL: &str = "https://musicbrainz.org/ws/2";
const DEFAULT_COVER_ART_URL: &str = "https://coverartarchive.org/release";
const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// How the disc table of contents is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DiscReaderKind {
    /// Read the TOC in-process through libdiscid
    #[serde(rename = "libdiscid")]
    LibDiscId,
    /// Shell out to the `cd-discid` program
    #[serde(rename = "cd-discid")]
    CdDiscId,
}

impl FromStr for DiscReaderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "libdiscid" => Ok(DiscReaderKind::LibDiscId),
            "cd-discid" => Ok(DiscReaderKind::CdDiscId),
            _ => Err(ConfigError::InvalidValue {
                key: "disc_reader".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Application configuration.
///
/// Built once at startup and handed to every component that needs it;
/// nothing reads settings from global state after that.
#[derive(Clone, Debug)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,
    /// Root of the per-disc cache directories
    pub cache_location: PathBuf,
    /// CD device to read the TOC from
    pub device: String,
    pub gnudb_url: String,
    /// Email sent in the GNUDB hello string; GNUDB lookups need it
    pub gnudb_hello_email: Option<String>,
    pub musicbrainz_url: String,
    pub cover_art_url: String,
    pub disc_reader: DiscReaderKind,
    /// Upper bound for a single provider lookup, `None` waits forever
    pub provider_timeout: Option<Duration>,
    /// Shell env file receiving `CUE_FILE=<path>` after a successful run
    pub env_file: Option<PathBuf>,
}

/// Keys accepted in `config.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    cache_location: Option<PathBuf>,
    device: Option<String>,
    gnudb_url: Option<String>,
    gnudb_hello_email: Option<String>,
    musicbrainz_url: Option<String>,
    cover_art_url: Option<String>,
    disc_reader: Option<DiscReaderKind>,
    provider_timeout_secs: Option<u64>,
    env_file: Option<PathBuf>,
}

impl Config {
    /// Default configuration rooted at the given cache directory
    pub fn new(cache_location: impl Into<PathBuf>) -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            app_version: APP_VERSION.to_string(),
            cache_location: cache_location.into(),
            device: DEFAULT_DEVICE.to_string(),
            gnudb_url: DEFAULT_GNUDB_URL.to_string(),
            gnudb_hello_email: None,
            musicbrainz_url: DEFAULT_MUSICBRAINZ_URL.to_string(),
            cover_art_url: DEFAULT_COVER_ART_URL.to_string(),
            disc_reader: DiscReaderKind::LibDiscId,
            provider_timeout: Some(DEFAULT_PROVIDER_TIMEOUT),
            env_file: None,
        }
    }

    /// Load configuration: defaults, then `config.toml` files, then
    /// `.env` and `DISC_CUER_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_ok() {
            debug!("Config: loaded .env file");
        }

        let mut config = Self::new(default_cache_location());

        for path in config_file_paths() {
            if path.is_file() {
                info!("Config: reading {}", path.display());
                config.apply_file(read_config_file(&path)?);
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;

        if config.gnudb_hello_email.is_none() {
            warn!("Config: gnudb_hello_email is not set, GNUDB lookups will be refused");
        }

        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(v) = file.cache_location {
            self.cache_location = v;
        }
        if let Some(v) = file.device {
            self.device = v;
        }
        if let Some(v) = file.gnudb_url {
            self.gnudb_url = v;
        }
        if let Some(v) = file.gnudb_hello_email {
            self.gnudb_hello_email = non_empty(v);
        }
        if let Some(v) = file.musicbrainz_url {
            self.musicbrainz_url = v;
        }
        if let Some(v) = file.cover_art_url {
            self.cover_art_url = v;
        }
        if let Some(v) = file.disc_reader {
            self.disc_reader = v;
        }
        if let Some(secs) = file.provider_timeout_secs {
            self.provider_timeout = timeout_from_secs(secs);
        }
        if let Some(v) = file.env_file {
            self.env_file = Some(v);
        }
    }

    /// Apply `DISC_CUER_*` overrides. `lookup` maps a full variable name to
    /// its value.
    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = var("CACHE_LOCATION") {
            self.cache_location = PathBuf::from(v);
        }
        if let Some(v) = var("DEVICE") {
            self.device = v;
        }
        if let Some(v) = var("GNUDB_URL") {
            self.gnudb_url = v;
        }
        if let Some(v) = var("GNUDB_HELLO_EMAIL") {
            self.gnudb_hello_email = non_empty(v);
        }
        if let Some(v) = var("MUSICBRAINZ_URL") {
            self.musicbrainz_url = v;
        }
        if let Some(v) = var("COVER_ART_URL") {
            self.cover_art_url = v;
        }
        if let Some(v) = var("DISC_READER") {
            self.disc_reader = v.parse()?;
        }
        if let Some(v) = var("PROVIDER_TIMEOUT_SECS") {
            let secs = v.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: format!("{}PROVIDER_TIMEOUT_SECS", ENV_PREFIX),
                value: v.clone(),
            })?;
            self.provider_timeout = timeout_from_secs(secs);
        }
        if let Some(v) = var("ENV_FILE") {
            self.env_file = non_empty(v).map(PathBuf::from);
        }
        Ok(())
    }

    /// CDDB hello string: `user+host+client+version`
    pub fn gnudb_hello(&self) -> Option<String> {
        let email = self.gnudb_hello_email.as_deref()?;
        let host = email.split_once('@').map(|(_, d)| d).unwrap_or(email);
        Some(format!(
            "{}+{}+{}+{}",
            urlencoding::encode(email),
            urlencoding::encode(host),
            urlencoding::encode(&self.app_name),
            urlencoding::encode(&self.app_version)
        ))
    }

    /// User agent sent to MusicBrainz and the Cover Art Archive
    pub fn user_agent(&self) -> String {
        match &self.gnudb_hello_email {
            Some(email) => format!("{}/{} ( {} )", self.app_name, self.app_version, email),
            None => format!("{}/{}", self.app_name, self.app_version),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// 0 disables the timeout
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn default_cache_location() -> PathBuf {
    match dirs::cache_dir() {
        Some(dir) => dir.join(APP_NAME),
        None => PathBuf::from("/var/cache").join(APP_NAME),
    }
}

/// Candidate config files, lowest precedence first
fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc").join(APP_NAME).join("config.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(APP_NAME).join("config.toml"));
    }
    paths
}

fn read_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
