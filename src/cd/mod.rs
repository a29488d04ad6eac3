//! Disc identity
//!
//! Reads the table of contents of the inserted disc and derives the two
//! lookup keys used downstream: the legacy CDDB TOC (GNUDB query and cache
//! key) and the MusicBrainz TOC string.

pub mod cd_discid;
pub mod drive;

pub use cd_discid::CdDiscIdReader;
pub use drive::{
    DiscIdentity, DiscReadError, DiscReader, LegacyToc, LibDiscIdReader, ReleaseToc,
};

use crate::config::{Config, DiscReaderKind};

/// Build the disc reader selected in the configuration
pub fn reader_from_config(config: &Config) -> Box<dyn DiscReader> {
    match config.disc_reader {
        DiscReaderKind::LibDiscId => Box::new(LibDiscIdReader::new(&config.device)),
        DiscReaderKind::CdDiscId => Box::new(CdDiscIdReader::new(&config.device)),
    }
}
