// Library exports for the binary and integration tests

pub mod cache;
pub mod cd;
pub mod config;
pub mod cover_art;
pub mod cue;
pub mod cuer;
pub mod gnudb;
pub mod models;
pub mod musicbrainz;
pub mod provider;
pub mod resolver;

pub use config::Config;
pub use cuer::{Cuer, CuerError, GenerateOptions};
pub use models::DiscMetadata;
