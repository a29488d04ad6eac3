use clap::Parser;
use disc_cuer::{Config, Cuer, GenerateOptions};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "disc-cuer")]
#[command(about = "Generate a CUE playlist for the audio CD in the drive", long_about = None)]
struct Args {
    /// Regenerate the playlist even if it is already cached
    #[arg(long)]
    overwrite: bool,

    /// Look up this MusicBrainz release directly instead of reading the disc
    #[arg(long = "musicbrainz", value_name = "RELEASE_ID")]
    release_id: Option<String>,

    /// Disc ID to cache the playlist under (requires --musicbrainz)
    #[arg(long = "disc-id", value_name = "DISC_ID")]
    disc_id: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Use RUST_LOG if set, otherwise info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let options = GenerateOptions {
        overwrite: args.overwrite,
        release_id: args.release_id,
        disc_id: args.disc_id,
    };

    let result = match Cuer::from_config(&config) {
        Ok(cuer) => cuer.generate(&options).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(path) => println!("{}", path.display()),
        Err(e) => {
            error!("❌ {}", e);
            std::process::exit(1);
        }
    }
}
