mod library;
mod logging;
mod ports;
mod report;
mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use color_eyre::Result;

use crate::library::parser::parse_file;
use crate::logging::init_tracing;
use crate::services::migration::LibraryMigrator;
use crate::services::spotify::client::SpotifyHttpClient;

/// Migrate an exported iTunes library (tracks and playlists) to Spotify.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// OAuth2 access token for the Spotify Web API
    #[arg(short, long, env = "SPOTIFY_TOKEN")]
    token: String,

    /// Library.xml file exported from iTunes
    #[arg(short, long, env = "ITUNES_LIBRARY")]
    library: PathBuf,

    /// Log level filter
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,
}

// Exit codes match the behavior users of the original tool expect:
// 1 for bad flags or an unreadable library file, 2 for a rejected
// credential. Clap's default exit of 2 would collide with the auth code,
// so usage errors are mapped by hand.
const EXIT_USAGE_FAILURE: u8 = 1;
const EXIT_PARSE_FAILURE: u8 = 1;
const EXIT_AUTH_FAILURE: u8 = 2;

fn usage_exit_code(err: &clap::Error) -> u8 {
    // Help and version output are not failures.
    if err.use_stderr() { EXIT_USAGE_FAILURE } else { 0 }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            err.print()?;
            return Ok(ExitCode::from(usage_exit_code(&err)));
        }
    };
    init_tracing(&args.log_level)?;

    let library = match parse_file(&args.library) {
        Ok(library) => library,
        Err(err) => {
            eprintln!("Could not parse the library {}: {err}", args.library.display());
            return Ok(ExitCode::from(EXIT_PARSE_FAILURE));
        }
    };
    tracing::info!(
        tracks = library.tracks.len(),
        playlists = library.playlists.len(),
        "Parsed library"
    );

    let client = SpotifyHttpClient::new(args.token);
    let outcome = match LibraryMigrator::new(client).run(&library).await {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("{err:#}");
            return Ok(ExitCode::from(EXIT_AUTH_FAILURE));
        }
    };

    report::print(&outcome.unresolved);
    Ok(ExitCode::SUCCESS)
}
