use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::config;
use crate::domain::track::NewTrack;
use crate::storage::db::utc_timestamp;
use crate::storage::operations::MetadataStore;
use crate::storage::query::TrackFilter;

#[derive(Parser)]
#[command(name = "muzadeck")]
#[command(version = "0.1")]
#[command(about = "Append-only music track metadata catalog")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run http server exposing the catalog
    Serve,
    /// Add a track given as a JSON object
    Add {
        /// e.g. '{"song_title": "Blue Moon", "year_recorded": 1955}'
        #[arg(long)]
        json: String,
    },
    /// Show one track by its id
    Get { id: i64 },
    /// List every track
    List,
    /// Search tracks by partial text fields and year ranges
    Search(TrackFilter),
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let cfg = config::Config::load(&cli.config)?;
    let store = MetadataStore::new(&cfg.database).context("Failed to initialize store")?;

    match cli.command {
        Commands::Serve => {
            let http_server = crate::http::server::HttpServer::new(store, cfg.http);

            log::info!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr,
                http_server.config.port
            );
            http_server.run();
        }

        Commands::Add { json } => {
            let candidate: NewTrack =
                serde_json::from_str(&json).with_context(|| "Failed to parse track JSON")?;
            let track = store
                .insert(candidate.prepared(utc_timestamp()))
                .context("Failed to add track")?;
            print_json(&track)?;
        }

        Commands::Get { id } => match store.fetch_by_id(id)? {
            Some(track) => print_json(&track)?,
            None => bail!("track {id} not found"),
        },

        Commands::List => {
            print_json(&store.fetch_all()?)?;
        }

        Commands::Search(filter) => {
            print_json(&store.search(&filter)?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands};

    #[test]
    fn test_parse_search_flags() {
        let cli = Cli::try_parse_from([
            "muzadeck",
            "search",
            "--title-contains",
            "blue",
            "--min-year-recorded",
            "1960",
        ])
        .unwrap();

        match cli.command {
            Commands::Search(filter) => {
                assert_eq!(filter.title_contains.as_deref(), Some("blue"));
                assert_eq!(filter.min_year_recorded, Some(1960));
                assert_eq!(filter.max_year_recorded, None);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_parse_get_with_config() {
        let cli = Cli::try_parse_from(["muzadeck", "-c", "/etc/muzadeck.toml", "get", "3"]).unwrap();

        assert_eq!(cli.config.to_str(), Some("/etc/muzadeck.toml"));
        assert!(matches!(cli.command, Commands::Get { id: 3 }));
    }

    #[test]
    fn test_rejects_non_numeric_year() {
        assert!(Cli::try_parse_from(["muzadeck", "search", "--max-year-released", "soon"]).is_err());
    }
}
