use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use muvi_suppliers::{api, suppliers::Registry};

#[derive(Parser)]
#[command(name = "muvi")]
#[command(about = "Browse muvipro movie sites and resolve their stream links")]
#[command(version)]
struct Cli {
    /// TOML file with extra `[[site]]` tables
    #[arg(long, global = true)]
    sites: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured sites
    Suppliers,

    /// List catalog sections of a site
    Channels { supplier: String },

    /// Load one page of a catalog section
    List {
        supplier: String,
        channel: String,

        #[arg(short, long, default_value = "1")]
        page: u16,
    },

    /// Search a site
    Search { supplier: String, query: String },

    /// Load the detail page of a title
    Details { supplier: String, url: String },

    /// Resolve playable streams of a movie or episode page
    Links { supplier: String, url: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut registry = Registry::builtin()?;
    if let Some(path) = &cli.sites {
        registry.register_sites_from_file(path)?;
    }

    match cli.command {
        Commands::Suppliers => print_json(&api::avalaible_suppliers(&registry)),
        Commands::Channels { supplier } => print_json(&api::get_channels(&registry, &supplier)?),
        Commands::List {
            supplier,
            channel,
            page,
        } => print_json(&api::load_channel(&registry, &supplier, channel, page).await?),
        Commands::Search { supplier, query } => {
            print_json(&api::search(&registry, &supplier, query).await?)
        }
        Commands::Details { supplier, url } => {
            print_json(&api::get_content_details(&registry, &supplier, url).await?)
        }
        Commands::Links { supplier, url } => {
            print_json(&api::load_links(&registry, &supplier, url).await?)
        }
    }
}
