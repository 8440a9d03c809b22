use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use district_zones::config::AppConfig;
use district_zones::filter::Selection;
use district_zones::processing::Atlas;
use district_zones::{data, export, upload, Error};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Keep only districts of this zone
    #[arg(long)]
    zone: Option<String>,
    /// Keep only this district
    #[arg(long)]
    district: Option<String>,
}

impl FilterArgs {
    fn selection(&self) -> Selection {
        Selection::from_params(self.zone.as_deref(), self.district.as_deref())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the zone map and site endpoints
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Join a site list against the districts and write XLSX and KMZ exports
    Export {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Site list (.xlsx or .csv) with Cod Site, Latitudine, Longitudine
        #[arg(short, long, value_name = "FILE")]
        sites: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
    },
    /// Print each district with its zone and color
    Inspect {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_atlas(config: &AppConfig) -> Result<Atlas, Error> {
    let boundaries = data::load_boundaries(&config.input.boundaries, &config.input.district_column)?;
    Ok(Atlas::new(boundaries, &config.zone_table()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Serve { config } => {
            tracing::info!(config = ?config, "serving zone map");
            let app_config = AppConfig::load_from_file(config)?;

            // A boundary load failure is reported by the API, not fatal.
            let atlas = load_atlas(&app_config);

            district_zones::server::start_server(app_config, atlas).await?;
        }
        Commands::Export {
            config,
            sites,
            filter,
            out_dir,
        } => {
            let app_config = AppConfig::load_from_file(config)?;

            // 1. Load and annotate districts
            let atlas = load_atlas(&app_config)?;

            // 2. Parse, join and filter sites
            let sites = upload::load_sites(sites)?;
            let located = atlas.locate_sites(sites, &filter.selection());

            // 3. Write exports
            fs::create_dir_all(out_dir)
                .with_context(|| format!("Failed to create output directory {:?}", out_dir))?;
            let xlsx_path = out_dir.join(export::XLSX_FILE_NAME);
            fs::write(&xlsx_path, export::write_xlsx(&located)?)
                .with_context(|| format!("Failed to write {:?}", xlsx_path))?;
            let kmz_path = out_dir.join(export::KMZ_FILE_NAME);
            fs::write(&kmz_path, export::write_kmz(&located)?)
                .with_context(|| format!("Failed to write {:?}", kmz_path))?;

            tracing::info!(sites = located.len(), xlsx = ?xlsx_path, kmz = ?kmz_path, "export complete");
        }
        Commands::Inspect { config, filter } => {
            let app_config = AppConfig::load_from_file(config)?;
            let atlas = load_atlas(&app_config)?;
            let selection = filter.selection();
            for district in atlas.select_districts(&selection) {
                println!("{}\t{}\t{}", district.color, district.zone, district.name);
            }
        }
    }

    Ok(())
}
