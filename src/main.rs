//! featdb CLI - inspect keypoints and descriptors in a feature database

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use featdb::config::{self, FeatdbConfig};
use featdb::ui::{self, Icons};
use featdb::{FeatureStore, ImageId};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "featdb")]
#[command(version)]
#[command(about = "Read keypoints and descriptors from a feature database")]
#[command(long_about = r#"
featdb reads the keypoints and descriptors a feature-extraction pipeline
stored in a SQLite database and prints them for inspection.

Example usage:
  featdb dump --database data/database.db --start 0 --end 20
  featdb stats --database data/database.db
  featdb show --image-id 3 --limit 10
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print keypoint count and descriptor shape for a range of image ids
    Dump {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// First image id (inclusive)
        #[arg(long)]
        start: Option<ImageId>,

        /// Last image id (exclusive)
        #[arg(long)]
        end: Option<ImageId>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Show aggregate keypoint and descriptor counts
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Show the features of one image
    Show {
        /// Image id
        #[arg(short, long)]
        image_id: ImageId,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Maximum number of keypoints to print
        #[arg(short, long, default_value = "10")]
        limit: usize,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// List image records
    Images {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Write a default featdb.toml
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let settings = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Dump { database, start, end, format } => {
            let range = settings.image_range();
            let start = start.unwrap_or(range.start);
            let end = end.unwrap_or(range.end);
            let database = resolve_database(database, &settings);

            let mut store = open_store(&database)?;
            tracing::info!("Dumping images {}..{} from {}", start, end, database.display());

            let mut records = Vec::new();
            for image_id in start..end {
                let keypoints = store.read_keypoints(image_id)?;
                let descriptors = store.read_descriptors(image_id)?;
                match format {
                    Format::Text => println!(
                        "{}\t{}\t{} {}",
                        image_id,
                        keypoints.len(),
                        descriptors.ncols(),
                        descriptors.nrows()
                    ),
                    Format::Json => records.push(serde_json::json!({
                        "image_id": image_id,
                        "keypoints": keypoints.len(),
                        "descriptor_cols": descriptors.ncols(),
                        "descriptor_rows": descriptors.nrows(),
                    })),
                }
            }
            store.close()?;

            if let Format::Json = format {
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
        }

        Commands::Stats { database, format } => {
            let database = resolve_database(database, &settings);
            let store = open_store(&database)?;
            let stats = store.stats()?;

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                Format::Text => {
                    ui::header(Icons::STATS, &format!("featdb statistics ({})", database.display()));
                    println!("{}", ui::stats_table(&stats));
                }
            }
        }

        Commands::Show { image_id, database, limit, format } => {
            let database = resolve_database(database, &settings);
            let store = open_store(&database)?;

            let keypoints = store.read_keypoints(image_id)?;
            let descriptors = store.read_descriptors(image_id)?;
            let shown = &keypoints[..keypoints.len().min(limit)];

            match format {
                Format::Json => {
                    let data = serde_json::json!({
                        "image_id": image_id,
                        "exists": store.exists_image_id(image_id)?,
                        "keypoint_count": keypoints.len(),
                        "descriptor_shape": [descriptors.nrows(), descriptors.ncols()],
                        "keypoints": shown,
                    });
                    println!("{}", serde_json::to_string_pretty(&data)?);
                }
                Format::Text => {
                    ui::header(Icons::IMAGE, &format!("Image {}", image_id));
                    ui::summary_row("Image record:", yes_no(store.exists_image_id(image_id)?));
                    ui::summary_row("Keypoints row:", yes_no(store.exists_keypoints(image_id)?));
                    ui::summary_row("Descriptors row:", yes_no(store.exists_descriptors(image_id)?));
                    ui::summary_row("Keypoints:", &keypoints.len().to_string());
                    ui::summary_row(
                        "Descriptors:",
                        &format!("{} x {}", descriptors.nrows(), descriptors.ncols()),
                    );

                    if shown.is_empty() {
                        println!("{} No keypoints.", Icons::EMPTY);
                    } else {
                        ui::section(&format!("{} First {} keypoints", Icons::POINT, shown.len()));
                        println!("{}", ui::keypoint_table(shown));
                    }
                }
            }
        }

        Commands::Images { database } => {
            let database = resolve_database(database, &settings);
            let store = open_store(&database)?;
            let images = store.read_images()?;

            if images.is_empty() {
                println!("{} No images found.", Icons::EMPTY);
            } else {
                for image in images {
                    println!(
                        "- [{}] {} {}",
                        image.image_id,
                        image.name,
                        ui::dim(&format!("(camera {})", image.camera_id))
                    );
                }
            }
        }

        Commands::InitConfig { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            let defaults = FeatdbConfig {
                database: Some(config::default_database_path().display().to_string()),
                start: Some(config::DEFAULT_IMAGE_RANGE.start),
                end: Some(config::DEFAULT_IMAGE_RANGE.end),
            };
            config::write_config(&path, &defaults, force)?;
            ui::success(&format!("Wrote {}", path.display()));
        }
    }

    Ok(())
}

/// CLI flag wins over the config file, which wins over `featdb.db`
fn resolve_database(flag: Option<PathBuf>, settings: &FeatdbConfig) -> PathBuf {
    flag.unwrap_or_else(|| settings.database_path())
}

fn open_store(database: &Path) -> anyhow::Result<FeatureStore> {
    if !database.exists() {
        ui::warn(&format!("{} does not exist, creating an empty database", database.display()));
    }
    tracing::debug!("{} Opening {}", Icons::DATABASE, database.display());
    Ok(FeatureStore::open(database)?)
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
