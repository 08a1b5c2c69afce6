mod config;
mod logger;

use anyhow::{Context, Result};
use card_images::{CachePaths, HttpFetcher, ImageCacheBuilder};
use card_sheets::{LayoutConstants, PairingPattern};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use config::{CONFIG_FILE, DeckPdfConfig};
use deck_resolver::{CardDatabase, ImageType};
use logger::StderrLogger;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "deckpdf", about = "Print-ready PDF proxies from a decklist", version)]
struct Cli {
    /// Config file (created with defaults if missing)
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the working directories, a sample decklist and the config file
    Init,

    /// Download the latest bulk card data and point the config at it
    FetchBulk,

    /// Render a decklist to `<output_dir>/<deck name>.pdf`
    Render {
        /// Decklist file
        deck: PathBuf,

        /// Print card backs on the reverse of each sheet
        #[arg(long)]
        two_sided: bool,

        /// Print both faces of double-faced cards as separate cards
        #[arg(long)]
        split: bool,

        /// Use the shared backside image for every back
        #[arg(long)]
        custom_backside: bool,

        /// Order two-sided pages F0 B0 F1 B1 instead of F0 F1 B0 B1
        #[arg(long)]
        no_stagger: bool,

        /// Image variant to download
        #[arg(long, value_enum)]
        image_type: Option<ImageTypeArg>,

        /// Skip border gamma correction
        #[arg(long)]
        no_gamma: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ImageTypeArg {
    Small,
    Normal,
    Large,
    Png,
    ArtCrop,
    BorderCrop,
}

impl From<ImageTypeArg> for ImageType {
    fn from(arg: ImageTypeArg) -> Self {
        match arg {
            ImageTypeArg::Small => Self::Small,
            ImageTypeArg::Normal => Self::Normal,
            ImageTypeArg::Large => Self::Large,
            ImageTypeArg::Png => Self::Png,
            ImageTypeArg::ArtCrop => Self::ArtCrop,
            ImageTypeArg::BorderCrop => Self::BorderCrop,
        }
    }
}

const SAMPLE_DECKLIST: &str = "\
# <copies> <name> (<set>) <number>
4 Lightning Bolt (M11) 149
# ! prints face A, !! prints face B of a double-faced card
2 Delver of Secrets (ISD) 51
1 !!Delver of Secrets (ISD) 51
# *name uses custom_cards/<name>.png
# 1 *My Token
# faces joined with || are printed front and back
# 1 *My Token || Lightning Bolt (M11) 149
";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    StderrLogger::new(StderrLogger::level_from_flags(cli.verbose, cli.quiet))
        .init()
        .context("Failed to install logger")?;

    match cli.command {
        Commands::Init => init(&cli.config).await?,

        Commands::FetchBulk => {
            let mut config = DeckPdfConfig::load_or_create(&cli.config).await?;
            let dir = config
                .bulk_path()
                .parent()
                .map(Path::to_owned)
                .unwrap_or_else(|| config.data_dir.clone());
            let path = deck_resolver::fetch_bulk_json(&dir, &config.http_identity()).await?;

            if let Ok(relative) = path.strip_prefix(&config.data_dir) {
                config.bulk_json_path = relative.to_owned();
            } else {
                config.bulk_json_path = path.clone();
            }
            config.save(&cli.config).await?;
            println!("Bulk data → {}", path.display());
        }

        Commands::Render {
            deck,
            two_sided,
            split,
            custom_backside,
            no_stagger,
            image_type,
            no_gamma,
        } => {
            let mut config = DeckPdfConfig::load_or_create(&cli.config).await?;
            config.two_sided |= two_sided;
            config.split_double_faced |= split;
            config.custom_backside |= custom_backside;
            config.stagger &= !no_stagger;
            config.gamma_correction &= !no_gamma;
            if let Some(image_type) = image_type {
                config.image_type = image_type.into();
            }
            config.validate()?;

            let output = render(&deck, &config).await?;
            println!("Generated {} → {}", deck.display(), output.display());
        }
    }

    Ok(())
}

async fn init(config_path: &Path) -> Result<()> {
    let config = DeckPdfConfig::load_or_create(config_path).await?;
    let paths = CachePaths::new(&config.data_dir, config.image_type, config.dpi);
    paths.ensure_directories().await?;

    let input_dir = config.data_dir.join("input");
    for dir in [&input_dir, &config.output_dir, &paths.custom_dir(), &paths.backside_dir()] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let sample = input_dir.join("sample.txt");
    if !tokio::fs::try_exists(&sample).await? {
        tokio::fs::write(&sample, SAMPLE_DECKLIST).await?;
        log::info!("Wrote sample decklist {}", sample.display());
    }

    println!("Initialized {}", config.data_dir.display());
    Ok(())
}

/// Resolve, cache, render and merge. Nothing is written to the output
/// directory unless every stage succeeds.
async fn render(deck: &Path, config: &DeckPdfConfig) -> Result<PathBuf> {
    let started = Instant::now();

    let bulk_path = config.bulk_path();
    let database = CardDatabase::load(&bulk_path)
        .await
        .with_context(|| format!("Failed to load card data from {}", bulk_path.display()))?;
    log::info!("Loaded {} card entries", database.len());

    let units = deck_resolver::load_decklist(deck, &database, &config.resolve_options())
        .await
        .with_context(|| format!("Failed to resolve {}", deck.display()))?;
    let unique = card_images::unique_sides(&units).len();
    log::info!(
        "Resolved {} cards on {} pages ({} distinct images)",
        units.len(),
        LayoutConstants::total_pages(units.len()),
        unique
    );

    let fetcher = HttpFetcher::new(&config.http_identity())?;
    let cache = ImageCacheBuilder::new(config.cache_options(), fetcher)?
        .build(&units)
        .await?;

    let sheet_options = config.sheet_options();
    let rendered = card_sheets::render_pages(Arc::from(units), Arc::new(cache), &sheet_options)
        .await?;

    let pattern = PairingPattern::from_flags(config.two_sided, config.stagger);
    let merged = tokio::task::spawn_blocking(move || card_sheets::merge_pages(&rendered, pattern))
        .await??;

    let output = config.output_path(deck);
    card_sheets::save_pdf(merged, &output).await?;
    log::info!("Finished in {:.2?}", started.elapsed());
    Ok(output)
}
