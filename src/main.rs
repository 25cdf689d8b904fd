//! deckscan - recognize decklists from saved OCR output

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use deckscan::config::{self, AppConfig, DataConfig};
use deckscan::data::{DataFile, DataManager};
use deckscan::recognition::{normalize, DeckRecognizer, NormalizeMode};
use deckscan::vision::SavedBoxTexts;
use deckscan::Deck;

/// deckscan - decklist recognition from OCR fragments
#[derive(Parser, Debug)]
#[command(name = "deckscan")]
#[command(about = "Turns OCR output of a decklist into a main deck and sideboard")]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log per-fragment matching decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize a deck from an image's saved box texts
    Recognize {
        /// Image path, or a box-text file
        image: String,
        /// Write the deck here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Recognize a deck and count differences with an expected deck file
    Compare {
        image: String,
        expected: PathBuf,
    },
    /// Download the card and keyword lists
    Fetch {
        /// Download again even when cached
        #[arg(long)]
        force: bool,
    },
    /// Print the normalized keys for some text
    Normalize { text: Vec<String> },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    let app_config = config::load_or_create_config(&config_path)?;

    match args.command {
        Command::Recognize { image, output } => {
            let deck = recognize(&app_config, &image)?;
            match output {
                Some(path) => deck.save(&path)?,
                None => print!("{}", deck),
            }
        }
        Command::Compare { image, expected } => {
            let deck = recognize(&app_config, &image)?;
            let expected = Deck::load(&expected)?;
            let errors = deck.diff(&expected);
            println!("{} errors ({} cards expected)", errors, expected.len());
            if errors > 0 {
                print!("{}", deck);
            }
        }
        Command::Fetch { force } => {
            let manager = DataManager::new()?;
            if force {
                for file in DataFile::ALL {
                    manager.download(file)?;
                }
            } else {
                manager.ensure_all()?;
            }
            for file in DataFile::ALL {
                println!("{}: {:?}", file.display_name(), manager.file_path(file));
            }
        }
        Command::Normalize { text } => {
            let text = text.join(" ");
            println!("card:    {:?}", normalize(&text, NormalizeMode::CardName));
            println!("keyword: {:?}", normalize(&text, NormalizeMode::Light));
        }
    }

    Ok(())
}

fn recognize(app_config: &AppConfig, image: &str) -> Result<Deck> {
    let recognizer = build_recognizer(app_config)?;
    let backend = match &app_config.ocr.box_texts_dir {
        Some(dir) => SavedBoxTexts::with_dir(dir),
        None => SavedBoxTexts::new(),
    };
    recognizer.image_to_deck(&backend, image)
}

fn build_recognizer(app_config: &AppConfig) -> Result<DeckRecognizer> {
    let data = &app_config.data;
    let cards_path = data_path(data, data.cards_file.as_deref(), DataFile::AllCards)?;
    let keywords_path = data_path(data, data.keywords_file.as_deref(), DataFile::Keywords)?;

    let recognizer = DeckRecognizer::from_files(
        &cards_path,
        &keywords_path,
        &data.languages,
        app_config.recognition.clone(),
    )
    .context("Failed to build recognizer")?;
    Ok(recognizer)
}

/// Configured path, or the cached download
fn data_path(data: &DataConfig, configured: Option<&Path>, file: DataFile) -> Result<PathBuf> {
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }
    let manager = DataManager::new()?;
    if data.auto_download {
        manager.ensure_file(file)
    } else {
        Ok(manager.file_path(file))
    }
}
