use crate::error::CaptionError;
use clap::{Args, Parser, Subcommand};
use museum_caption_common::schema::{find_language, language_names, LanguageProfile};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "museum-caption")]
#[command(about = "Museum object photo matching and AI catalog text generation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Per-run overrides of the configured pacing
#[derive(Args, Debug, Clone, Default)]
pub struct PacingArgs {
    /// Requests per pacing window
    #[arg(long)]
    pub batch: Option<usize>,

    /// Pacing window in seconds
    #[arg(long)]
    pub window: Option<u64>,

    /// Images sent per object
    #[arg(long)]
    pub max_images: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Caption every photograph of a folder or ZIP archive
    Caption {
        /// Image folder or .zip archive
        #[arg(required = true)]
        input: PathBuf,

        /// Output file (.csv or .xlsx)
        #[arg(short, long, default_value = "captions.csv")]
        output: PathBuf,

        /// Output language (asked interactively when omitted)
        #[arg(short, long)]
        language: Option<Language>,

        /// Scan subfolders as well
        #[arg(short = 'r', long)]
        recursive: bool,

        #[command(flatten)]
        pacing: PacingArgs,
    },

    /// Describe object groups using spreadsheet facts
    Enrich {
        /// Image folder or .zip archive
        #[arg(required = true)]
        images: PathBuf,

        /// Metadata spreadsheet (.csv/.xlsx)
        #[arg(short, long)]
        sheet: PathBuf,

        /// Output file (.csv or .xlsx)
        #[arg(short, long, default_value = "enriched_captions.csv")]
        output: PathBuf,

        /// Output language (asked interactively when omitted)
        #[arg(short, long)]
        language: Option<Language>,

        /// Also ask for a primary category
        #[arg(long)]
        with_category: bool,

        #[command(flatten)]
        pacing: PacingArgs,
    },

    /// Multi-language catalog entries straight from the spreadsheet
    Catalog {
        /// Metadata spreadsheet (.csv/.xlsx)
        #[arg(required = true)]
        sheet: PathBuf,

        /// Photograph root (per-year subfolders)
        #[arg(short, long)]
        images: PathBuf,

        /// Comma-separated languages
        #[arg(short, long, value_delimiter = ',', required = true)]
        languages: Vec<Language>,

        /// Output file (.xlsx or .csv)
        #[arg(short, long, default_value = "catalog.xlsx")]
        output: PathBuf,

        #[command(flatten)]
        pacing: PacingArgs,
    },

    /// Merge metadata exports and collapse rows per object ID
    Merge {
        /// Input spreadsheets
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output CSV
        #[arg(short, long, default_value = "merged_data.csv")]
        output: PathBuf,
    },

    /// Rename coded columns and extract year/mass/dimensions
    Clean {
        /// Metadata export
        #[arg(required = true)]
        input: PathBuf,

        /// Output CSV
        #[arg(short, long, default_value = "cleaned_data.csv")]
        output: PathBuf,
    },

    /// Copy the photographs referenced by a spreadsheet
    CopyImages {
        /// Spreadsheet with an image path column
        #[arg(short, long)]
        sheet: PathBuf,

        /// Source folders, searched in order
        #[arg(long = "from", required = true)]
        from: Vec<PathBuf>,

        /// Target folder
        #[arg(long = "to")]
        to: PathBuf,
    },

    /// Show or edit the configuration
    Config {
        /// Store the API key
        #[arg(long)]
        set_api_key: Option<String>,

        /// Show the configuration
        #[arg(long)]
        show: bool,
    },
}

/// Output language from the static language table
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Language(pub &'static LanguageProfile);

impl std::str::FromStr for Language {
    type Err = CaptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        find_language(s).map(Language).ok_or_else(|| {
            CaptionError::UnsupportedLanguage(format!(
                "{}. Use one of {}",
                s,
                language_names().join(", ")
            ))
        })
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.name)
    }
}
