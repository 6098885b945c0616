use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::video::LanguagePreference;

#[derive(Parser, Debug)]
#[command(
    name = "transcript-extractor",
    about = "Transcript Extractor - Save YouTube caption tracks as plain-text files",
    version,
    long_about = "Fetches the caption track of a YouTube video (manual captions preferred over auto-generated ones), \
                  flattens it to text and saves it as <title>_transcript.txt without overwriting existing files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TRANSCRIPT_EXTRACTOR_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the transcript of a single video
    Extract {
        /// YouTube URL (watch, youtu.be or embed) or bare 11-character video id
        #[arg(value_name = "URL_OR_ID")]
        reference: String,

        /// Caption language code, e.g. 'en' or 'pt-BR' (first manual track if not specified)
        #[arg(short, long, value_name = "LANG")]
        lang: Option<LanguagePreference>,

        /// Directory to write the transcript into (overrides config)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Show or initialize the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// Serve the web front end
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}
