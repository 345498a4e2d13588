use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "assetforge")]
#[command(author, version, about = "Normalize media assets into canonical upload-ready forms")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a media file or URL into its canonical form
    Convert {
        /// Local path or http(s) URL
        #[arg(required = true)]
        input: String,

        /// Treat the input as a video instead of an image
        #[arg(long)]
        video: bool,

        /// Video quality preset: low, medium, high
        #[arg(long)]
        quality: Option<String>,

        /// Long-edge bound for image downsampling
        #[arg(long)]
        max_dimension: Option<u32>,

        /// Directory to write output artifacts into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Inspect a media file
    Probe {
        /// File to probe
        #[arg(required = true)]
        path: PathBuf,
    },

    /// Report external tool availability
    Tools,
}
