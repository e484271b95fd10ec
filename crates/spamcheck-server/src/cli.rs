use clap::{Parser, Subcommand};
use spamcheck_classifiers::Norm;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "spamcheck-server")]
#[command(author, version, about = "SMS spam classification service")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.yaml", env = "SPAMCHECK_CONFIG")]
    pub config: PathBuf,

    /// Artifact directory (overrides model.dir)
    #[arg(short, long, global = true)]
    pub model_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Listen address
        #[arg(short, long)]
        listen: Option<String>,

        /// Listen port
        #[arg(short = 'P', long)]
        port: Option<u16>,

        /// JSON-lines file for classification history
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Fit a vocabulary artifact from a training corpus
    Fit {
        /// Corpus file: JSON array of strings, or one message per line
        #[arg(long)]
        corpus: PathBuf,

        /// Output path (defaults to the configured vocabulary artifact)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Drop terms seen in fewer documents than this
        #[arg(long, default_value = "1")]
        min_df: usize,

        /// Use 1 + ln(tf) instead of raw counts
        #[arg(long)]
        sublinear_tf: bool,

        /// Disable idf smoothing
        #[arg(long)]
        no_smooth_idf: bool,

        /// Vector normalization: l2, l1 or none
        #[arg(long, default_value = "l2", value_parser = parse_norm)]
        norm: Norm,
    },

    /// Classify one message and print the result as JSON
    Classify {
        /// Message text
        text: String,
    },
}

fn parse_norm(s: &str) -> Result<Norm, String> {
    match s.to_ascii_lowercase().as_str() {
        "l2" => Ok(Norm::L2),
        "l1" => Ok(Norm::L1),
        "none" => Ok(Norm::None),
        other => Err(format!("unknown norm '{}', expected l2, l1 or none", other)),
    }
}
