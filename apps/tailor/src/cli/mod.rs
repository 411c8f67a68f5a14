//! Command-line parsing for the CV tailoring pipeline.
//!
//! Parsing lives here, dispatch in [`commands`]. The analysis and document
//! code never reads arguments directly.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod commands;
pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "tailor", version, about = "Tailors a LaTeX CV to a job posting")]
pub struct Cli {
    /// Directory holding cv_config.yaml and prompts.yaml (overrides TAILOR_CONFIG_DIR).
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Directory holding the LaTeX template (main.tex, sections/).
    #[arg(long, global = true, default_value = ".")]
    pub template_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a posting, update the template, and compile the PDF.
    Generate(GenerateArgs),
    /// Analyze a posting and print the recommendation as JSON.
    Analyze(AnalyzeArgs),
    /// Check that the LLM API answers.
    Ping,
    /// Show the model and configured tracks.
    Info,
    /// Create working directories and a sample posting.
    Setup,
    /// Analyze every sample posting in a directory.
    SampleRun(SampleRunArgs),
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Path to the job posting text file.
    #[arg(short, long)]
    pub job: PathBuf,

    /// Output file name without `.pdf` (defaults to the sanitized role).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Accept the recommended track without prompting.
    #[arg(short, long)]
    pub auto: bool,

    /// Skip the LLM and use keyword analysis only.
    #[arg(long)]
    pub offline: bool,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Path to the job posting text file.
    #[arg(short, long)]
    pub job: PathBuf,

    /// Skip the LLM and use keyword analysis only.
    #[arg(long)]
    pub offline: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SampleRunArgs {
    /// Directory of `*.txt` postings.
    #[arg(long, default_value = commands::SAMPLE_JOBS_DIR)]
    pub dir: PathBuf,

    /// Skip the LLM and use keyword analysis only.
    #[arg(long)]
    pub offline: bool,
}
