//! Command dispatch. Each command builds what it needs from [`AppState`]
//! and reports to stdout; diagnostics go through `tracing`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::{AnalysisOutcome, JobAnalyzer};
use crate::cli::picker::prompt_for_track;
use crate::cli::{AnalyzeArgs, Cli, Command, GenerateArgs, SampleRunArgs};
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client;
use crate::models::Recommendation;
use crate::posting::{format_confidence, read_posting, sanitize_filename};
use crate::state::AppState;

pub const SAMPLE_JOBS_DIR: &str = "tests/sample_jobs";
const SETUP_DIRECTORIES: [&str; 3] = ["output", SAMPLE_JOBS_DIR, "config"];
const SAMPLE_JOB_FILE: &str = "sample_job.txt";
const FALLBACK_OUTPUT_NAME: &str = "cv";
const INFO_KEYWORD_PREVIEW: usize = 5;

const SAMPLE_JOB: &str = "\
Senior Software Engineer - AWS Infrastructure

We are seeking an experienced Senior Software Engineer to join our cloud infrastructure team.
You will work on large-scale distributed systems and microservices architecture.

Requirements:
- 5+ years of experience with Python and backend development
- Strong expertise in AWS (EC2, S3, Lambda, CloudFormation)
- Experience with Docker and Kubernetes
- Knowledge of microservices architecture and distributed systems
- Experience with CI/CD pipelines

This is a great opportunity to work on high-scale systems at a leading tech company.
";

pub async fn run(cli: Cli, env: Config) -> Result<(), AppError> {
    // setup must work before any configuration exists
    if matches!(cli.command, Command::Setup) {
        return setup(Path::new("."));
    }

    let state = AppState::load(env, cli.config_dir.as_deref(), &cli.template_dir)?;
    match cli.command {
        Command::Generate(args) => generate(&state, args).await,
        Command::Analyze(args) => analyze(&state, args).await,
        Command::Ping => ping(&state).await,
        Command::Info => {
            info_command(&state);
            Ok(())
        }
        Command::SampleRun(args) => sample_run(&state, args).await,
        Command::Setup => setup(Path::new(".")),
    }
}

async fn generate(state: &AppState, args: GenerateArgs) -> Result<(), AppError> {
    let job_text = read_posting(&args.job)?;
    println!("Reading job posting: {}", args.job.display());

    let analyzer = state.analyzer(args.offline)?;
    // Compile patterns before spending an LLM call on a broken template config.
    let mutator = state.mutator()?;

    println!("Analyzing job posting...");
    let outcome = analyzer.analyze_with_outcome(&job_text).await;
    print_analysis(&outcome);
    let mut rec = outcome.into_recommendation();

    if !args.auto {
        rec.track = prompt_for_track(&state.config.cv.tracks, rec.track)?;
    }
    println!("Using track: {} ({})", rec.track, state.config.describe(rec.track));

    println!("Updating CV files...");
    let report = mutator.generate(&rec);
    for result in &report.results {
        let status = if result.success { "ok" } else { "FAILED" };
        println!("  [{status}] {}", result.message);
    }
    if !report.all_succeeded() {
        let failed: Vec<String> = report
            .failures()
            .map(|r| r.path.display().to_string())
            .collect();
        return Err(AppError::Mutation(failed.join(", ")));
    }

    let output_name = output_name(args.output.as_deref(), &rec.role);
    println!("Compiling PDF...");
    let compiler = state.compiler();
    if !compiler.compile(&output_name).await {
        return Err(AppError::Compile);
    }
    compiler.cleanup_artifacts();

    let pdf = compiler.output_dir().join(format!("{output_name}.pdf"));
    println!();
    println!("CV generated: {}", pdf.display());
    println!("  Job title:  {}", rec.role);
    println!("  Company:    {}", rec.company);
    println!("  CV track:   {}", rec.track);
    println!("  Keywords:   {}", rec.keywords.len());
    println!("  Language:   {}", rec.locale);
    Ok(())
}

fn print_analysis(outcome: &AnalysisOutcome) {
    let rec = outcome.recommendation();
    println!("Analysis complete");
    println!("  Role:           {}", rec.role);
    println!("  Company:        {}", rec.company);
    println!("  Keywords found: {}", rec.keywords.len());
    println!(
        "  Recommendation: {} (confidence: {})",
        rec.track,
        format_confidence(rec.confidence)
    );
    if let Some(reason) = outcome.fallback_reason() {
        println!("  Note: keyword-based analysis used ({reason})");
    }
}

fn output_name(requested: Option<&str>, role: &str) -> String {
    match requested.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.trim_end_matches(".pdf").to_string(),
        None => {
            let name = sanitize_filename(role);
            if name.is_empty() {
                FALLBACK_OUTPUT_NAME.to_string()
            } else {
                name
            }
        }
    }
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    path: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_reason: Option<String>,
    recommendation: &'a Recommendation,
}

async fn analyze(state: &AppState, args: AnalyzeArgs) -> Result<(), AppError> {
    let job_text = read_posting(&args.job)?;
    let analyzer = state.analyzer(args.offline)?;
    let outcome = analyzer.analyze_with_outcome(&job_text).await;

    let report = AnalysisReport {
        path: if outcome.fallback_reason().is_some() {
            "fallback"
        } else {
            "primary"
        },
        fallback_reason: outcome.fallback_reason().map(ToString::to_string),
        recommendation: outcome.recommendation(),
    };
    let json = serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?;
    println!("{json}");
    Ok(())
}

async fn ping(state: &AppState) -> Result<(), AppError> {
    println!("Testing LLM API connection...");
    let client = state.llm_client()?;
    if client.test_connection().await {
        println!("API connection successful (model: {})", llm_client::MODEL);
        Ok(())
    } else {
        Err(anyhow::anyhow!("API connection test failed").into())
    }
}

fn info_command(state: &AppState) {
    let compiler = &state.config.cv.compiler;
    println!("tailor {}", env!("CARGO_PKG_VERSION"));
    println!("  Model:        {}", llm_client::MODEL);
    println!("  LaTeX engine: {} ({} passes)", compiler.engine, compiler.passes);
    println!("  Templates:    {}", state.template_dir.display());
    println!();
    println!("CV tracks:");
    for profile in &state.config.cv.tracks {
        let preview: Vec<&str> = profile
            .keywords
            .iter()
            .take(INFO_KEYWORD_PREVIEW)
            .map(String::as_str)
            .collect();
        let more = if profile.keywords.len() > INFO_KEYWORD_PREVIEW {
            "..."
        } else {
            ""
        };
        println!(
            "  {:<8} {}\n           keywords: {}{more}",
            profile.name.label(),
            profile.description,
            preview.join(", ")
        );
    }
}

/// Creates the working directories and a sample posting under `root`.
/// Existing files are never overwritten.
pub fn setup(root: &Path) -> Result<(), AppError> {
    for dir in SETUP_DIRECTORIES {
        std::fs::create_dir_all(root.join(dir))?;
        println!("Created directory: {dir}");
    }

    let sample = root.join(SAMPLE_JOBS_DIR).join(SAMPLE_JOB_FILE);
    if !sample.exists() {
        std::fs::write(&sample, SAMPLE_JOB)?;
        println!("Created sample job posting: {}", sample.display());
    }
    info!("Setup complete");
    Ok(())
}

/// Sorted `*.txt` files in `dir`.
pub fn sample_postings(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let entries = std::fs::read_dir(dir).map_err(|_| {
        AppError::InvalidInput(format!(
            "Sample jobs directory not found: {} (run `tailor setup` first)",
            dir.display()
        ))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "No sample job files found in {}",
            dir.display()
        )));
    }
    Ok(files)
}

async fn sample_run(state: &AppState, args: SampleRunArgs) -> Result<(), AppError> {
    let files = sample_postings(&args.dir)?;
    println!("Found {} sample job posting(s)", files.len());

    let analyzer = state.analyzer(args.offline)?;
    if analyzer.is_online() {
        println!("Analyzer: LLM with keyword fallback");
    } else {
        println!("Analyzer: keyword-based (offline)");
    }
    let mut failed = 0;
    for file in &files {
        println!();
        println!("Testing: {}", file.display());
        if let Err(e) = run_sample(&analyzer, file).await {
            warn!("{}: {e}", file.display());
            println!("  FAILED: {e}");
            failed += 1;
        }
    }

    println!();
    println!(
        "Sample run complete: {} passed, {failed} failed",
        files.len() - failed
    );
    Ok(())
}

async fn run_sample(analyzer: &JobAnalyzer, file: &Path) -> Result<(), AppError> {
    let job_text = read_posting(file)?;
    let outcome = analyzer.analyze_with_outcome(&job_text).await;
    let rec = outcome.recommendation();
    println!("  Role:     {}", rec.role);
    println!(
        "  Track:    {} ({})",
        rec.track,
        format_confidence(rec.confidence)
    );
    println!("  Keywords: {}", rec.keywords.len());
    if let Some(reason) = outcome.fallback_reason() {
        println!("  Path:     fallback ({reason})");
    }
    println!("  PASSED");
    Ok(())
}
