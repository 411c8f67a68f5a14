use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::documents::flags::FlagLayout;
use crate::errors::AppError;
use crate::models::Track;

pub const CV_CONFIG_FILE: &str = "cv_config.yaml";
pub const PROMPTS_FILE: &str = "prompts.yaml";

/// Placeholder in the analysis prompt template replaced with the posting text.
pub const JOB_TEXT_SLOT: &str = "{job_text}";

const DEFAULT_FALLBACK_TITLE: &str = "Software Engineer";

/// Process configuration loaded from environment variables.
/// The API key is only demanded when an online analyzer is built.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub config_dir: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_base_url: optional_env("OPENAI_BASE_URL"),
            config_dir: optional_env("TAILOR_CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("config")),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn require_api_key(&self) -> Result<String, AppError> {
        self.openai_api_key.clone().ok_or_else(|| {
            AppError::Authentication(
                "Required environment variable 'OPENAI_API_KEY' is not set".to_string(),
            )
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// YAML configuration
// ────────────────────────────────────────────────────────────────────────────

/// A CV track and the vocabulary used to pick it without the LLM.
///
/// Tracks are declared as a YAML sequence; declaration order breaks score ties.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackProfile {
    pub name: Track,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Fallback summary with a `{keywords}` slot. Built-in text is used when absent.
    #[serde(default)]
    pub summary_template: Option<String>,
}

/// Template documents and the patterns that locate their mutable regions.
/// Paths are relative to the template directory.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateTargets {
    pub header_file: PathBuf,
    /// Capture pattern around the title. One group (the title) or three (open, title, close).
    pub header_title_pattern: String,
    /// Companion document carrying a title variable, e.g. `\newcommand{\jobtitle}{...}`.
    #[serde(default)]
    pub title_variable_file: Option<PathBuf>,
    #[serde(default)]
    pub title_variable_pattern: Option<String>,
    pub sidebar_file: PathBuf,
    pub ats_boost_pattern: String,
    #[serde(default = "default_keyword_placeholder")]
    pub keyword_placeholder: String,
    pub main_file: PathBuf,
    #[serde(default)]
    pub flags: FlagLayout,
}

fn default_keyword_placeholder() -> String {
    "%%KEYWORDS%%".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtsConfig {
    /// Keywords kept by the keyword-only fallback analysis.
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
    /// Keywords inlined into the template placeholder (never above 15).
    #[serde(default = "default_keyword_cap")]
    pub keyword_cap: usize,
}

fn default_max_keywords() -> usize {
    20
}
fn default_keyword_cap() -> usize {
    15
}

impl Default for AtsConfig {
    fn default() -> Self {
        Self {
            max_keywords: default_max_keywords(),
            keyword_cap: default_keyword_cap(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompilerConfig {
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_main_tex")]
    pub main_file: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_passes")]
    pub passes: u32,
    #[serde(default = "default_pass_timeout_secs")]
    pub pass_timeout_secs: u64,
    #[serde(default = "default_lock_attempts")]
    pub lock_retry_attempts: u32,
    #[serde(default = "default_lock_delay_ms")]
    pub lock_retry_delay_ms: u64,
}

fn default_engine() -> String {
    "pdflatex".to_string()
}
fn default_main_tex() -> String {
    "main.tex".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_passes() -> u32 {
    2
}
fn default_pass_timeout_secs() -> u64 {
    60
}
fn default_lock_attempts() -> u32 {
    5
}
fn default_lock_delay_ms() -> u64 {
    1000
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            main_file: default_main_tex(),
            output_dir: default_output_dir(),
            passes: default_passes(),
            pass_timeout_secs: default_pass_timeout_secs(),
            lock_retry_attempts: default_lock_attempts(),
            lock_retry_delay_ms: default_lock_delay_ms(),
        }
    }
}

/// Mirrors `config/cv_config.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CvConfig {
    #[serde(default)]
    pub tracks: Vec<TrackProfile>,
    pub file_targets: TemplateTargets,
    #[serde(default)]
    pub ats: AtsConfig,
    #[serde(default)]
    pub compiler: CompilerConfig,
}

/// Mirrors `config/prompts.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptConfig {
    pub job_analysis_prompt: String,
    #[serde(default)]
    pub fallback_titles: HashMap<String, String>,
}

impl PromptConfig {
    pub fn fallback_title(&self) -> &str {
        self.fallback_titles
            .get("default")
            .map(String::as_str)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_FALLBACK_TITLE)
    }
}

/// Everything read from the configuration directory. Immutable for a run.
#[derive(Debug, Clone)]
pub struct TailorConfig {
    pub cv: CvConfig,
    pub prompts: PromptConfig,
}

impl TailorConfig {
    pub fn load(dir: &Path) -> Result<Self, AppError> {
        let cv: CvConfig = load_yaml(&dir.join(CV_CONFIG_FILE))
            .map_err(|e| AppError::Configuration(format!("{e:#}")))?;
        let prompts: PromptConfig = load_yaml(&dir.join(PROMPTS_FILE))
            .map_err(|e| AppError::Configuration(format!("{e:#}")))?;

        let config = TailorConfig { cv, prompts };
        config.validate()?;
        Ok(config)
    }

    #[cfg(test)]
    pub fn from_yaml(cv_yaml: &str, prompts_yaml: &str) -> Result<Self, AppError> {
        let cv = serde_yaml::from_str(cv_yaml)
            .map_err(|e| AppError::Configuration(format!("invalid {CV_CONFIG_FILE}: {e}")))?;
        let prompts = serde_yaml::from_str(prompts_yaml)
            .map_err(|e| AppError::Configuration(format!("invalid {PROMPTS_FILE}: {e}")))?;

        let config = TailorConfig { cv, prompts };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if !self.prompts.job_analysis_prompt.contains(JOB_TEXT_SLOT) {
            return Err(AppError::Configuration(format!(
                "job_analysis_prompt must contain the {JOB_TEXT_SLOT} placeholder"
            )));
        }

        let mut seen = Vec::with_capacity(self.cv.tracks.len());
        for profile in &self.cv.tracks {
            if seen.contains(&profile.name) {
                return Err(AppError::Configuration(format!(
                    "track '{}' is declared more than once",
                    profile.name
                )));
            }
            seen.push(profile.name);
        }
        Ok(())
    }

    pub fn track(&self, track: Track) -> Option<&TrackProfile> {
        self.cv.tracks.iter().find(|p| p.name == track)
    }

    pub fn describe(&self, track: Track) -> &str {
        self.track(track)
            .map(|p| p.description.as_str())
            .unwrap_or("Unknown version")
    }
}

fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Configuration file not found: {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("Error parsing YAML file {}", path.display()))
}
