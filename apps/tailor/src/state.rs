use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::analysis::JobAnalyzer;
use crate::compile::LatexCompiler;
use crate::config::{Config, TailorConfig};
use crate::documents::DocumentMutator;
use crate::errors::AppError;
use crate::llm_client::{self, LlmClient};

/// Everything a command needs, built once per invocation.
#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub config: Arc<TailorConfig>,
    pub template_dir: PathBuf,
}

impl AppState {
    /// Loads YAML configuration from `config_dir` (or the environment default).
    pub fn load(env: Config, config_dir: Option<&Path>, template_dir: &Path) -> Result<Self, AppError> {
        let dir = config_dir.unwrap_or(env.config_dir.as_path()).to_path_buf();
        info!("Loading configuration from {}", dir.display());
        let config = TailorConfig::load(&dir)?;
        info!(tracks = config.cv.tracks.len(), "Configuration loaded");

        Ok(Self {
            env,
            config: Arc::new(config),
            template_dir: template_dir.to_path_buf(),
        })
    }

    pub fn llm_client(&self) -> Result<LlmClient, AppError> {
        let api_key = self.env.require_api_key()?;
        let endpoint = self
            .env
            .openai_base_url
            .as_deref()
            .map(|base| format!("{}/chat/completions", base.trim_end_matches('/')));
        let client = LlmClient::new(api_key, endpoint)?;
        info!("LLM client initialized (model: {})", llm_client::MODEL);
        Ok(client)
    }

    /// Online analyzer unless `offline`; a missing API key is fatal only online.
    pub fn analyzer(&self, offline: bool) -> Result<JobAnalyzer, AppError> {
        if offline {
            info!("Offline mode: keyword analysis only");
            return Ok(JobAnalyzer::offline(Arc::clone(&self.config)));
        }
        let client = self.llm_client()?;
        Ok(JobAnalyzer::new(Arc::new(client), Arc::clone(&self.config)))
    }

    pub fn mutator(&self) -> Result<DocumentMutator, AppError> {
        Ok(DocumentMutator::new(
            &self.config.cv.file_targets,
            &self.template_dir,
            self.config.cv.ats.keyword_cap,
        )?)
    }

    pub fn compiler(&self) -> LatexCompiler {
        LatexCompiler::new(&self.config.cv.compiler, &self.template_dir)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::tests::{CV_YAML, PROMPTS_YAML};
    use crate::config::{CV_CONFIG_FILE, PROMPTS_FILE};

    fn env(api_key: Option<&str>) -> Config {
        Config {
            openai_api_key: api_key.map(str::to_string),
            openai_base_url: None,
            config_dir: PathBuf::from("does-not-exist"),
            rust_log: "info".to_string(),
        }
    }

    fn state(api_key: Option<&str>) -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CV_CONFIG_FILE), CV_YAML).unwrap();
        std::fs::write(dir.path().join(PROMPTS_FILE), PROMPTS_YAML).unwrap();
        let state = AppState::load(env(api_key), Some(dir.path()), dir.path()).unwrap();
        (dir, state)
    }

    #[test]
    fn test_explicit_config_dir_overrides_env() {
        let (_dir, state) = state(None);
        assert_eq!(state.config.cv.tracks.len(), 4);
    }

    #[test]
    fn test_offline_analyzer_needs_no_key() {
        let (_dir, state) = state(None);
        let analyzer = state.analyzer(true).unwrap();
        assert!(!analyzer.is_online());
    }

    #[test]
    fn test_online_analyzer_without_key_is_authentication_error() {
        let (_dir, state) = state(None);
        assert!(matches!(
            state.analyzer(false),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn test_online_analyzer_with_key() {
        let (_dir, state) = state(Some("sk-test"));
        assert!(state.analyzer(false).unwrap().is_online());
    }

    #[test]
    fn test_missing_config_dir_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let result = AppState::load(env(None), None, dir.path());
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
