//! Job posting analysis: LLM first, keyword scoring as the safety net.
//!
//! Flow: detect locale → render prompt → LLM → parse reply → backfill gaps.
//! Any failure on the LLM path discards its partial state and rebuilds the
//! recommendation from local, deterministic logic. `analyze` never errors.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::analysis::company::extract_company;
use crate::analysis::fallback::{default_summary_template, extract_basic_keywords, render_summary};
use crate::analysis::language::detect_locale;
use crate::analysis::prompts::{render_analysis_prompt, ANALYSIS_SYSTEM};
use crate::analysis::response_parser::{parse_response, RecommendationDraft};
use crate::analysis::version_selector::select_fallback_track;
use crate::config::TailorConfig;
use crate::llm_client::{CompletionProvider, LlmError, REQUEST_TIMEOUT};
use crate::models::recommendation::{DEFAULT_CONFIDENCE, UNKNOWN_COMPANY};
use crate::models::{Locale, Recommendation, Track};

/// Why the keyword-only path produced the recommendation.
#[derive(Debug)]
pub enum FallbackReason {
    /// No LLM backend was configured for this run (offline mode).
    Disabled,
    /// The LLM did not answer within the request bound.
    TimedOut(Duration),
    /// Transport, API, or empty-content failure reported by the backend.
    Collaborator(LlmError),
    /// The reply contained none of the expected labels.
    MalformedReply,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Disabled => f.write_str("LLM analysis disabled"),
            FallbackReason::TimedOut(limit) => {
                write!(f, "LLM request exceeded {}s", limit.as_secs())
            }
            FallbackReason::Collaborator(e) => write!(f, "LLM call failed: {e}"),
            FallbackReason::MalformedReply => f.write_str("LLM reply had no recognizable labels"),
        }
    }
}

/// Result of an analysis, tagged with the path that produced it.
#[derive(Debug)]
pub enum AnalysisOutcome {
    Primary(Recommendation),
    Fallback {
        recommendation: Recommendation,
        reason: FallbackReason,
    },
}

impl AnalysisOutcome {
    pub fn recommendation(&self) -> &Recommendation {
        match self {
            AnalysisOutcome::Primary(rec) => rec,
            AnalysisOutcome::Fallback { recommendation, .. } => recommendation,
        }
    }

    pub fn into_recommendation(self) -> Recommendation {
        match self {
            AnalysisOutcome::Primary(rec) => rec,
            AnalysisOutcome::Fallback { recommendation, .. } => recommendation,
        }
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            AnalysisOutcome::Primary(_) => None,
            AnalysisOutcome::Fallback { reason, .. } => Some(reason),
        }
    }
}

pub struct JobAnalyzer {
    provider: Option<Arc<dyn CompletionProvider>>,
    config: Arc<TailorConfig>,
    request_timeout: Duration,
}

impl JobAnalyzer {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: Arc<TailorConfig>) -> Self {
        Self {
            provider: Some(provider),
            config,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    /// Analyzer that always takes the keyword-only path.
    pub fn offline(config: Arc<TailorConfig>) -> Self {
        Self {
            provider: None,
            config,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn is_online(&self) -> bool {
        self.provider.is_some()
    }

    #[cfg(test)]
    pub async fn analyze(&self, job_text: &str) -> Recommendation {
        self.analyze_with_outcome(job_text).await.into_recommendation()
    }

    pub async fn analyze_with_outcome(&self, job_text: &str) -> AnalysisOutcome {
        let locale = detect_locale(job_text);
        info!(
            locale = %locale,
            chars = job_text.len(),
            "Starting job posting analysis"
        );

        match self.analyze_with_llm(job_text, locale).await {
            Ok(rec) => {
                info!(
                    path = "primary",
                    company = %rec.company,
                    role = %rec.role,
                    track = %rec.track,
                    confidence = rec.confidence,
                    "Analysis complete"
                );
                AnalysisOutcome::Primary(rec)
            }
            Err(reason) => {
                warn!(path = "fallback", %reason, "Falling back to keyword-based analysis");
                let rec = self.fallback_analysis(job_text, locale);
                info!(
                    path = "fallback",
                    company = %rec.company,
                    role = %rec.role,
                    track = %rec.track,
                    keywords = rec.keywords.len(),
                    "Analysis complete"
                );
                AnalysisOutcome::Fallback {
                    recommendation: rec,
                    reason,
                }
            }
        }
    }

    async fn analyze_with_llm(
        &self,
        job_text: &str,
        locale: Locale,
    ) -> Result<Recommendation, FallbackReason> {
        let provider = self.provider.as_ref().ok_or(FallbackReason::Disabled)?;

        let prompt = render_analysis_prompt(&self.config.prompts.job_analysis_prompt, job_text);
        debug!(prompt_chars = prompt.len(), "Calling LLM");

        let reply = tokio::time::timeout(
            self.request_timeout,
            provider.complete(&prompt, ANALYSIS_SYSTEM),
        )
        .await
        .map_err(|_| FallbackReason::TimedOut(self.request_timeout))?
        .map_err(|e| match e {
            LlmError::Timeout(limit) => FallbackReason::TimedOut(limit),
            other => FallbackReason::Collaborator(other),
        })?;

        let draft = parse_response(&reply);
        if draft.is_blank() {
            debug!(reply = %truncate(&reply, 200), "Unparseable LLM reply");
            return Err(FallbackReason::MalformedReply);
        }
        debug!(
            company = %draft.company,
            role = %draft.role,
            version = %draft.version,
            confidence = draft.confidence,
            "Parsed LLM reply"
        );

        Ok(self.backfill(draft, job_text, locale))
    }

    /// Fills every field the LLM left empty or invalid.
    fn backfill(&self, draft: RecommendationDraft, job_text: &str, locale: Locale) -> Recommendation {
        let company = if draft.company.is_empty() {
            warn!("No company extracted, trying email/URL extraction");
            self.company_from_text(job_text)
        } else {
            draft.company
        };

        let role = if draft.role.is_empty() {
            warn!("No role extracted, using fallback title");
            self.config.prompts.fallback_title().to_string()
        } else {
            draft.role
        };

        let track = match draft.version.parse::<Track>() {
            Ok(track) => track,
            Err(_) => {
                warn!(version = %draft.version, "Invalid track, using keyword selection");
                select_fallback_track(job_text, &self.config.cv.tracks)
            }
        };

        let keywords = draft
            .keywords
            .into_iter()
            .filter(|k| !k.is_empty())
            .collect();

        Recommendation {
            role,
            company,
            track,
            confidence: normalize_confidence(draft.confidence),
            keywords,
            ats_text: draft.ats_text,
            locale,
        }
    }

    /// Builds a complete recommendation without the LLM.
    pub fn fallback_analysis(&self, job_text: &str, locale: Locale) -> Recommendation {
        let track = select_fallback_track(job_text, &self.config.cv.tracks);
        let keywords = extract_basic_keywords(job_text, self.config.cv.ats.max_keywords);
        debug!(count = keywords.len(), "Extracted fallback keywords");

        let template = self
            .config
            .track(track)
            .and_then(|p| p.summary_template.as_deref())
            .unwrap_or_else(|| default_summary_template(track));
        let ats_text = render_summary(template, &keywords);

        Recommendation {
            role: self.config.prompts.fallback_title().to_string(),
            company: self.company_from_text(job_text),
            track,
            confidence: DEFAULT_CONFIDENCE,
            keywords,
            ats_text,
            locale,
        }
    }

    fn company_from_text(&self, job_text: &str) -> String {
        let company = extract_company(job_text);
        if company.is_empty() {
            warn!("No company found, using '{UNKNOWN_COMPANY}'");
            UNKNOWN_COMPANY.to_string()
        } else {
            company
        }
    }
}

/// Zero, negative, or non-finite scores become the default; anything above 1 is capped.
fn normalize_confidence(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        DEFAULT_CONFIDENCE
    } else {
        value.min(1.0)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::config::tests::sample_config;

    /// Backend returning a canned reply (or error) and recording the prompts it saw.
    struct ScriptedProvider {
        reply: Mutex<Option<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(Ok(text.to_string()))),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: LlmError) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(Err(err))),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }

    /// Backend that never answers.
    struct HangingProvider;

    #[async_trait]
    impl CompletionProvider for HangingProvider {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    const AWS_POSTING: &str = "\
Senior Software Engineer - AWS Infrastructure

We are seeking a Senior Software Engineer to join our cloud infrastructure team.
You will work on large-scale systems built from microservices.
Requirements: strong AWS and Kubernetes experience.";

    fn online(provider: Arc<dyn CompletionProvider>) -> JobAnalyzer {
        JobAnalyzer::new(provider, Arc::new(sample_config()))
    }

    fn assert_schema_complete(rec: &Recommendation) {
        assert!(Track::ALL.contains(&rec.track));
        assert!(rec.confidence > 0.0 && rec.confidence <= 1.0);
        assert!(!rec.role.is_empty());
        assert!(!rec.company.is_empty());
    }

    #[tokio::test]
    async fn test_primary_path_uses_llm_reply() {
        let provider = ScriptedProvider::replying(
            "COMPANY: Acme\nROLE: Platform Engineer\nVERSION: Startup\nCONFIDENCE: 0.9\n\
             KEYWORDS: Go, Terraform\nATS_TEXT: Platform engineer.\nShips fast.",
        );
        let analyzer = online(provider.clone());
        let outcome = analyzer.analyze_with_outcome(AWS_POSTING).await;

        assert!(outcome.fallback_reason().is_none());
        let rec = outcome.recommendation();
        assert_eq!(rec.company, "Acme");
        assert_eq!(rec.role, "Platform Engineer");
        assert_eq!(rec.track, Track::Startup);
        assert!((rec.confidence - 0.9).abs() < f64::EPSILON);
        assert_eq!(rec.keywords, vec!["Go", "Terraform"]);
        assert_eq!(rec.ats_text, "Platform engineer. Ships fast.");
        assert_eq!(rec.locale, Locale::English);

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Senior Software Engineer - AWS Infrastructure"));
    }

    #[tokio::test]
    async fn test_primary_path_backfills_missing_fields() {
        let posting = format!("{AWS_POSTING}\nApply: talent@initech.com");
        let provider = ScriptedProvider::replying("VERSION: Quantum\nCONFIDENCE: 0\nATS_TEXT: x");
        let rec = online(provider).analyze(&posting).await;

        assert_eq!(rec.company, "Initech");
        assert_eq!(rec.role, "Software Engineer");
        assert_eq!(rec.track, Track::Faang);
        assert!((rec.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_missing_company_everywhere_uses_sentinel() {
        let provider = ScriptedProvider::replying("ROLE: Engineer\nVERSION: FAANG");
        let rec = online(provider).analyze("no contact details here").await;
        assert_eq!(rec.company, UNKNOWN_COMPANY);
    }

    #[tokio::test]
    async fn test_blank_keywords_from_reply_are_dropped() {
        let provider = ScriptedProvider::replying("ROLE: Engineer\nKEYWORDS: rust,,go");
        let rec = online(provider).analyze(AWS_POSTING).await;
        assert_eq!(rec.keywords, vec!["rust", "go"]);
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_is_capped() {
        let provider = ScriptedProvider::replying("ROLE: Engineer\nCONFIDENCE: 85");
        let rec = online(provider).analyze(AWS_POSTING).await;
        assert!((rec.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_collaborator_timeout_falls_back() {
        let provider = ScriptedProvider::failing(LlmError::Timeout(REQUEST_TIMEOUT));
        let outcome = online(provider).analyze_with_outcome(AWS_POSTING).await;

        assert!(matches!(
            outcome.fallback_reason(),
            Some(FallbackReason::TimedOut(_))
        ));
        let rec = outcome.recommendation();
        assert_schema_complete(rec);
        assert!((rec.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_collaborator_is_bounded_by_timeout() {
        let analyzer = online(Arc::new(HangingProvider)).with_request_timeout(Duration::from_secs(30));
        let outcome = analyzer.analyze_with_outcome(AWS_POSTING).await;

        assert!(matches!(
            outcome.fallback_reason(),
            Some(FallbackReason::TimedOut(_))
        ));
        assert!((outcome.recommendation().confidence - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_api_error_falls_back() {
        let provider = ScriptedProvider::failing(LlmError::Api {
            status: 401,
            message: "bad key".to_string(),
        });
        let outcome = online(provider).analyze_with_outcome(AWS_POSTING).await;
        assert!(matches!(
            outcome.fallback_reason(),
            Some(FallbackReason::Collaborator(_))
        ));
        assert_schema_complete(outcome.recommendation());
    }

    #[tokio::test]
    async fn test_unlabeled_reply_falls_back() {
        let provider = ScriptedProvider::replying("I'm sorry, I can't do that.");
        let outcome = online(provider).analyze_with_outcome(AWS_POSTING).await;
        assert!(matches!(
            outcome.fallback_reason(),
            Some(FallbackReason::MalformedReply)
        ));
    }

    #[tokio::test]
    async fn test_offline_aws_posting_scenario() {
        let analyzer = JobAnalyzer::offline(Arc::new(sample_config()));
        assert!(!analyzer.is_online());

        let outcome = analyzer.analyze_with_outcome(AWS_POSTING).await;
        assert!(matches!(
            outcome.fallback_reason(),
            Some(FallbackReason::Disabled)
        ));

        let rec = outcome.into_recommendation();
        assert_eq!(rec.track, Track::Faang);
        assert_eq!(rec.role, "Software Engineer");
        assert_eq!(rec.company, UNKNOWN_COMPANY);
        assert!(rec.keywords.contains(&"aws".to_string()));
        assert!(rec.keywords.contains(&"kubernetes".to_string()));
        assert!(!rec.keywords.contains(&"docker".to_string()));
        assert!(rec.ats_text.starts_with("Experienced software engineer"));
        assert!(rec.ats_text.contains("aws, kubernetes"));
        assert_schema_complete(&rec);
    }

    #[tokio::test]
    async fn test_fallback_keeps_detected_locale() {
        let posting = "Buscamos un ingeniero con experiencia en proyectos de datos para nuestro equipo";
        let rec = JobAnalyzer::offline(Arc::new(sample_config()))
            .analyze(posting)
            .await;
        assert_eq!(rec.locale, Locale::Spanish);
    }

    #[tokio::test]
    async fn test_configured_summary_template_is_used() {
        let mut config = sample_config();
        config.cv.tracks[0].summary_template = Some("Custom: {keywords}".to_string());
        let rec = JobAnalyzer::offline(Arc::new(config)).analyze(AWS_POSTING).await;
        assert_eq!(rec.ats_text, format!("Custom: {}", rec.keywords.join(", ")));
    }

    #[tokio::test]
    async fn test_every_input_yields_schema_complete_result() {
        let analyzer = JobAnalyzer::offline(Arc::new(sample_config()));
        for text in ["", "   ", "🦀🦀🦀", "unity multiplayer", AWS_POSTING] {
            let rec = analyzer.analyze(text).await;
            assert_schema_complete(&rec);
        }
    }

    #[test]
    fn test_normalize_confidence() {
        assert!((normalize_confidence(0.0) - 0.5).abs() < f64::EPSILON);
        assert!((normalize_confidence(-0.3) - 0.5).abs() < f64::EPSILON);
        assert!((normalize_confidence(f64::NAN) - 0.5).abs() < f64::EPSILON);
        assert!((normalize_confidence(0.72) - 0.72).abs() < f64::EPSILON);
        assert!((normalize_confidence(3.0) - 1.0).abs() < f64::EPSILON);
    }
}
