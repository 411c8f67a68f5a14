// Job posting analysis: LLM-backed recommendation with a deterministic fallback.
// All LLM calls go through llm_client; nothing here talks HTTP directly.

pub mod analyzer;
pub mod company;
pub mod fallback;
pub mod language;
pub mod prompts;
pub mod response_parser;
pub mod version_selector;

pub use analyzer::{AnalysisOutcome, JobAnalyzer};
