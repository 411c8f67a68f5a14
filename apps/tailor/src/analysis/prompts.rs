// System instruction for job posting analysis. The user prompt template is
// configured in config/prompts.yaml (`job_analysis_prompt`).

use crate::config::JOB_TEXT_SLOT;

pub const ANALYSIS_SYSTEM: &str = "You are an expert ATS (Applicant Tracking System) analyzer \
    and CV optimization specialist. Analyze job postings and extract key information for CV \
    tailoring. Answer only with the labeled lines COMPANY, ROLE, VERSION, CONFIDENCE, KEYWORDS \
    and ATS_TEXT.";

/// Substitutes the posting into the configured template.
pub fn render_analysis_prompt(template: &str, job_text: &str) -> String {
    template.replace(JOB_TEXT_SLOT, job_text)
}
