// Cross-cutting prompt fragments. Analysis prompts live in analysis/prompts.rs
// and in config/prompts.yaml.

/// Prompt used by `tailor ping`; a healthy endpoint echoes the phrase back.
pub const CONNECTION_TEST_PROMPT: &str = "Say 'API connection successful'";
