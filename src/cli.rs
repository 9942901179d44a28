//! Command-line argument parsing and post-parse validation.

use clap::Parser;

/// Generate text for a catalog of work items using an OpenAI-compatible
/// text-generation service.
#[derive(Parser, Debug, Clone)]
#[command(name = "batchgen")]
#[command(about = "Bounded-concurrency batch text-generation orchestrator")]
pub struct Args {
    /// CSV-like text file path containing the work item catalog
    #[arg(long)]
    pub input_file: String,

    /// Text-generation prompt id
    #[arg(long, env = "BATCHGEN_PROMPT_ID")]
    pub prompt_id: Option<String>,

    /// Prompt version (optional)
    #[arg(long)]
    pub version: Option<String>,

    /// JSONL output file path
    #[arg(long, default_value = "out.jsonl")]
    pub output: String,

    /// Maximum number of concurrent in-flight requests
    #[arg(long, alias = "max-workers", default_value_t = 4)]
    pub workers: usize,

    /// Parse inputs and show the first 5 payloads without making API calls
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging (DEBUG level)
    #[arg(long)]
    pub verbose: bool,

    /// Emit log events as JSON lines instead of human-readable text
    #[arg(long)]
    pub log_json: bool,

    /// Enable database updates (requires --database-url or DATABASE_URL)
    #[arg(long)]
    pub enable_db: bool,

    /// Use the test table/schema instead of the production one
    #[arg(long)]
    pub test_mode: bool,

    /// Resume processing by skipping work items already present in the
    /// output file
    #[arg(long)]
    pub resume: bool,

    /// Skip writing database updates for items that already have a value,
    /// as opposed to overwriting them
    #[arg(long)]
    pub skip_existing: bool,

    /// Daily request quota (default: unlimited)
    #[arg(long, env = "BATCHGEN_DAILY_LIMIT")]
    pub daily_limit: Option<u64>,

    /// Fraction of quota usage (0.0-1.0) at which processing pauses
    #[arg(long, default_value_t = 0.9)]
    pub quota_threshold: f64,

    /// Disable provider quota monitoring entirely
    #[arg(long)]
    pub no_quota_monitoring: bool,

    /// Path to persist quota monitor state across restarts
    #[arg(long, default_value = "quota_state.json")]
    pub quota_state_file: String,

    /// OpenAI-compatible API key (default: OPENAI_API_KEY env var)
    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,

    /// Base URL of the text-generation service
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// Database connection URL (default: DATABASE_URL env var)
    #[arg(long, alias = "db-url", env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum retry attempts for a failed remote call
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,
}

/// Errors that prevent a run from starting at all.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0}")]
    Message(String),
}

impl Args {
    /// Checks configuration that cannot be expressed as `clap` constraints
    /// alone: cross-field requirements that only matter once we know
    /// whether this is a dry run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dry_run {
            return Ok(());
        }

        if self.prompt_id.is_none() {
            return Err(ConfigError::Message(
                "prompt id is required: set --prompt-id or BATCHGEN_PROMPT_ID".to_string(),
            ));
        }

        if self.openai_api_key.is_none() {
            return Err(ConfigError::Message(
                "API key is required: set --openai-api-key or OPENAI_API_KEY".to_string(),
            ));
        }

        if self.enable_db && self.database_url.is_none() {
            return Err(ConfigError::Message(
                "database URL is required when --enable-db is set: set --database-url or DATABASE_URL".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.quota_threshold) {
            return Err(ConfigError::Message(format!(
                "quota threshold must be between 0.0 and 1.0, got {}",
                self.quota_threshold
            )));
        }

        Ok(())
    }
}
