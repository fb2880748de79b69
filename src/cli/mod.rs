use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// Base URL for the generative language API.
    #[arg(
        long,
        env = "CHAT_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com/v1beta"
    )]
    pub chat_base_url: String,

    /// API key for the generative language API.
    #[arg(long, env = "CHAT_API_KEY")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gemini-2.0-flash)
    #[arg(long, env = "CHAT_MODEL", default_value = "gemini-2.0-flash")]
    pub chat_model: String,

    /// Timeout in seconds for each request to the remote endpoint.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,

    // --- General App Args ---
    /// Path to an optional prompt template override file (JSON).
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Delay in milliseconds before the typing indicator is shown.
    #[arg(long, env = "TYPING_DELAY_MS", default_value = "300")]
    pub typing_delay_ms: u64,

    /// Delay in milliseconds before a staged history entry is committed.
    #[arg(long, env = "HISTORY_COMMIT_DELAY_MS", default_value = "800")]
    pub history_commit_delay_ms: u64,
}
