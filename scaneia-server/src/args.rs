use std::path::PathBuf;

use clap::Parser;

/// scaneia-server — API backend for the ScaneIA web app
#[derive(Parser, Debug)]
#[command(
    name = "scaneia-server",
    version,
    about = "Simulated website vulnerability scans with AI-generated reports"
)]
pub struct Args {
    /// Address to listen on
    #[arg(long = "listen", default_value = "127.0.0.1:8080", value_name = "ADDR")]
    pub listen: String,

    /// SQLite database path (default: per-user data directory)
    #[arg(long = "db", value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// OpenAI API key used for report generation
    #[arg(
        long = "openai-api-key",
        env = "OPENAI_API_KEY",
        hide_env_values = true,
        value_name = "KEY"
    )]
    pub openai_api_key: String,

    /// Base URL of the completion endpoint
    #[arg(
        long = "openai-base-url",
        env = "OPENAI_BASE_URL",
        default_value = "https://api.openai.com/v1",
        value_name = "URL"
    )]
    pub openai_base_url: String,

    /// Model requested for completions
    #[arg(long = "model", default_value = "gpt-4", value_name = "MODEL")]
    pub model: String,

    /// Session lifetime in hours
    #[arg(long = "session-ttl", default_value = "168", value_name = "HOURS")]
    pub session_ttl_hours: u64,

    /// Increase verbosity level (use -v or -vv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}
