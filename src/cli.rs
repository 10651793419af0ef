use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use url::Url;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProgressMode {
    /// Enable progress UI when stderr is a TTY.
    Auto,
    /// Always enable progress UI (even when piped).
    Always,
    /// Never show progress UI.
    Never,
}

#[derive(Debug, Clone, Copy, Default, Subcommand)]
pub enum Command {
    /// Fetch (or load from the cache file) and populate the archive.
    #[default]
    Run,
    /// Report day directories that contain no archived files.
    Audit,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Account whose submissions are archived.
    #[arg(long, global = true, default_value = "animetoday")]
    pub account: String,

    /// Archive root. The cache file lives directly inside it.
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// OAuth application client id.
    #[arg(long, global = true, env = "REDDIT_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// OAuth application client secret.
    #[arg(long, global = true, env = "REDDIT_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// HTTP User-Agent sent with every upstream request.
    #[arg(
        long,
        global = true,
        env = "REDDIT_USER_AGENT",
        default_value = "script:animetoday"
    )]
    pub user_agent: String,

    /// Base URL of the authenticated API.
    #[arg(long, global = true, default_value = "https://oauth.reddit.com/")]
    pub api_base: Url,

    /// Token endpoint for the application-only OAuth grant.
    #[arg(
        long,
        global = true,
        default_value = "https://www.reddit.com/api/v1/access_token"
    )]
    pub auth_url: Url,

    /// Site origin prepended to relative permalinks.
    #[arg(long, global = true, default_value = "https://www.reddit.com")]
    pub site_base: String,

    /// Pause before each comment lookup, in milliseconds.
    #[arg(long, global = true, default_value_t = 1000)]
    pub comment_delay_ms: u64,

    /// Listing page size requested from the upstream.
    #[arg(long, global = true, default_value_t = 100)]
    pub page_size: u32,

    /// Progress display: `auto`, `always`, or `never`.
    #[arg(long, global = true, value_enum, default_value = "auto")]
    pub progress: ProgressMode,
}
