use clap::Parser as _;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Credentials may live in a .env file next to the binary.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = daily_post_archiver::CliArgs::parse();
    if let Err(e) = daily_post_archiver::run(args).await {
        tracing::error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
