mod archive;
mod audit;
mod cache;
mod cli;
mod config;
mod fetcher;
mod listing;
mod post;
mod progress;
mod upstream;

use std::sync::Arc;

use anyhow::Context as _;
use cli::Args;

pub use archive::{ImageOutcome, day_path, ensure_day_dir, fetch_image, write_comment};
pub use audit::{find_empty_day_dirs, run_audit};
pub use cache::{CacheError, SubmissionCache};
pub use cli::{Args as CliArgs, Command, ProgressMode};
pub use config::{CACHE_FILE_NAME, Config, ConfigError};
pub use fetcher::Fetcher;
pub use listing::{CommentLookup, is_image_url, title_has_date_indicator};
pub use post::PostRecord;
pub use progress::Progress;

/// Counts reported at the end of an archive run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    pub downloaded: usize,
    pub already_present: usize,
    pub unavailable: usize,
    pub comments: usize,
    pub from_cache: bool,
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    use std::io::IsTerminal as _;

    let config = Config::from_args(&args).context("invalid configuration")?;

    match args.command.unwrap_or_default() {
        Command::Audit => {
            run_audit(&config.data_dir)?;
            Ok(())
        }
        Command::Run => {
            let progress_enabled = match args.progress {
                ProgressMode::Always => true,
                ProgressMode::Never => false,
                ProgressMode::Auto => std::io::stderr().is_terminal(),
            };
            let progress = Progress::new(progress_enabled);
            let res = populate(&config, progress.clone()).await;
            progress.finish();
            let summary = res?;
            tracing::info!(
                records = summary.records,
                downloaded = summary.downloaded,
                already_present = summary.already_present,
                unavailable = summary.unavailable,
                comments = summary.comments,
                from_cache = summary.from_cache,
                "archive run complete"
            );
            Ok(())
        }
    }
}

/// Loads records from the cache file, or fetches and caches them when no
/// cache exists, then downloads every image and annotation that is missing.
pub async fn populate(config: &Config, progress: Arc<Progress>) -> anyhow::Result<RunSummary> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("create {}", config.data_dir.display()))?;

    let fetcher = Fetcher::new(&config.user_agent, Some(progress.clone()))?;
    let cache = SubmissionCache::new(config.cache_path());
    let from_cache = cache.exists();

    let records = if from_cache {
        progress.set_stage("loading cache");
        let records = cache.load()?;
        tracing::info!(
            count = records.len(),
            path = %cache.path().display(),
            "loaded cached submissions"
        );
        records
    } else {
        progress.set_stage("fetching listing");
        let upstream = upstream::Upstream::connect(config, fetcher.clone()).await?;
        let records = listing::collect_posts(
            &upstream,
            &config.account,
            &config.site_base,
            config.comment_delay,
            &progress,
        )
        .await?;
        cache.save(&records)?;
        tracing::info!(
            count = records.len(),
            path = %cache.path().display(),
            "saved submissions cache"
        );
        records
    };

    progress.set_stage("archiving");
    progress.set_posts_total(records.len());
    let mut summary = RunSummary {
        records: records.len(),
        from_cache,
        ..RunSummary::default()
    };

    for record in &records {
        tracing::info!(title = %record.title, permalink = %record.permalink, "processing");

        let dir = ensure_day_dir(&config.data_dir, record.created_utc)?;
        match fetch_image(&fetcher, record, &dir).await? {
            ImageOutcome::Downloaded { path, bytes } => {
                tracing::debug!(path = %path.display(), bytes, "image saved");
                summary.downloaded += 1;
            }
            ImageOutcome::AlreadyPresent(path) => {
                tracing::debug!(path = %path.display(), "image already archived");
                progress.image_skipped();
                summary.already_present += 1;
            }
            ImageOutcome::Unavailable { .. } => summary.unavailable += 1,
        }
        if write_comment(record, &dir)?.is_some() {
            summary.comments += 1;
        }
        progress.post_done(&record.id);
    }

    Ok(summary)
}
