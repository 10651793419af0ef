use std::path::{Path, PathBuf};

use anyhow::{Context as _, anyhow};
use chrono::{DateTime, Utc};
use url::Url;

use crate::fetcher::Fetcher;
use crate::post::PostRecord;
use crate::progress::DownloadKind;

/// `MM_MonthName/DD` for a creation timestamp, in UTC.
pub fn day_path(created_utc: i64) -> anyhow::Result<PathBuf> {
    let date = DateTime::<Utc>::from_timestamp(created_utc, 0)
        .ok_or_else(|| anyhow!("timestamp {created_utc} is out of range"))?;
    let month = date.format("%m_%B").to_string();
    let day = date.format("%d").to_string();
    Ok(Path::new(&month).join(day))
}

/// Resolves the day directory under `root` and creates it if needed.
pub fn ensure_day_dir(root: &Path, created_utc: i64) -> anyhow::Result<PathBuf> {
    let dir = root.join(day_path(created_utc)?);
    std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn image_path(record: &PostRecord, dir: &Path) -> PathBuf {
    dir.join(format!("{}.{}", record.id, record.media_extension()))
}

pub fn comment_path(record: &PostRecord, dir: &Path) -> PathBuf {
    dir.join(format!("{}.txt", record.id))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    Downloaded { path: PathBuf, bytes: usize },
    AlreadyPresent(PathBuf),
    /// The host answered with an error status; nothing was written, so the
    /// next run tries again.
    Unavailable { status: u16 },
}

/// Downloads the record's media into `dir` unless a file with the target
/// name already exists. Content is never re-validated. An error status skips
/// the record; transport failures propagate.
pub async fn fetch_image(
    fetcher: &Fetcher,
    record: &PostRecord,
    dir: &Path,
) -> anyhow::Result<ImageOutcome> {
    let path = image_path(record, dir);
    if path.exists() {
        return Ok(ImageOutcome::AlreadyPresent(path));
    }

    let url = Url::parse(&record.media_url)
        .with_context(|| format!("invalid media url {}", record.media_url))?;
    let (status, bytes) = fetcher
        .get_with_status(DownloadKind::Image, url)
        .await
        .with_context(|| format!("download image for {}", record.id))?;
    if !status.is_success() {
        tracing::warn!(
            id = %record.id,
            url = %record.media_url,
            %status,
            "image unavailable, skipping"
        );
        return Ok(ImageOutcome::Unavailable {
            status: status.as_u16(),
        });
    }
    std::fs::write(&path, &bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(ImageOutcome::Downloaded {
        path,
        bytes: bytes.len(),
    })
}

/// Writes the annotation next to the image, replacing any previous file.
/// Returns the path written, or `None` when the record has no annotation.
pub fn write_comment(record: &PostRecord, dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let Some(comment) = record.annotation() else {
        return Ok(None);
    };
    let path = comment_path(record, dir);
    std::fs::write(&path, comment).with_context(|| format!("write {}", path.display()))?;
    Ok(Some(path))
}
