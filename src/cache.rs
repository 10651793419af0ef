use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize as _;
use thiserror::Error;

use crate::post::PostRecord;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("read cache {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write cache {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache {path} does not match the record schema: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cache {path} contains id {id:?} more than once")]
    DuplicateId { path: PathBuf, id: String },
}

/// Single JSON snapshot of the filtered listing.
///
/// Once the file exists it is the only source of records for a run.
#[derive(Debug, Clone)]
pub struct SubmissionCache {
    path: PathBuf,
}

impl SubmissionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Overwrites the whole file with `records`.
    pub fn save(&self, records: &[PostRecord]) -> Result<(), CacheError> {
        self.check_unique(records)?;

        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        records
            .serialize(&mut ser)
            .map_err(|source| CacheError::Schema {
                path: self.path.clone(),
                source,
            })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| CacheError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }
        std::fs::write(&self.path, out).map_err(|source| CacheError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn load(&self) -> Result<Vec<PostRecord>, CacheError> {
        let bytes = std::fs::read(&self.path).map_err(|source| CacheError::Read {
            path: self.path.clone(),
            source,
        })?;
        let records: Vec<PostRecord> =
            serde_json::from_slice(&bytes).map_err(|source| CacheError::Schema {
                path: self.path.clone(),
                source,
            })?;
        self.check_unique(&records)?;
        Ok(records)
    }

    fn check_unique(&self, records: &[PostRecord]) -> Result<(), CacheError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.id.as_str()) {
                return Err(CacheError::DuplicateId {
                    path: self.path.clone(),
                    id: record.id.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn record(id: &str, comment: Option<&str>) -> PostRecord {
        PostRecord {
            title: format!("Anime for Tuesday {id}"),
            id: id.to_string(),
            permalink: format!("https://www.reddit.com/r/x/comments/{id}/"),
            media_url: format!("https://i.redd.it/{id}.png"),
            created_utc: 1_700_000_000,
            first_comment: comment.map(str::to_string),
        }
    }

    #[test]
    fn save_then_load_preserves_records() {
        let tmp = tempdir().unwrap();
        let cache = SubmissionCache::new(tmp.path().join("data/submissions_urls.json"));
        assert!(!cache.exists());

        let records = vec![record("a1", Some(r#"{"source":"x"}"#)), record("b2", None)];
        cache.save(&records).unwrap();
        assert!(cache.exists());
        assert_eq!(cache.load().unwrap(), records);

        let text = std::fs::read_to_string(cache.path()).unwrap();
        assert!(text.contains("\n        \"title\""));
        assert!(text.contains("\"first_comment\": null"));
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let tmp = tempdir().unwrap();
        let cache = SubmissionCache::new(tmp.path().join("c.json"));
        cache.save(&[record("a1", None), record("b2", None)]).unwrap();
        cache.save(&[record("c3", None)]).unwrap();
        let loaded = cache.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "c3");
    }

    #[test]
    fn load_rejects_missing_required_field() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("c.json");
        std::fs::write(
            &path,
            r#"[{"title":"t","id":"a","permalink":"p","created_utc":1}]"#,
        )
        .unwrap();
        let err = SubmissionCache::new(&path).load().unwrap_err();
        assert!(matches!(err, CacheError::Schema { .. }));
        assert!(err.to_string().contains("media_url"));
    }

    #[test]
    fn load_treats_missing_comment_as_absent() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("c.json");
        std::fs::write(
            &path,
            r#"[{"title":"t","id":"a","permalink":"p","media_url":"m.gif","created_utc":1.0}]"#,
        )
        .unwrap();
        let loaded = SubmissionCache::new(&path).load().unwrap();
        assert_eq!(loaded[0].first_comment, None);
        assert_eq!(loaded[0].created_utc, 1);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let tmp = tempdir().unwrap();
        let cache = SubmissionCache::new(tmp.path().join("c.json"));
        let err = cache.save(&[record("a1", None), record("a1", None)]).unwrap_err();
        assert!(matches!(err, CacheError::DuplicateId { ref id, .. } if id == "a1"));
        assert!(!cache.exists());
    }
}
