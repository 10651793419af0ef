use std::path::{Path, PathBuf};

use anyhow::Context as _;

/// Day directories (`<root>/<month>/<day>`) that hold no entries at all.
///
/// Only the two archive levels are inspected; files at either level (the
/// cache file, stray notes) are ignored. Nothing is repaired.
pub fn find_empty_day_dirs(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut empty = Vec::new();
    for month in sorted_subdirs(root)? {
        for day in sorted_subdirs(&month)? {
            let mut entries =
                std::fs::read_dir(&day).with_context(|| format!("read {}", day.display()))?;
            if entries.next().is_none() {
                empty.push(day);
            }
        }
    }
    Ok(empty)
}

fn sorted_subdirs(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        // follows symlinks
        let path = entry.path();
        if path.is_dir() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Logs each empty day directory and returns how many were found.
pub fn run_audit(root: &Path) -> anyhow::Result<usize> {
    let empty = find_empty_day_dirs(root)?;
    for dir in &empty {
        tracing::warn!(dir = %dir.display(), "empty directory");
    }
    tracing::info!(empty = empty.len(), root = %root.display(), "audit complete");
    Ok(empty.len())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn reports_only_the_empty_day() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("11_November/14")).unwrap();
        std::fs::create_dir_all(root.join("11_November/15")).unwrap();
        std::fs::write(root.join("11_November/15/abc.jpg"), b"x").unwrap();
        std::fs::write(root.join("submissions_urls.json"), b"[]").unwrap();

        let empty = find_empty_day_dirs(root).unwrap();
        assert_eq!(empty, vec![root.join("11_November/14")]);
        assert_eq!(run_audit(root).unwrap(), 1);
    }

    #[test]
    fn clean_archive_reports_nothing() {
        let tmp = tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("01_January/01")).unwrap();
        std::fs::write(tmp.path().join("01_January/01/a.png"), b"x").unwrap();
        std::fs::write(tmp.path().join("01_January/notes.txt"), b"x").unwrap();
        assert!(find_empty_day_dirs(tmp.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_walked() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("data");
        let elsewhere = tmp.path().join("elsewhere");
        std::fs::create_dir_all(root.join("11_November")).unwrap();
        std::fs::create_dir_all(elsewhere.join("03")).unwrap();
        std::fs::create_dir_all(elsewhere.join("empty_day")).unwrap();
        std::os::unix::fs::symlink(&elsewhere, root.join("12_December")).unwrap();
        std::os::unix::fs::symlink(elsewhere.join("empty_day"), root.join("11_November/14"))
            .unwrap();
        std::fs::write(elsewhere.join("03/a.png"), b"x").unwrap();

        let empty = find_empty_day_dirs(&root).unwrap();
        assert_eq!(
            empty,
            vec![
                root.join("11_November/14"),
                root.join("12_December/empty_day"),
            ]
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = tempdir().unwrap();
        assert!(find_empty_day_dirs(&tmp.path().join("nope")).is_err());
    }
}
