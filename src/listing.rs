use std::time::Duration;

use crate::post::PostRecord;
use crate::progress::Progress;
use crate::upstream::{Comment, Submission, Upstream};

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const DAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const IMAGE_SUFFIXES: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// True when the title names a month, a weekday, or contains "today".
pub fn title_has_date_indicator(title: &str) -> bool {
    let title = title.to_lowercase();
    MONTH_NAMES.iter().any(|m| title.contains(m))
        || DAY_NAMES.iter().any(|d| title.contains(d))
        || title.contains("today")
}

pub fn is_image_url(url: &str) -> bool {
    IMAGE_SUFFIXES.iter().any(|s| url.ends_with(s))
}

/// Outcome of the best-effort annotation search for one post.
#[derive(Debug)]
pub enum CommentLookup {
    Found(String),
    NotFound,
    LookupFailed(anyhow::Error),
}

impl CommentLookup {
    pub fn into_annotation(self) -> Option<String> {
        match self {
            CommentLookup::Found(body) => Some(body),
            CommentLookup::NotFound | CommentLookup::LookupFailed(_) => None,
        }
    }
}

/// First comment by `account` whose body is wrapped in `{` ... `}`.
pub fn select_annotation(comments: &[Comment], account: &str) -> Option<String> {
    comments
        .iter()
        .find(|c| {
            c.author
                .as_deref()
                .is_some_and(|a| a.eq_ignore_ascii_case(account))
                && c.body.starts_with('{')
                && c.body.ends_with('}')
        })
        .map(|c| c.body.clone())
}

pub fn permalink(site_base: &str, relative: &str) -> String {
    format!("{site_base}{relative}")
}

/// Walks the account's whole submission history and keeps the dated image
/// posts, in upstream order.
pub async fn collect_posts(
    upstream: &Upstream,
    account: &str,
    site_base: &str,
    comment_delay: Duration,
    progress: &Progress,
) -> anyhow::Result<Vec<PostRecord>> {
    let submissions = upstream.submissions(account).await?;
    tracing::info!(count = submissions.len(), %account, "listing fetched");
    progress.set_posts_total(submissions.len());

    let mut posts = Vec::new();
    for submission in submissions {
        progress.post_done(&submission.id);
        let link = permalink(site_base, &submission.permalink);

        if !title_has_date_indicator(&submission.title) {
            tracing::info!(
                title = %submission.title,
                permalink = %link,
                "skipping: title has no date indicator"
            );
            continue;
        }
        if !is_image_url(&submission.url) {
            tracing::info!(
                title = %submission.title,
                url = %submission.url,
                "skipping: not an image"
            );
            continue;
        }

        let lookup = lookup_comment(upstream, &submission, account, comment_delay).await;
        match &lookup {
            CommentLookup::Found(body) => {
                tracing::info!(id = %submission.id, comment = %body, "found comment");
            }
            CommentLookup::NotFound => {
                tracing::debug!(id = %submission.id, "no annotation comment");
            }
            CommentLookup::LookupFailed(err) => {
                tracing::warn!(id = %submission.id, error = %format!("{err:#}"), "error getting comment");
            }
        }

        posts.push(PostRecord {
            title: submission.title,
            id: submission.id,
            permalink: link,
            media_url: submission.url,
            created_utc: submission.created_utc,
            first_comment: lookup.into_annotation(),
        });
    }
    Ok(posts)
}

async fn lookup_comment(
    upstream: &Upstream,
    submission: &Submission,
    account: &str,
    delay: Duration,
) -> CommentLookup {
    tracing::debug!(id = %submission.id, "checking for comment");
    tokio::time::sleep(delay).await;
    match upstream.comments(&submission.id).await {
        Ok(comments) => match select_annotation(&comments, account) {
            Some(body) => CommentLookup::Found(body),
            None => CommentLookup::NotFound,
        },
        Err(err) => CommentLookup::LookupFailed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(author: &str, body: &str) -> Comment {
        Comment {
            author: Some(author.to_string()),
            body: body.to_string(),
        }
    }

    #[test]
    fn date_titles_are_included() {
        for title in [
            "Anime for November 14",
            "HAPPY MONDAY",
            "What to watch today",
            "friday night pick",
            "The Best of TODAY",
        ] {
            assert!(title_has_date_indicator(title), "{title}");
        }
    }

    #[test]
    fn undated_titles_are_excluded() {
        for title in ["Weekly discussion", "Meta: rules update", "Anime recommendations"] {
            assert!(!title_has_date_indicator(title), "{title}");
        }
    }

    #[test]
    fn only_image_urls_pass() {
        for url in [
            "https://i.redd.it/a.jpg",
            "https://i.redd.it/a.jpeg",
            "https://i.redd.it/a.png",
            "https://i.imgur.com/a.gif",
        ] {
            assert!(is_image_url(url), "{url}");
        }
        for url in [
            "https://v.redd.it/abcdef",
            "https://i.imgur.com/a.gifv",
            "https://www.reddit.com/r/x/comments/abc/",
            "https://i.redd.it/a.webp",
        ] {
            assert!(!is_image_url(url), "{url}");
        }
    }

    #[test]
    fn first_bracketed_comment_by_account_wins() {
        let comments = vec![
            comment("someone", "{\"source\":\"spam\"}"),
            comment("animetoday", "thanks all"),
            comment("AnimeToday", "{\"source\":\"x\"}"),
            comment("animetoday", "{\"source\":\"y\"}"),
        ];
        assert_eq!(
            select_annotation(&comments, "animetoday").as_deref(),
            Some("{\"source\":\"x\"}")
        );
    }

    #[test]
    fn deleted_author_never_matches() {
        let comments = vec![Comment {
            author: None,
            body: "{}".to_string(),
        }];
        assert_eq!(select_annotation(&comments, "animetoday"), None);
    }

    #[test]
    fn failed_lookup_collapses_to_no_annotation() {
        let failed = CommentLookup::LookupFailed(anyhow::anyhow!("status 429"));
        assert_eq!(failed.into_annotation(), None);
        assert_eq!(CommentLookup::NotFound.into_annotation(), None);
        assert_eq!(
            CommentLookup::Found("{}".to_string()).into_annotation(),
            Some("{}".to_string())
        );
    }

    #[test]
    fn permalink_is_absolute() {
        assert_eq!(
            permalink("https://www.reddit.com", "/r/a/comments/abc/t/"),
            "https://www.reddit.com/r/a/comments/abc/t/"
        );
    }
}
