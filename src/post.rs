use serde::{Deserialize, Deserializer, Serialize};

/// One archived image post plus its optional annotation comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub title: String,
    pub id: String,
    pub permalink: String,
    pub media_url: String,
    #[serde(deserialize_with = "whole_seconds")]
    pub created_utc: i64,
    #[serde(default)]
    pub first_comment: Option<String>,
}

impl PostRecord {
    /// Text after the last `.` of the media URL, taken verbatim.
    pub fn media_extension(&self) -> &str {
        url_extension(&self.media_url)
    }

    /// Annotation worth persisting; empty comments count as absent.
    pub fn annotation(&self) -> Option<&str> {
        self.first_comment.as_deref().filter(|c| !c.is_empty())
    }
}

pub fn url_extension(url: &str) -> &str {
    url.rsplit('.').next().unwrap_or(url)
}

/// Accepts both integer and float timestamps; fractions are truncated.
pub(crate) fn whole_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = serde_json::Number::deserialize(deserializer)?;
    if let Some(v) = n.as_i64() {
        return Ok(v);
    }
    match n.as_f64() {
        Some(v) if v.is_finite() => Ok(v.trunc() as i64),
        _ => Err(serde::de::Error::custom(format!(
            "timestamp {n} is not representable as whole seconds"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_last_dot_segment() {
        assert_eq!(url_extension("https://i.redd.it/abc.def.png"), "png");
        assert_eq!(url_extension("https://i.imgur.com/pic.jpeg"), "jpeg");
    }

    #[test]
    fn float_timestamp_truncates() {
        let json = r#"{"title":"t","id":"a","permalink":"p","media_url":"m.jpg","created_utc":1700000000.9,"first_comment":null}"#;
        let post: PostRecord = serde_json::from_str(json).unwrap();
        assert_eq!(post.created_utc, 1_700_000_000);
        assert_eq!(post.first_comment, None);
    }

    #[test]
    fn empty_comment_is_not_an_annotation() {
        let post = PostRecord {
            title: "t".into(),
            id: "a".into(),
            permalink: "p".into(),
            media_url: "m.jpg".into(),
            created_utc: 0,
            first_comment: Some(String::new()),
        };
        assert_eq!(post.annotation(), None);
    }
}
