use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::cli::Args;

/// Name of the submission cache inside the data directory.
pub const CACHE_FILE_NAME: &str = "submissions_urls.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing upstream credential: {0} (set it in the environment or .env)")]
    MissingCredential(&'static str),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },
}

#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Settings resolved once at startup and passed to each component.
#[derive(Debug, Clone)]
pub struct Config {
    pub account: String,
    pub data_dir: PathBuf,
    pub user_agent: String,
    pub api_base: Url,
    pub auth_url: Url,
    pub site_base: String,
    pub comment_delay: Duration,
    pub page_size: u32,
    credentials: Option<Credentials>,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let config = Self {
            account: args.account.trim().to_string(),
            data_dir: args.data_dir.clone(),
            user_agent: args.user_agent.clone(),
            api_base: args.api_base.clone(),
            auth_url: args.auth_url.clone(),
            site_base: args.site_base.trim_end_matches('/').to_string(),
            comment_delay: Duration::from_millis(args.comment_delay_ms),
            page_size: args.page_size,
            credentials: match (&args.client_id, &args.client_secret) {
                (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                    Some(Credentials {
                        client_id: id.clone(),
                        client_secret: secret.clone(),
                    })
                }
                _ => None,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "account",
                message: "must not be empty".to_string(),
            });
        }
        if self.account.contains('/') {
            return Err(ConfigError::InvalidValue {
                name: "account",
                message: format!("{:?} is not a bare account name", self.account),
            });
        }
        if self.page_size == 0 || self.page_size > 100 {
            return Err(ConfigError::InvalidValue {
                name: "page_size",
                message: format!("{} is outside 1..=100", self.page_size),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "user_agent",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Credentials are only required when the upstream has to be contacted.
    pub fn credentials(&self) -> Result<&Credentials, ConfigError> {
        self.credentials
            .as_ref()
            .ok_or(ConfigError::MissingCredential("REDDIT_CLIENT_ID/REDDIT_CLIENT_SECRET"))
    }

    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(CACHE_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;

    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["daily-post-archiver"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn defaults_resolve() {
        let args = parse(&["--client-id", "id", "--client-secret", "secret"]);
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.account, "animetoday");
        assert_eq!(config.cache_path(), PathBuf::from("data").join(CACHE_FILE_NAME));
        assert_eq!(config.comment_delay, Duration::from_secs(1));
        assert_eq!(config.site_base, "https://www.reddit.com");
        assert_eq!(config.credentials().unwrap().client_id, "id");
    }

    #[test]
    fn missing_credentials_only_fail_on_demand() {
        let mut args = parse(&[]);
        args.client_id = None;
        args.client_secret = None;
        let config = Config::from_args(&args).unwrap();
        assert!(matches!(
            config.credentials(),
            Err(ConfigError::MissingCredential(_))
        ));
    }

    #[test]
    fn rejects_bad_page_size() {
        let args = parse(&["--page-size", "0"]);
        let err = Config::from_args(&args).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "page_size", .. }));
    }

    #[test]
    fn audit_subcommand_parses() {
        let args = parse(&["audit", "--data-dir", "/tmp/x"]);
        assert!(matches!(args.command, Some(crate::cli::Command::Audit)));
        assert_eq!(args.data_dir, PathBuf::from("/tmp/x"));
    }
}
