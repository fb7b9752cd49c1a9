use std::{fs, io::ErrorKind, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::warn;
use url::Url;

pub const CONFIG_FILE: &str = "blog.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub database_url: String,
    pub request_timeout_secs: u64,
    pub posts_per_page: u32,
    pub comments_per_page: u32,
    pub users_per_page: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".into(),
            database_url: "sqlite://./data/blog.db".into(),
            request_timeout_secs: 10,
            posts_per_page: 10,
            comments_per_page: 20,
            users_per_page: 10,
        }
    }
}

/// Keys accepted in `blog.toml`; anything missing keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_url: Option<String>,
    database_url: Option<String>,
    request_timeout_secs: Option<u64>,
    posts_per_page: Option<u32>,
    comments_per_page: Option<u32>,
    users_per_page: Option<u32>,
}

pub fn load_settings() -> Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(CONFIG_FILE) {
        Ok(raw) => settings
            .apply_file(&raw)
            .with_context(|| format!("failed to parse {CONFIG_FILE}"))?,
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(err).with_context(|| format!("failed to read {CONFIG_FILE}")),
    }

    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

impl Settings {
    pub fn apply_file(&mut self, raw: &str) -> Result<()> {
        let file: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file.api_url {
            self.api_url = v;
        }
        if let Some(v) = file.database_url {
            self.database_url = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file.posts_per_page {
            self.posts_per_page = v;
        }
        if let Some(v) = file.comments_per_page {
            self.comments_per_page = v;
        }
        if let Some(v) = file.users_per_page {
            self.users_per_page = v;
        }
        Ok(())
    }

    /// Later names win, so `APP__*` overrides the short form.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("BLOG_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = lookup("APP__API_URL") {
            self.api_url = v;
        }

        if let Some(v) = lookup("DATABASE_URL") {
            self.database_url = v;
        }
        if let Some(v) = lookup("APP__DATABASE_URL") {
            self.database_url = v;
        }

        if let Some(v) = parsed_env(&lookup, "APP__REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v;
        }
        if let Some(v) = parsed_env(&lookup, "APP__POSTS_PER_PAGE") {
            self.posts_per_page = v;
        }
        if let Some(v) = parsed_env(&lookup, "APP__COMMENTS_PER_PAGE") {
            self.comments_per_page = v;
        }
        if let Some(v) = parsed_env(&lookup, "APP__USERS_PER_PAGE") {
            self.users_per_page = v;
        }
    }

    pub fn apply_overrides(
        &mut self,
        api_url: Option<String>,
        database_url: Option<String>,
        request_timeout_secs: Option<u64>,
    ) {
        if let Some(v) = api_url {
            self.api_url = v;
        }
        if let Some(v) = database_url {
            self.database_url = v;
        }
        if let Some(v) = request_timeout_secs {
            self.request_timeout_secs = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_url)
            .with_context(|| format!("invalid api_url '{}'", self.api_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("api_url '{}' must use http or https", self.api_url);
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        if self.posts_per_page == 0 || self.comments_per_page == 0 || self.users_per_page == 0 {
            bail!("page sizes must be at least 1");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn normalized_database_url(&self) -> String {
        normalize_database_url(&self.database_url)
    }
}

fn parsed_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

/// Turns a bare file path into a sqlite URL; full URLs pass through.
fn normalize_database_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return Settings::default().database_url;
    }
    if raw.starts_with("sqlite:") || raw.contains("://") {
        return raw.to_string();
    }
    format!("sqlite://{}", raw.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
