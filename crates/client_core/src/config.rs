use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use shared::{domain::EntityKind, protocol::FilterKeys};
use url::Url;

use crate::auth::DemoAccount;

pub const DEFAULT_SETTINGS_FILE: &str = "blog.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub api_url: String,
    pub timeout_secs: u64,
    pub page_size: u32,
    pub collections: CollectionPaths,
    /// Query parameter names for post listing filters.
    pub filter_keys: FilterKeys,
    pub accounts: Vec<DemoAccount>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".into(),
            timeout_secs: 10,
            page_size: 10,
            collections: CollectionPaths::default(),
            filter_keys: FilterKeys::default(),
            accounts: DemoAccount::defaults(),
        }
    }
}

impl ClientSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.max(1)
    }

    pub fn api_base(&self) -> anyhow::Result<Url> {
        let url = Url::parse(self.api_url.trim())
            .with_context(|| format!("invalid api_url '{}'", self.api_url))?;
        if url.cannot_be_a_base() {
            anyhow::bail!("api_url '{}' cannot be used as a base url", self.api_url);
        }
        Ok(url)
    }
}

/// Path segment for each collection, e.g. `professores` on a Portuguese-language backend.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CollectionPaths {
    pub posts: String,
    pub professors: String,
    pub students: String,
}

impl Default for CollectionPaths {
    fn default() -> Self {
        Self {
            posts: EntityKind::Post.default_collection().into(),
            professors: EntityKind::Professor.default_collection().into(),
            students: EntityKind::Student.default_collection().into(),
        }
    }
}

impl CollectionPaths {
    pub fn for_kind(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Post => &self.posts,
            EntityKind::Professor => &self.professors,
            EntityKind::Student => &self.students,
        }
    }
}

/// Reads `blog.toml` from the working directory when present, then applies
/// environment overrides. A missing or unreadable file falls back to defaults.
pub fn load_settings() -> ClientSettings {
    let mut settings = fs::read_to_string(DEFAULT_SETTINGS_FILE)
        .ok()
        .and_then(|raw| parse_settings(&raw).ok())
        .unwrap_or_default();
    apply_env_overrides(&mut settings);
    settings
}

/// Like [`load_settings`] but the file must exist and parse.
pub fn load_settings_from(path: &Path) -> anyhow::Result<ClientSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    let mut settings = parse_settings(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

pub fn parse_settings(raw: &str) -> anyhow::Result<ClientSettings> {
    Ok(toml::from_str::<ClientSettings>(raw)?)
}

pub fn apply_env_overrides(settings: &mut ClientSettings) {
    apply_overrides(settings, |key| std::env::var(key).ok());
}

fn apply_overrides(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("BLOG_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = lookup("APP__TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.timeout_secs = parsed;
        }
    }

    if let Some(v) = lookup("APP__PAGE_SIZE") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.page_size = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
