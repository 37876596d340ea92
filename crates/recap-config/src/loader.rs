// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./recap.toml` > `~/.config/recap/recap.toml` > `/etc/recap/recap.toml`,
//! with environment variable overrides via the `RECAP_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RecapConfig;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/recap/recap.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "recap.toml";

/// Section names recognised in `RECAP_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "rate_limit",
    "service",
    "telegram",
    "generator",
    "storage",
    "summary",
    "queue",
    "schedule",
];

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/recap/recap.toml`
/// 3. `~/.config/recap/recap.toml`
/// 4. `./recap.toml`
/// 5. `RECAP_*` environment variables
pub fn load_config() -> Result<RecapConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the compiled defaults.
pub fn load_config_from_str(toml_content: &str) -> Result<RecapConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RecapConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RecapConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RecapConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for hierarchy loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RecapConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("recap/recap.toml"))
}

/// Environment provider mapping `RECAP_TELEGRAM_BOT_TOKEN` to `telegram.bot_token`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names
/// themselves contain underscores.
fn env_provider() -> Env {
    Env::prefixed("RECAP_").map(|key| env_key_to_path(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config path.
///
/// Names that do not start with a known section are returned unchanged, which
/// makes them top-level keys and lets `deny_unknown_fields` reject them.
pub fn env_key_to_path(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
            .filter(|r| !r.is_empty())
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
