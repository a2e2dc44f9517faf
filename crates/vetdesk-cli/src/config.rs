// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;
use vetdesk_api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use vetdesk_app::PageKind;

pub const APP_NAME: &str = "vetdesk";
const CONFIG_VERSION: i64 = 1;
const MAX_WHEEL_FADE_MS: u64 = 5_000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: Server::default(),
            catalog: CatalogSection::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub start_page: Option<String>,
    pub wheel_fade_ms: Option<u64>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            start_page: Some(PageKind::Inventory.label().to_owned()),
            wheel_fade_ms: Some(0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some("info".to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("VETDESK_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set VETDESK_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and put values under [server], [catalog], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.server.base_url
            && base_url.trim().is_empty()
        {
            bail!("server.base_url in {} must not be empty", path.display());
        }

        if let Some(timeout) = &self.server.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "server.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(page) = &self.ui.start_page
            && PageKind::parse(page).is_none()
        {
            bail!(
                "ui.start_page in {} must be one of inventario, agenda, servicios; got {:?}",
                path.display(),
                page
            );
        }

        if let Some(fade) = self.ui.wheel_fade_ms
            && fade > MAX_WHEEL_FADE_MS
        {
            bail!(
                "ui.wheel_fade_ms in {} must be at most {}, got {}",
                path.display(),
                MAX_WHEEL_FADE_MS,
                fade
            );
        }

        if let Some(level) = &self.log.level {
            Level::from_str(level).map_err(|_| {
                anyhow!(
                    "log.level in {} must be one of error, warn, info, debug, trace; got {:?}",
                    path.display(),
                    level
                )
            })?;
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.server
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Result<Duration> {
        match self.server.timeout.as_deref() {
            Some(raw) => parse_duration(raw),
            None => Ok(DEFAULT_TIMEOUT),
        }
    }

    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.catalog.path.as_deref().map(PathBuf::from)
    }

    pub fn start_page(&self) -> PageKind {
        self.ui
            .start_page
            .as_deref()
            .and_then(PageKind::parse)
            .unwrap_or(PageKind::Inventory)
    }

    pub fn wheel_fade(&self) -> Option<Duration> {
        self.ui
            .wheel_fade_ms
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
    }

    pub fn log_level(&self) -> Level {
        self.log
            .level
            .as_deref()
            .and_then(|level| Level::from_str(level).ok())
            .unwrap_or(Level::INFO)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log.file {
            Some(path) => Ok(PathBuf::from(path)),
            None => {
                let data_root = dirs::data_local_dir().ok_or_else(|| {
                    anyhow!("cannot resolve data directory; set [log] file in the config")
                })?;
                Ok(data_root.join(APP_NAME).join("vetdesk.log"))
            }
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# vetdesk config\n# Place this file at: {}\n\nversion = 1\n\n[server]\nbase_url = \"{}\"\ntimeout = \"{}s\"\n\n[catalog]\n# JSON file with products, services, pets and appointment kinds\n# path = \"/absolute/path/to/catalogo.json\"\n\n[ui]\n# inventario | agenda | servicios\nstart_page = \"inventario\"\n# 0 removes closed menus at once\nwheel_fade_ms = 0\n\n[log]\nlevel = \"info\"\n# Optional. Default is the platform data dir (for example ~/.local/share/vetdesk/vetdesk.log)\n# file = \"/absolute/path/to/vetdesk.log\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT.as_secs()
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;
    use tracing::Level;
    use vetdesk_app::PageKind;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.base_url(), "http://localhost:8000");
        assert_eq!(config.timeout()?, Duration::from_secs(5));
        assert_eq!(config.start_page(), PageKind::Inventory);
        assert_eq!(config.wheel_fade(), None);
        assert_eq!(config.log_level(), Level::INFO);
        assert!(config.catalog_path().is_none());
        Ok(())
    }

    #[test]
    fn server_section_without_timeout_uses_client_default() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[server]\nbase_url = \"http://clinica.local\"\n")?;
        let config = Config::load(&path)?;
        assert_eq!(config.timeout()?, vetdesk_api::DEFAULT_TIMEOUT);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[server]\nbase_url = \"http://clinica.local\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[server], [catalog], [ui], and [log]"));
        Ok(())
    }

    #[test]
    fn full_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[server]\nbase_url = \"http://clinica.local:8000//\"\ntimeout = \"1500ms\"\n[catalog]\npath = \"/srv/vetdesk/catalogo.json\"\n[ui]\nstart_page = \"agenda\"\nwheel_fade_ms = 200\n[log]\nlevel = \"debug\"\nfile = \"/tmp/vetdesk.log\"\n",
        )?;
        let config = Config::load(&path)?;
        assert_eq!(config.base_url(), "http://clinica.local:8000");
        assert_eq!(config.timeout()?, Duration::from_millis(1500));
        assert_eq!(
            config.catalog_path(),
            Some(PathBuf::from("/srv/vetdesk/catalogo.json"))
        );
        assert_eq!(config.start_page(), PageKind::Agenda);
        assert_eq!(config.wheel_fade(), Some(Duration::from_millis(200)));
        assert_eq!(config.log_level(), Level::DEBUG);
        assert_eq!(config.log_path()?, PathBuf::from("/tmp/vetdesk.log"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() -> Result<()> {
        let cases = [
            ("version = 1\n[server]\ntimeout = \"0s\"\n", "must be positive"),
            ("version = 1\n[server]\ntimeout = \"soon\"\n", "invalid duration"),
            ("version = 1\n[server]\nbase_url = \" \"\n", "must not be empty"),
            ("version = 1\n[ui]\nstart_page = \"caja\"\n", "ui.start_page"),
            ("version = 1\n[ui]\nwheel_fade_ms = 60000\n", "at most 5000"),
            ("version = 1\n[log]\nlevel = \"loud\"\n", "log.level"),
        ];
        for (content, expected) in cases {
            let (_temp, path) = write_config(content)?;
            let error = Config::load(&path).expect_err("invalid config should fail");
            let message = format!("{error:#}");
            assert!(message.contains(expected), "{content:?} gave {message}");
        }
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("VETDESK_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("VETDESK_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_ends_in_app_config_toml() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("VETDESK_CONFIG_PATH");
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("vetdesk/config.toml"));
        Ok(())
    }

    #[test]
    fn durations_parse_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        Ok(())
    }

    #[test]
    fn example_config_loads_back() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("[server]"));
        assert!(example.contains("[catalog]"));
        assert!(example.contains("[ui]"));
        assert!(example.contains("[log]"));
        std::fs::write(&path, example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.start_page(), PageKind::Inventory);
        Ok(())
    }
}
