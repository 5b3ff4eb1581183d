// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use enlace_app::DEFAULT_LOG_CAPACITY;
use enlace_ingest::DEFAULT_PREVIEW_ROWS;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_VERSION: i64 = 1;
const APP_NAME: &str = "enlace";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub ingest: Ingest,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            ui: Ui::default(),
            ingest: Ingest::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub show_markers: Option<bool>,
    pub log_capacity: Option<usize>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            show_markers: Some(true),
            log_capacity: Some(DEFAULT_LOG_CAPACITY),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ingest {
    pub preview_rows: Option<usize>,
    pub max_tables: Option<usize>,
}

impl Default for Ingest {
    fn default() -> Self {
        Self {
            preview_rows: Some(DEFAULT_PREVIEW_ROWS),
            max_tables: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("ENLACE_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set ENLACE_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
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
                    "config file {} is not versioned. Add `version = 1` and place values under [ui] and [ingest]",
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
        if let Some(capacity) = self.ui.log_capacity
            && capacity == 0
        {
            bail!(
                "ui.log_capacity in {} must be positive, got 0",
                path.display()
            );
        }

        if let Some(max_tables) = self.ingest.max_tables
            && max_tables == 0
        {
            bail!(
                "ingest.max_tables in {} must be positive, got 0",
                path.display()
            );
        }

        Ok(())
    }

    pub fn show_markers(&self) -> bool {
        self.ui.show_markers.unwrap_or(true)
    }

    pub fn log_capacity(&self) -> usize {
        self.ui.log_capacity.unwrap_or(DEFAULT_LOG_CAPACITY)
    }

    pub fn preview_rows(&self) -> usize {
        self.ingest.preview_rows.unwrap_or(DEFAULT_PREVIEW_ROWS)
    }

    pub fn max_tables(&self) -> Option<usize> {
        self.ingest.max_tables
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# enlace config\n# Place this file at: {}\n\nversion = 1\n\n[ui]\nshow_markers = true\nlog_capacity = {}\n\n[ingest]\n# Sample rows kept per table, beyond the header row\npreview_rows = {}\n# Optional cap on loaded tables\n# max_tables = 12\n",
            path.display(),
            DEFAULT_LOG_CAPACITY,
            DEFAULT_PREVIEW_ROWS,
        )
    }
}
