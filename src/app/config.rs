//! Config file defaults for the CLI.
//!
//! The file is a flat list of `key = value` lines in TOML syntax (strings in
//! double quotes, `#` comments). Only the keys below are accepted; anything
//! else is an error so typos do not go unnoticed.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

const APP_DIR: &str = "imgfetch";
const CONFIG_FILE: &str = "config.toml";

/// Values read from the config file. `None` means "not set".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    pub output_dir: Option<PathBuf>,
    pub max_images: Option<usize>,
    pub delay_secs: Option<f64>,
    pub timeout_secs: Option<f64>,
    pub same_domain: Option<bool>,
    pub check_robots: Option<bool>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Applies the same ranges as the command line.
    pub fn validate(&self) -> Result<()> {
        if self.max_images == Some(0) {
            bail!("Invalid config value for `max_images`: 0. Expected at least 1");
        }
        if let Some(delay) = self.delay_secs
            && !(delay.is_finite() && delay >= 0.0)
        {
            bail!("Invalid config value for `delay_secs`: {delay}. Expected a non-negative number");
        }
        if let Some(timeout) = self.timeout_secs
            && !(timeout.is_finite() && timeout > 0.0)
        {
            bail!("Invalid config value for `timeout_secs`: {timeout}. Expected a positive number");
        }
        if self
            .user_agent
            .as_deref()
            .is_some_and(|ua| ua.trim().is_empty())
        {
            bail!("Invalid config value for `user_agent`: must not be empty");
        }
        Ok(())
    }
}

/// Config file lookup result.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Path that was (or would have been) read.
    pub path: Option<PathBuf>,
    /// Parsed values, when a file existed.
    pub config: FileConfig,
    pub loaded_from_file: bool,
}

/// Default config location.
///
/// 1. `$XDG_CONFIG_HOME/imgfetch/config.toml`
/// 2. `$HOME/.config/imgfetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg) = env_var_non_empty("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join(APP_DIR).join(CONFIG_FILE));
    }
    let home = env_var_non_empty("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILE),
    )
}

fn env_var_non_empty(name: &str) -> Option<std::ffi::OsString> {
    env::var_os(name).filter(|value| !value.is_empty())
}

/// Loads the config file at the default location, if it exists.
pub fn load_default() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(p) if p.exists() => Ok(LoadedConfig {
            config: load_from(p)?,
            path,
            loaded_from_file: true,
        }),
        _ => Ok(LoadedConfig {
            path,
            ..LoadedConfig::default()
        }),
    }
}

/// Loads an explicitly named config file. A missing file is an error.
pub fn load_explicit(path: &Path) -> Result<LoadedConfig> {
    Ok(LoadedConfig {
        path: Some(path.to_path_buf()),
        config: load_from(path)?,
        loaded_from_file: true,
    })
}

fn load_from(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (index, raw_line) in raw.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };
        let (key, value) = (key.trim(), value.trim());
        let context = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "output_dir" => {
                cfg.output_dir = Some(PathBuf::from(parse_string(value).with_context(context)?));
            }
            "user_agent" => cfg.user_agent = Some(parse_string(value).with_context(context)?),
            "max_images" => cfg.max_images = Some(parse_integer(value).with_context(context)?),
            "min_width" => cfg.min_width = Some(parse_integer(value).with_context(context)?),
            "min_height" => cfg.min_height = Some(parse_integer(value).with_context(context)?),
            "delay_secs" => cfg.delay_secs = Some(parse_number(value).with_context(context)?),
            "timeout_secs" => cfg.timeout_secs = Some(parse_number(value).with_context(context)?),
            "same_domain" => cfg.same_domain = Some(parse_boolean(value).with_context(context)?),
            "check_robots" => cfg.check_robots = Some(parse_boolean(value).with_context(context)?),
            unknown => bail!("Unknown configuration key: '{unknown}' on line {line_no}"),
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string(value: &str) -> Result<String> {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .map(str::to_string)
        .context("Expected double-quoted string")
}

fn parse_integer<T: std::str::FromStr>(value: &str) -> Result<T> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        bail!("Expected non-negative integer");
    }
    value
        .parse::<T>()
        .map_err(|_| anyhow::anyhow!("Integer value out of range"))
}

fn parse_number(value: &str) -> Result<f64> {
    let number: f64 = value.parse().context("Expected number")?;
    if !number.is_finite() {
        bail!("Expected finite number");
    }
    Ok(number)
}

fn parse_boolean(value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
