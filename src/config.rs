//! Configuration loading for viewer defaults.
//!
//! Settings come from three layers: a flat `key = value` file, a few
//! environment variables (`PUBMED_API_KEY`, `CONTACT_EMAIL`, `TOOL_NAME`), and
//! finally command-line flags applied by the binary.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use url::Url;

use crate::corpus::DuplicatePolicy;
use crate::index::{IndexOptions, SystemSource, default_systems};
use crate::lookup::{HttpTimeouts, LookupSettings};
use crate::topics::EmptyQueryPolicy;

/// Default listen address for `serve`.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// File-backed configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Directory holding `task_b.json`, system corpora and descriptions.
    pub data_dir: Option<PathBuf>,
    pub empty_query: Option<EmptyQueryPolicy>,
    pub duplicate_topics: Option<DuplicatePolicy>,
    /// Replaces the default system list when non-empty.
    pub systems: Vec<SystemSource>,
    pub eutils_base_url: Option<String>,
    pub tool_name: Option<String>,
    pub contact_email: Option<String>,
    pub api_key: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    pub bind: Option<String>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    ///
    /// # Errors
    ///
    /// Fails on out-of-range timeouts, an unparsable base URL, or a contact
    /// email containing control characters.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;

        if let Some(base_url) = &self.eutils_base_url {
            Url::parse(base_url).with_context(|| {
                format!("Invalid config value for `eutils_base_url`: '{base_url}'")
            })?;
        }
        if let Some(email) = &self.contact_email
            && email.chars().any(char::is_control)
        {
            bail!("Invalid config value for `contact_email`: contains control characters");
        }
        Ok(())
    }

    /// Applies environment overrides on top of file values.
    pub fn apply_env(&mut self, overrides: &EnvOverrides) {
        if let Some(api_key) = &overrides.api_key {
            self.api_key = Some(api_key.clone());
        }
        if let Some(email) = &overrides.contact_email {
            self.contact_email = Some(email.clone());
        }
        if let Some(tool) = &overrides.tool_name {
            self.tool_name = Some(tool.clone());
        }
    }

    /// Index options with defaults filled in.
    #[must_use]
    pub fn index_options(&self) -> IndexOptions {
        let defaults = IndexOptions::default();
        IndexOptions {
            data_dir: self.data_dir.clone().unwrap_or(defaults.data_dir),
            systems: if self.systems.is_empty() {
                default_systems()
            } else {
                self.systems.clone()
            },
            duplicates: self.duplicate_topics.unwrap_or_default(),
            empty_query: self.empty_query.unwrap_or_default(),
        }
    }

    /// Lookup settings with defaults filled in.
    #[must_use]
    pub fn lookup_settings(&self) -> LookupSettings {
        let defaults = LookupSettings::default();
        let timeout_defaults = HttpTimeouts::default();
        LookupSettings {
            base_url: self.eutils_base_url.clone().unwrap_or(defaults.base_url),
            tool_name: self.tool_name.clone().unwrap_or(defaults.tool_name),
            contact_email: self.contact_email.clone(),
            api_key: self.api_key.clone(),
            timeouts: HttpTimeouts {
                connect_timeout_secs: self
                    .connect_timeout_secs
                    .unwrap_or(timeout_defaults.connect_timeout_secs),
                read_timeout_secs: self
                    .read_timeout_secs
                    .unwrap_or(timeout_defaults.read_timeout_secs),
            },
        }
    }

    /// Listen address for `serve`.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        self.bind.clone().unwrap_or_else(|| DEFAULT_BIND.to_string())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Credentials and identification read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub api_key: Option<String>,
    pub contact_email: Option<String>,
    pub tool_name: Option<String>,
}

impl EnvOverrides {
    /// Reads `PUBMED_API_KEY`, `CONTACT_EMAIL` and `TOOL_NAME`; empty values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            api_key: read("PUBMED_API_KEY"),
            contact_email: read("CONTACT_EMAIL"),
            tool_name: read("TOOL_NAME"),
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/biogen-viewer/config.toml`
/// 2. `$HOME/.config/biogen-viewer/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("biogen-viewer")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("biogen-viewer")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from an explicit path, or from the default path if present.
///
/// An explicit path must exist; a missing default file is not an error.
///
/// # Errors
///
/// Fails when the file cannot be read or contains invalid settings.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    };

    if !path_ref.exists() {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    }

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
        loaded_from_file: true,
    })
}

/// Reads and parses one config file.
///
/// # Errors
///
/// Fails when the file cannot be read or contains invalid settings.
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// Parses config file contents.
///
/// # Errors
///
/// Fails on syntax errors, unknown keys, or invalid values, naming the line.
pub fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let string_value = || {
            parse_string_literal(value)
                .with_context(|| format!("Invalid `{key}` value on line {line_no}"))
        };

        match key {
            "data_dir" => cfg.data_dir = Some(PathBuf::from(string_value()?)),
            "empty_query" => {
                let parsed = string_value()?;
                cfg.empty_query = Some(parsed.parse::<EmptyQueryPolicy>().map_err(|e: String| {
                    anyhow::anyhow!("Invalid `empty_query` value on line {line_no}: {e}")
                })?);
            }
            "duplicate_topics" => {
                let parsed = string_value()?;
                cfg.duplicate_topics = Some(parsed.parse::<DuplicatePolicy>().map_err(|e: String| {
                    anyhow::anyhow!("Invalid `duplicate_topics` value on line {line_no}: {e}")
                })?);
            }
            "system" => {
                let parsed = string_value()?;
                let source: SystemSource = parsed.parse().map_err(|e: String| {
                    anyhow::anyhow!("Invalid `system` value on line {line_no}: {e}")
                })?;
                cfg.systems.push(source);
            }
            "eutils_base_url" => cfg.eutils_base_url = Some(string_value()?),
            "tool_name" => cfg.tool_name = Some(string_value()?),
            "contact_email" => cfg.contact_email = Some(string_value()?),
            "api_key" => cfg.api_key = Some(string_value()?),
            "bind" => cfg.bind = Some(string_value()?),
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "read_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_no}")
                })?;
                cfg.read_timeout_secs = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
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

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
