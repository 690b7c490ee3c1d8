//! Shell configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShellError};

/// How the interactive shell prints invocation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text, one block per command.
    #[default]
    Text,
    /// One JSON object per command.
    Json,
}

/// An installed application known to the desktop platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppEntry {
    /// Reverse-DNS package name (e.g. `org.example.notes`).
    pub package: String,
    /// Human-readable label shown in listings.
    pub label: String,
    /// Whether this is a preinstalled system app.
    #[serde(default)]
    pub system: bool,
}

/// A notification posted when the shell starts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NotificationEntry {
    /// Package the notification is attributed to.
    pub app: String,
    pub title: String,
    #[serde(default)]
    pub text: String,
}

/// Top-level shell configuration (`deskshell.toml`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShellConfig {
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_hostname")]
    pub hostname: String,
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default)]
    pub output: OutputFormat,
    /// Timeout for a single connectivity probe, in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Built-in commands that are not registered at startup.
    #[serde(default)]
    pub disabled_commands: Vec<String>,
    #[serde(default)]
    pub apps: Vec<AppEntry>,
    /// Posted in order at startup, so the last entry is the newest.
    #[serde(default)]
    pub notifications: Vec<NotificationEntry>,
}

fn default_user() -> String {
    "user".to_string()
}
fn default_hostname() -> String {
    "deskshell".to_string()
}
fn default_prompt() -> String {
    "$ ".to_string()
}
fn default_probe_timeout_ms() -> u64 {
    1500
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
            hostname: default_hostname(),
            prompt: default_prompt(),
            output: OutputFormat::default(),
            probe_timeout_ms: default_probe_timeout_ms(),
            disabled_commands: Vec::new(),
            apps: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

impl ShellConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: ShellConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        log::debug!(
            "Loaded config from {} ({} apps, {} disabled commands)",
            path.display(),
            config.apps.len(),
            config.disabled_commands.len()
        );
        Ok(config)
    }

    /// Whether a built-in command has been disabled by configuration.
    pub fn is_disabled(&self, command: &str) -> bool {
        self.disabled_commands.iter().any(|c| c == command)
    }

    fn validate(&self) -> Result<()> {
        if self.probe_timeout_ms == 0 {
            return Err(ShellError::Config(
                "probe_timeout_ms must be greater than zero".to_string(),
            ));
        }
        for app in &self.apps {
            if app.package.trim().is_empty() {
                return Err(ShellError::Config(format!(
                    "app '{}' has an empty package name",
                    app.label
                )));
            }
        }
        Ok(())
    }
}
