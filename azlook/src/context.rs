//! Application context that holds resolved configuration
//!
//! The context is built following the precedence order:
//! 1. Default values
//! 2. Config file values
//! 3. Environment variables
//! 4. CLI flags
//!
//! Once built, the context is passed as read-only throughout the application.

use crate::format::{self, ColorChoice, OutputFormat, OutputFormatter};
use libazlook::Config;
use libazlook::config;
use std::path::{Path, PathBuf};

/// How chatty logging should be
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum VerbosityLevel {
    #[default]
    Normal,
    /// `-v`: debug events from azlook crates
    Verbose,
    /// `-vv` and up: trace events
    Trace,
}

impl VerbosityLevel {
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Normal,
            1 => VerbosityLevel::Verbose,
            _ => VerbosityLevel::Trace,
        }
    }
}

/// Resolves the color mode: config, then `NO_COLOR`, then `--color`.
pub fn resolve_color<F>(
    configured: config::ColorChoice,
    cli_color: Option<&str>,
    lookup: &F,
) -> ColorChoice
where
    F: Fn(&str) -> Option<String>,
{
    match cli_color {
        Some(c) => ColorChoice::from(c),
        None if lookup("NO_COLOR").is_some() => ColorChoice::Never,
        None => ColorChoice::from(configured),
    }
}

/// Application context with resolved configuration and runtime state
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    /// Config file in effect, if any
    pub config_path: Option<PathBuf>,
    /// Default output format when a command has no `--format`
    pub format: OutputFormat,
    pub formatter: Box<dyn OutputFormatter>,
}

impl AppContext {
    /// Build context from the process environment.
    pub fn build(cli_color: Option<&str>, config_path: Option<&Path>) -> Result<Self, String> {
        Self::build_with(cli_color, config_path, &|key: &str| {
            std::env::var(key).ok()
        })
    }

    /// Build context with environment values read through `lookup`.
    pub fn build_with<F>(
        cli_color: Option<&str>,
        config_path: Option<&Path>,
        lookup: &F,
    ) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 1 + 2. Defaults overlaid with the config file
        // An explicit --config must exist; the default location is optional.
        let source = match config_path {
            Some(p) => Some(p.to_path_buf()),
            None => Config::default_path_with(lookup).filter(|p| p.exists()),
        };
        let mut config = match source.as_deref() {
            Some(path) => Config::load(Some(path)).map_err(|e| e.to_string())?,
            None => Config::default(),
        };

        // 3. Environment variable overrides
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(endpoint) = env("AZLOOK_REGISTRY_ENDPOINT") {
            config.registry.endpoint = Some(endpoint);
        }
        if let Some(account) = env("AZLOOK_STORAGE_ACCOUNT") {
            config.storage.account = Some(account);
        }
        if let Some(container) = env("AZLOOK_STORAGE_CONTAINER") {
            config.storage.container = Some(container);
        }

        let mut format = OutputFormat::from(config.output.format);
        if let Some(f) = env("AZLOOK_FORMAT") {
            format = OutputFormat::from(f.as_str());
        }

        let color = resolve_color(config.output.color, cli_color, lookup);

        Ok(Self {
            formatter: format::create_formatter(color),
            config_path: source,
            config,
            format,
        })
    }

    /// Resolves a command's `--format` flag against the configured default.
    pub fn output_format(&self, flag: Option<&str>) -> OutputFormat {
        flag.map(OutputFormat::from).unwrap_or(self.format)
    }

    /// Prints an error and exits with status 1.
    pub fn fail(&self, message: &str) -> ! {
        self.formatter.error(message);
        std::process::exit(1);
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
