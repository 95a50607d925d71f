use crate::context::AppContext;
use crate::format::{self, Formattable, OutputFormat};
use libazlook::Config;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Placeholder shown instead of secrets.
pub(crate) const REDACTED: &str = "<set>";

/// Resolved configuration with secrets masked, for display
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ConfigView(Config);

impl ConfigView {
    pub fn redacted(config: &Config) -> Self {
        let mut config = config.clone();
        if config.storage.sas_token.is_some() {
            config.storage.sas_token = Some(REDACTED.to_string());
        }
        Self(config)
    }
}

impl Formattable for ConfigView {
    // Same shape as the config file
    fn format_pretty(&self) -> String {
        serde_yaml::to_string(&self.0)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default()
    }
}

/// Where `config init` writes and `config path` points.
pub(crate) fn target_path(ctx: &AppContext) -> Result<PathBuf, String> {
    ctx.config_path
        .clone()
        .or_else(Config::default_path)
        .ok_or_else(|| "Could not determine a config directory".to_string())
}

/// Writes a default config file, refusing to overwrite an existing one.
pub(crate) fn init_config(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Err(format!("Config file already exists: {}", path.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
    }
    let yaml = serde_yaml::to_string(&Config::default())
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, yaml).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

/// Handle the config init subcommand
pub fn handle_init(ctx: &AppContext) {
    let path = match target_path(ctx) {
        Ok(p) => p,
        Err(e) => ctx.fail(&e),
    };
    match init_config(&path) {
        Ok(()) => ctx
            .formatter
            .success(&format!("Initialized config file at: {}", path.display())),
        Err(e) => ctx.fail(&e),
    }
}

/// Handle the config show subcommand
pub fn handle_show(ctx: &AppContext, format: OutputFormat) {
    match format::format_output(&ConfigView::redacted(&ctx.config), format) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => ctx.fail(&format!("formatting output: {}", e)),
    }
}

/// Handle the config path subcommand
pub fn handle_path(ctx: &AppContext) {
    match target_path(ctx) {
        Ok(p) => println!("{}", p.display()),
        Err(e) => ctx.fail(&e),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
