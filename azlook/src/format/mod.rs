use indicatif::{ProgressBar, ProgressStyle};
use libazlook::config;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt;
use std::io::IsTerminal;
use std::time::Duration;

/// Trait for output formatting that can be TTY-aware or plain text
pub trait OutputFormatter: Send + Sync {
    /// Print a success message
    fn success(&self, message: &str);

    /// Print an error message
    fn error(&self, message: &str);

    /// Print a warning message
    fn warning(&self, message: &str);

    /// Create a spinner for indeterminate progress
    fn spinner(&self, message: &str) -> ProgressBar;
}

/// TTY-aware formatter with colors and a spinner
pub struct TtyFormatter;

impl OutputFormatter for TtyFormatter {
    fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message);
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message);
    }

    fn warning(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow().bold(), message);
    }

    fn spinner(&self, message: &str) -> ProgressBar {
        // Draws to stderr so piped stdout stays clean.
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }
}

/// Plain text formatter for non-TTY output (piped, scripted)
pub struct PlainFormatter;

impl OutputFormatter for PlainFormatter {
    fn success(&self, message: &str) {
        println!("✓ {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    fn warning(&self, message: &str) {
        eprintln!("⚠ {}", message);
    }

    fn spinner(&self, _message: &str) -> ProgressBar {
        ProgressBar::hidden()
    }
}

/// Picks the formatter for a color choice.
///
/// `Auto` colors only when stderr is a terminal, which is where the spinner
/// and error marks go.
pub fn create_formatter(color: ColorChoice) -> Box<dyn OutputFormatter> {
    match color {
        ColorChoice::Always => Box::new(TtyFormatter),
        ColorChoice::Never => Box::new(PlainFormatter),
        ColorChoice::Auto => {
            if std::io::stderr().is_terminal() {
                Box::new(TtyFormatter)
            } else {
                Box::new(PlainFormatter)
            }
        }
    }
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable pretty format
    Pretty,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "yaml" | "yml" => OutputFormat::Yaml,
            _ => OutputFormat::Pretty,
        }
    }
}

impl From<config::OutputFormat> for OutputFormat {
    fn from(f: config::OutputFormat) -> Self {
        match f {
            config::OutputFormat::Pretty => OutputFormat::Pretty,
            config::OutputFormat::Json => OutputFormat::Json,
            config::OutputFormat::Yaml => OutputFormat::Yaml,
        }
    }
}

/// Color mode for terminal output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl From<&str> for ColorChoice {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "always" => ColorChoice::Always,
            "never" => ColorChoice::Never,
            _ => ColorChoice::Auto,
        }
    }
}

impl From<config::ColorChoice> for ColorChoice {
    fn from(c: config::ColorChoice) -> Self {
        match c {
            config::ColorChoice::Auto => ColorChoice::Auto,
            config::ColorChoice::Always => ColorChoice::Always,
            config::ColorChoice::Never => ColorChoice::Never,
        }
    }
}

impl fmt::Display for ColorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorChoice::Auto => "auto",
            ColorChoice::Always => "always",
            ColorChoice::Never => "never",
        })
    }
}

/// Trait for types that can be formatted for CLI output
pub trait Formattable: Serialize {
    /// Format the type for pretty (human-readable) output
    fn format_pretty(&self) -> String;
}

/// Format a single item for output
pub fn format_output<T: Formattable>(item: &T, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Pretty => Ok(item.format_pretty()),
        OutputFormat::Json => serde_json::to_string_pretty(item)
            .map_err(|e| format!("Failed to serialize to JSON: {}", e)),
        OutputFormat::Yaml => serde_yaml::to_string(item)
            .map(|s| s.trim_end().to_string())
            .map_err(|e| format!("Failed to serialize to YAML: {}", e)),
    }
}
