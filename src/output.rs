//! # Output Configuration
//!
//! Controls how the command line renders results: whether colors and emoji
//! are used, and how per-node outcomes look.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use repotree::output::{OutputConfig, emoji};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! println!("{} Cloning...", emoji(&config, "📥", "[CLONE]"));
//! ```

use std::env;

use console::style;

use crate::executor::{BatchReport, Outcome, OperationResult};

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: "always", "never" or "auto".
    /// In auto mode colors are disabled when `NO_COLOR` is set, `CLICOLOR=0`,
    /// `TERM=dumb`, or stdout is not a TTY (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain alternative otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Marker printed in front of a node's outcome line.
pub fn outcome_marker(config: &OutputConfig, outcome: Outcome) -> String {
    let (marker, plain) = match outcome {
        Outcome::Success => ("✅", "[OK]"),
        Outcome::Skipped => ("⏭️ ", "[SKIP]"),
        Outcome::Failed => ("❌", "[FAIL]"),
    };
    emoji(config, marker, plain).to_string()
}

/// One line per node: marker, virtual path, detail.
pub fn format_result(config: &OutputConfig, result: &OperationResult) -> String {
    let marker = outcome_marker(config, result.outcome);
    if !config.use_color {
        return format!("{} {}: {}", marker, result.path, result.detail);
    }
    let detail = match result.outcome {
        Outcome::Success => style(result.detail.as_str()).green(),
        Outcome::Skipped => style(result.detail.as_str()).dim(),
        Outcome::Failed => style(result.detail.as_str()).red(),
    };
    format!("{} {}: {}", marker, style(result.path.as_str()).bold(), detail)
}

/// Closing line of a batch: counts per outcome.
pub fn format_summary(config: &OutputConfig, report: &BatchReport) -> String {
    let summary = format!(
        "{}: {} succeeded, {} skipped, {} failed",
        report.operation(),
        report.count(Outcome::Success),
        report.count(Outcome::Skipped),
        report.count(Outcome::Failed)
    );
    if !config.use_color {
        return summary;
    }
    if report.has_failures() {
        style(summary).red().bold().to_string()
    } else {
        style(summary).bold().to_string()
    }
}

/// Prints every result of a batch followed by its summary.
pub fn print_report(config: &OutputConfig, report: &BatchReport) {
    for result in report.results() {
        println!("{}", format_result(config, result));
    }
    println!();
    println!("{}", format_summary(config, report));
}
