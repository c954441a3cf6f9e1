//! Output formatting module for junos-provider
//!
//! Provides colored human output and one JSON document per command.

use colored::Colorize;
use serde_json::Value;
use std::time::Instant;

use junos_provider::diagnostics::{Diagnostic, Severity};

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// JSON output mode
    json_mode: bool,
    /// Start time for duration calculations
    start_time: Instant,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();
        if !use_color {
            colored::control::set_override(false);
        }

        Self {
            use_color,
            json_mode,
            start_time: Instant::now(),
        }
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    pub fn is_json(&self) -> bool {
        self.json_mode
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print configuration lines, `delete` lines in red and `set` lines in green
    pub fn lines(&self, lines: &[String]) {
        if self.json_mode {
            return;
        }

        for line in lines {
            if !self.use_color {
                println!("{}", line);
            } else if line.starts_with("delete ") {
                println!("{}", line.red());
            } else {
                println!("{}", line.green());
            }
        }
    }

    /// Print a value as YAML
    pub fn document(&self, value: &Value) {
        if self.json_mode {
            return;
        }

        match serde_yaml::to_string(value) {
            Ok(text) => print!("{}", text),
            Err(e) => self.error(&format!("Failed to render state: {}", e)),
        }
    }

    /// Print diagnostics, errors to stderr
    pub fn diagnostics<'a>(&self, diagnostics: impl IntoIterator<Item = &'a Diagnostic>) {
        if self.json_mode {
            return;
        }

        for diagnostic in diagnostics {
            match diagnostic.severity {
                Severity::Error => self.error(&without_severity(diagnostic)),
                Severity::Warning => self.warning(&without_severity(diagnostic)),
            }
        }
    }

    /// Print the JSON document of a command
    pub fn json(&self, value: &Value) {
        if !self.json_mode {
            return;
        }

        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("{{\"type\": \"error\", \"message\": \"{}\"}}", e),
        }
    }

    /// Print a success line with the elapsed time
    pub fn done(&self, message: &str) {
        if self.json_mode {
            return;
        }

        let elapsed = format!("({:.2}s)", self.start_time.elapsed().as_secs_f64());
        if self.use_color {
            println!("{} {}", message.green().bold(), elapsed.bright_black());
        } else {
            println!("{} {}", message, elapsed);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.json_mode {
            let err = serde_json::json!({
                "type": "error",
                "message": message
            });
            eprintln!("{}", err);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.json_mode {
            let warn = serde_json::json!({
                "type": "warning",
                "message": message
            });
            eprintln!("{}", warn);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }
}

/// Diagnostic text without its leading severity
fn without_severity(diagnostic: &Diagnostic) -> String {
    let text = diagnostic.to_string();
    let prefix = format!("{}: ", diagnostic.severity);
    text.strip_prefix(&prefix).map(str::to_string).unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use junos_provider::diagnostics::AttributePath;

    #[test]
    fn test_without_severity() {
        let diagnostic =
            Diagnostic::error("block is empty").with_path(AttributePath::root("graceful_restart"));
        assert_eq!(
            without_severity(&diagnostic),
            "graceful_restart: block is empty"
        );
    }
}
