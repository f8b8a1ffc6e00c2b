//! Console implementation of [`Reporter`].
//!
//! Progress goes to stdout and is silenced by `--quiet`; warnings and errors
//! always go to stderr.

use super::theme::Theme;
use crossterm::style::{Stylize, style};
use redist_core::Reporter;
use std::path::Path;

/// Styled console output for commands.
#[derive(Debug, Clone, Default)]
pub struct Output {
    theme: Theme,
    quiet: bool,
}

impl Output {
    /// Create an output handle; `quiet` hides everything but warnings and errors.
    pub fn new(quiet: bool) -> Self {
        Self {
            theme: Theme::default(),
            quiet,
        }
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        println!();
        println!(
            "{} {}",
            title,
            style("─".repeat(self.theme.rule_width)).with(self.theme.colors.secondary)
        );
    }

    fn updated(&self, from: &Path, to: &Path) {
        if self.quiet {
            return;
        }
        let name = to
            .file_name()
            .map_or_else(|| to.display().to_string(), |n| n.to_string_lossy().into_owned());
        println!(
            "  {} {} {}",
            style(self.theme.icons.updated).with(self.theme.colors.success),
            style(name).with(self.theme.colors.file_name),
            style(format!("from {}", from.display())).with(self.theme.colors.secondary)
        );
    }

    fn unchanged(&self, name: &str) {
        if self.quiet {
            return;
        }
        println!(
            "  {} {}",
            style(self.theme.icons.unchanged).with(self.theme.colors.secondary),
            style(name).with(self.theme.colors.secondary)
        );
    }

    fn info(&self, msg: &str) {
        if self.quiet {
            return;
        }
        println!("  {} {}", self.theme.icons.info, msg);
    }

    fn success(&self, msg: &str) {
        if self.quiet {
            return;
        }
        println!(
            "{} {}",
            style(self.theme.icons.success).with(self.theme.colors.success),
            style(msg).with(self.theme.colors.success)
        );
    }

    fn warning(&self, msg: &str) {
        eprintln!(
            "{} {}",
            style(self.theme.icons.warning).with(self.theme.colors.warning),
            style(msg).with(self.theme.colors.warning)
        );
    }

    fn error(&self, msg: &str) {
        eprintln!(
            "{} {}",
            style(self.theme.icons.error).with(self.theme.colors.error),
            style(msg).with(self.theme.colors.error).bold()
        );
    }

    fn summary(&self, count: usize, action: &str) {
        self.success(&summary_message(count, action));
    }
}

fn summary_message(count: usize, action: &str) -> String {
    format!(
        "{} file{} {}",
        count,
        if count == 1 { "" } else { "s" },
        action
    )
}
