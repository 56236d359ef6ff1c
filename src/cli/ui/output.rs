use console::style;

use crate::codebase::FileStatus;

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    pub fn field(&self, key: &str, value: impl std::fmt::Display) {
        println!("  {:<12} {}", style(key).dim(), value);
    }

    /// One line of a filter preview
    pub fn file_status(&self, path: &str, status: FileStatus) {
        match status {
            FileStatus::Included => println!("  {} {}", style("+").green(), path),
            FileStatus::Excluded => println!("  {} {}", style("-").red(), style(path).dim()),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
