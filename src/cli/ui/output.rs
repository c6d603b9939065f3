use console::style;

use crate::build::{BuildReport, DirectoryOutcome, DocumentAction};

/// Styled status lines for the terminal
pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    /// Suppress everything except errors and dry-run documents
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✓").green(), message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    pub fn header(&self, message: &str) {
        if !self.quiet {
            println!("\n{}", style(message).bold().underlined());
        }
    }

    pub fn section(&self, message: &str) {
        if !self.quiet {
            println!("\n{}", style(message).bold());
            println!("{}", "─".repeat(40));
        }
    }

    /// Print the exact text a dry run would have written
    pub fn document(&self, outcome: &DirectoryOutcome) {
        println!(
            "\n{} {}",
            style(format!("[would {}]", outcome.action)).cyan().bold(),
            style(outcome.document.display()).bold()
        );
        println!("{}", "─".repeat(40));
        print!("{}", outcome.text);
    }

    /// Per-directory results followed by a summary
    pub fn report(&self, report: &BuildReport) {
        if report.dry_run {
            for outcome in &report.outcomes {
                self.document(outcome);
            }
        } else {
            self.section("Documents");
            for outcome in &report.outcomes {
                self.success(&format!(
                    "{:<7} {}",
                    outcome.action.to_string(),
                    outcome.path.display()
                ));
                if let Some(backup) = &outcome.backup {
                    self.info(&format!("  backup: {}", backup.display()));
                }
                if outcome.conflicts > 0 {
                    self.warning(&format!(
                        "  {} differing description(s) kept side by side",
                        outcome.conflicts
                    ));
                }
            }
        }

        if report.has_failures() {
            self.section("Failures");
            for failure in &report.failures {
                self.error(&format!(
                    "{} [{}]: {}",
                    failure.path.display(),
                    failure.stage,
                    failure.message
                ));
            }
        }

        let verb = if report.dry_run { "Previewed" } else { "Documented" };
        let summary = format!(
            "{} {} directories ({} created, {} updated, {} appended), {} failed in {:.1}s",
            verb,
            report.outcomes.len(),
            report.count(DocumentAction::Created),
            report.count(DocumentAction::Updated),
            report.count(DocumentAction::Appended),
            report.failures.len(),
            report.duration.as_secs_f32()
        );
        if report.has_failures() {
            self.warning(&summary);
        } else {
            self.success(&summary);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
