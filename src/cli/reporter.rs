// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use super::runner::{CheckReport, RenderReport};
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Print zone definitions, one per line
    pub fn report_definitions(file: &str, definitions: &[(String, String)]) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Document:".bold(), file.cyan());
        println!("{}", "━".repeat(80).bright_black());
        for (name, expression) in definitions {
            let expression = if expression.is_empty() {
                "(empty)".bright_black()
            } else {
                expression.normal()
            };
            println!("  {} {}", format!("{}:", name).bold(), expression);
        }
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report check results; returns whether every zone passed
    pub fn report_check(file: &str, reports: &[CheckReport]) -> bool {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Checked:".bold(), file.cyan());
        println!("{}", "━".repeat(80).bright_black());

        for report in reports {
            if report.passed() {
                println!("{} {}", "✅".green(), report.zone.green().bold());
            } else {
                println!("{} {}", "❌".red(), report.zone.red().bold());
                for issue in &report.issues {
                    println!("     {}", issue.bright_black());
                }
            }
        }

        let failed = reports.iter().filter(|r| !r.passed()).count();
        println!(
            "\n  {} {}   {} {}",
            "Passed:".bright_black(),
            (reports.len() - failed).to_string().green(),
            "Failed:".bright_black(),
            if failed > 0 {
                failed.to_string().red()
            } else {
                failed.to_string().green()
            }
        );
        println!("{}", "━".repeat(80).bright_black());
        failed == 0
    }

    /// Report mesh statistics per zone
    pub fn report_render(file: &str, reports: &[RenderReport]) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Rendered:".bold(), file.cyan());
        println!("{}", "━".repeat(80).bright_black());
        for report in reports {
            println!("  {}", report.zone.bold());
            println!(
                "    {} {}",
                "Vertices:".bright_black(),
                report.vertices.to_string().cyan()
            );
            println!(
                "    {} {}",
                "Triangles:".bright_black(),
                report.triangles.to_string().cyan()
            );
            println!(
                "    {} {}",
                "Volume:".bright_black(),
                format!("{:.4}", report.volume).cyan()
            );
            println!(
                "    {} {}",
                "Time:".bright_black(),
                Self::format_duration(report.duration).yellow()
            );
        }
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(
            Reporter::format_duration(Duration::from_micros(500)),
            "500µs"
        );
        assert_eq!(
            Reporter::format_duration(Duration::from_millis(5)),
            "5.00ms"
        );
        assert_eq!(Reporter::format_duration(Duration::from_secs(2)), "2.00s");
    }

    #[test]
    fn test_check_summary() {
        let reports = vec![
            CheckReport {
                zone: "a".into(),
                issues: vec![],
            },
            CheckReport {
                zone: "b".into(),
                issues: vec!["bad head".into()],
            },
        ];
        assert!(!Reporter::report_check("doc.json", &reports));
        assert!(Reporter::report_check("doc.json", &reports[..1]));
    }
}
