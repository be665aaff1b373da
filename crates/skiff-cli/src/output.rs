//! Output formatting utilities

use crate::error::{CliError, CliResult};
use colored::*;
use serde::Serialize;
use skiff_publish::{report, PublishError};
use skiff_types::PublishResult;
use tabled::{Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Print rows in the specified format
pub fn print_rows<T: Serialize + Tabled>(rows: Vec<T>, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                println!("{}", Table::new(rows));
            }
            Ok(())
        }
        _ => print_structured(&rows, format),
    }
}

/// Print a serializable value as JSON or YAML
pub fn print_structured<T: Serialize>(data: &T, format: OutputFormat) -> CliResult<()> {
    let rendered = match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(data).map_err(|e| CliError::Output(e.to_string()))?
        }
        OutputFormat::Table | OutputFormat::Json => {
            serde_json::to_string_pretty(data).map_err(|e| CliError::Output(e.to_string()))?
        }
    };
    println!("{}", rendered);
    Ok(())
}

/// Print the outcome of a successful publish
pub fn print_publish_result(result: &PublishResult, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            for line in report::render(result) {
                println!("{}", line);
            }
            Ok(())
        }
        _ => print_structured(result, format),
    }
}

/// Print a failed command with its remediation hint
pub fn print_failure(error: &CliError) {
    print_error(&error.to_string());
    for line in failure_details(error) {
        eprintln!("{}", line);
    }
    if let Some(hint) = error.remediation() {
        eprintln!("{} {}", "→".blue(), hint);
    }
}

/// Lines printed between a failure and its hint
///
/// An activation failure lists every further surface that failed with its
/// own reason, then the targets that stayed live.
fn failure_details(error: &CliError) -> Vec<String> {
    let CliError::Publish(PublishError::Activation(activation)) = error else {
        return Vec::new();
    };

    let mut lines: Vec<String> = activation
        .other_failures
        .iter()
        .map(|(kind, source)| format!("  Also failed to activate {}: {}", kind, source))
        .collect();

    if activation.partial.has_targets() {
        lines.push("  Still activated:".to_string());
        lines.extend(
            activation
                .partial
                .activated_targets
                .iter()
                .map(|target| format!("    {}", target)),
        );
    }
    lines
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    use skiff_publish::ActivationError;
    use skiff_registry::RegistryError;
    use skiff_types::TargetKind;

    #[test]
    fn test_output_format_default() {
        assert!(matches!(OutputFormat::default(), OutputFormat::Table));
    }

    #[test]
    fn test_activation_failure_details() {
        let mut partial = PublishResult::new("api");
        partial.surfaces.push(TargetKind::Subdomain);
        partial
            .activated_targets
            .push("https://api.team.workers.dev".into());

        let error = CliError::Publish(
            ActivationError {
                failed: TargetKind::Routes,
                source: RegistryError::Rejected("zone not found".into()),
                other_failures: vec![(
                    TargetKind::Schedules,
                    RegistryError::Rejected("invalid cron".into()),
                )],
                partial: Box::new(partial),
            }
            .into(),
        );

        assert!(error.to_string().contains("zone not found"));
        assert_eq!(
            failure_details(&error),
            vec![
                "  Also failed to activate schedules: Registry rejected request: invalid cron",
                "  Still activated:",
                "    https://api.team.workers.dev",
            ]
        );
    }

    #[test]
    fn test_other_failures_have_no_details() {
        assert!(failure_details(&CliError::MissingToken).is_empty());
    }
}
