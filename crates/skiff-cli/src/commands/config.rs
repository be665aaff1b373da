//! Config command

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{self, OutputFormat};
use serde::Serialize;
use tabled::Tabled;

/// Table row for one setting
#[derive(Debug, Serialize, Tabled)]
struct SettingRow {
    setting: String,
    value: String,
}

fn row(setting: &str, value: Option<&str>) -> SettingRow {
    SettingRow {
        setting: setting.to_string(),
        value: value.unwrap_or("-").to_string(),
    }
}

/// Execute `skiff config`
pub fn execute(
    endpoint: &str,
    config_path: Option<&str>,
    config: &CliConfig,
    format: OutputFormat,
) -> CliResult<()> {
    let redacted = config.redacted();
    let path = config_path
        .map(str::to_string)
        .or_else(|| CliConfig::default_path().map(|p| p.display().to_string()));

    match format {
        OutputFormat::Table => output::print_rows(
            vec![
                row("config file", path.as_deref()),
                row("endpoint", Some(endpoint)),
                row("account", redacted.account_id.as_deref()),
                row("api token", redacted.api_token.as_deref()),
            ],
            format,
        ),
        _ => output::print_structured(&redacted, format),
    }
}
