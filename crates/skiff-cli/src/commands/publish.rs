//! Publish command

use crate::client;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{self, print_warning, OutputFormat};
use crate::project::{self, ProjectConfig};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use skiff_publish::{
    NoopAssetSync, PassthroughBundler, PublishManager, PublishOptions, PublishOverrides,
};
use skiff_types::{ArtifactFormat, SubdomainPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Arguments of `skiff publish`
#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Entry point of the worker (overrides `main`)
    pub script: Option<PathBuf>,

    /// Path to skiff.toml (searched upward from the working directory by default)
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// Environment to publish
    #[arg(short, long)]
    pub env: Option<String>,

    /// Script name (overrides `name`)
    #[arg(long)]
    pub name: Option<String>,

    /// Artifact format: modules or service-worker
    #[arg(long)]
    pub format: Option<ArtifactFormat>,

    /// Compatibility date, e.g. 2022-03-01
    #[arg(long)]
    pub compatibility_date: Option<String>,

    /// Compatibility flags, comma separated
    #[arg(long, value_delimiter = ',')]
    pub compatibility_flags: Option<Vec<String>>,

    /// Route patterns (replace the configured routes)
    #[arg(long, num_args = 1..)]
    pub routes: Option<Vec<String>>,

    /// Cron schedules (replace the configured triggers)
    #[arg(long, num_args = 1..)]
    pub triggers: Option<Vec<String>>,

    /// Directory of public assets served by the worker
    #[arg(long)]
    pub public: Option<PathBuf>,

    /// Do not serve the script on the account subdomain
    #[arg(long)]
    pub no_workers_dev: bool,

    /// Account to publish to
    #[arg(long, env = "SKIFF_ACCOUNT_ID")]
    pub account_id: Option<String>,

    /// API token
    #[arg(long, env = "SKIFF_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Pause after enabling the subdomain, in milliseconds
    #[arg(long, default_value_t = 3000, hide = true)]
    pub settle_delay_ms: u64,
}

impl PublishArgs {
    fn overrides(&self) -> PublishOverrides {
        PublishOverrides {
            name: self.name.clone(),
            entry: self.script.clone(),
            format: self.format,
            compatibility_date: self.compatibility_date.clone(),
            compatibility_flags: self.compatibility_flags.clone(),
            routes: self.routes.clone(),
            crons: self.triggers.clone(),
            public_dir: self.public.clone(),
            workers_dev: self.no_workers_dev.then_some(SubdomainPolicy::Disable),
        }
    }
}

/// Execute `skiff publish`
pub async fn execute(
    args: PublishArgs,
    endpoint: &str,
    cli_config: &CliConfig,
    format: OutputFormat,
) -> CliResult<()> {
    let project_path = match &args.project {
        Some(path) => path.clone(),
        None => {
            let cwd = std::env::current_dir()?;
            project::find(&cwd).ok_or(CliError::ProjectNotFound(cwd))?
        }
    };
    info!(project = %project_path.display(), "Loading project");

    let project = ProjectConfig::load(&project_path)?;
    let mut config = project.resolve(args.env.as_deref())?;
    if let Some(account) = &args.account_id {
        config.account_id = Some(account.clone());
    } else if config.account_id.is_none() {
        config.account_id = cli_config.account_id.clone();
    }

    let registry = client::connect(endpoint, args.api_token.as_deref(), cli_config)?;
    let manager = PublishManager::new(
        registry,
        Arc::new(PassthroughBundler::new()),
        Arc::new(NoopAssetSync),
    )
    .with_options(PublishOptions {
        settle_delay: Duration::from_millis(args.settle_delay_ms),
        overrides: args.overrides(),
        ..Default::default()
    });

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Publishing...");

    let outcome = manager.publish(&config).await;
    pb.finish_and_clear();

    let result = outcome?;
    output::print_publish_result(&result, format)?;
    if !result.has_targets() {
        print_warning("The script is uploaded but no route, schedule or subdomain serves it");
    }
    Ok(())
}
