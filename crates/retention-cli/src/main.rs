//! ECR Retention - image cleanup CLI
//!
//! The `ecr-retention` command walks every ECR repository in a region and
//! deletes images that are untagged or older than the retention period,
//! unless one of their tags starts with a protected prefix.
//!
//! Parameters come from flags, then environment variables (a `.env` file is
//! loaded first), then interactive prompts.

mod config;
mod prompt;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use retention_core::{
    render_summary_text, write_report_json, CleanupRunner, EcrGateway, PolicyConfig,
    RegistryGateway, RetentionError, RunReport,
};

use crate::config::PolicyArgs;
use crate::prompt::Prompter;

#[derive(Parser)]
#[command(name = "ecr-retention")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Delete expired and untagged ECR images", long_about = None)]
struct Cli {
    #[command(flatten)]
    policy: PolicyArgs,

    /// Append log lines to this file as well as stderr
    #[arg(long, env = "ECR_LOG_FILE", default_value = "ecr-cleanup.log")]
    log_file: PathBuf,

    /// Write the run report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Exit non-zero when any repository listing or image deletion failed
    #[arg(long)]
    fail_on_errors: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    retention_core::init_tracing(cli.json, level, Some(&cli.log_file))
        .with_context(|| format!("Failed to open log file {:?}", cli.log_file))?;
    info!(version = env!("CARGO_PKG_VERSION"), "ecr-retention starting");

    let policy = resolve_policy(cli.policy)?;

    let gateway = EcrGateway::connect(policy.region())
        .await
        .map_err(RetentionError::RegistryUnavailable)
        .context("Failed to connect to ECR")?;

    let report = cmd_cleanup(&gateway, policy, cli.report.as_deref()).await?;

    if cli.fail_on_errors && report.has_failures() {
        bail!(
            "{} repositories failed to list and {} deletions failed",
            report.totals.repositories_failed,
            report.totals.delete_failed
        );
    }
    Ok(())
}

fn resolve_policy(args: PolicyArgs) -> Result<PolicyConfig> {
    let stdin = io::stdin();
    if args.no_prompt || !stdin.is_terminal() {
        return args.resolve::<io::StdinLock<'static>, io::Stdout>(None);
    }
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    args.resolve(Some(&mut prompter))
}

async fn cmd_cleanup(
    gateway: &dyn RegistryGateway,
    policy: PolicyConfig,
    report_path: Option<&Path>,
) -> Result<RunReport> {
    let unit = policy.age_unit();
    let report = CleanupRunner::new(policy)
        .run(gateway)
        .await
        .context("Cleanup run aborted")?;

    print!("{}", render_summary_text(&report, unit));

    if let Some(path) = report_path {
        write_report_json(path, &report)?;
        info!(path = %path.display(), "report written");
    }
    Ok(report)
}
