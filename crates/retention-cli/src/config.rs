//! Resolution of run parameters from flags, environment and prompts.

use anyhow::Result;
use clap::Args;
use std::io::{BufRead, Write};

use retention_core::{
    parse_prefix_list, parse_retention, AgeUnit, ConfigError, PolicyConfig, RetentionPeriod,
};

use crate::prompt::{parse_dry_run_answer, Prompter};

/// Policy parameters. Anything left unset is asked for interactively
/// unless prompting is disabled.
#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// AWS region to clean up (e.g. us-east-1)
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Maximum image age, counted in --unit
    #[arg(long, env = "ECR_RETENTION")]
    pub retention: Option<String>,

    /// Unit for --retention: minutes or days
    #[arg(long, env = "ECR_RETENTION_UNIT", default_value = "days")]
    pub unit: AgeUnit,

    /// Comma-separated tag prefixes that protect an image (empty segments match every tag)
    #[arg(long, env = "ECR_KEEP_PREFIXES")]
    pub keep_prefixes: Option<String>,

    /// Report deletions without performing them
    #[arg(
        long,
        env = "ECR_DRY_RUN",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub dry_run: Option<bool>,

    /// Fail instead of prompting for missing parameters
    #[arg(long)]
    pub no_prompt: bool,
}

impl PolicyArgs {
    /// Build a validated policy, prompting through `prompter` for any
    /// missing value. With no prompter a missing value is a config error.
    pub fn resolve<R: BufRead, W: Write>(
        self,
        mut prompter: Option<&mut Prompter<R, W>>,
    ) -> Result<PolicyConfig> {
        let region = match self.region {
            Some(region) => region,
            None => ask(
                &mut prompter,
                "region",
                "Enter AWS region (e.g., us-east-1):",
            )?,
        };

        let retention = match self.retention {
            Some(retention) => retention,
            None => ask(
                &mut prompter,
                "retention",
                &format!("Enter retention period in {} (e.g., 5):", self.unit),
            )?,
        };
        let amount = parse_retention(&retention)?;

        let keep_prefixes = match self.keep_prefixes {
            Some(list) => parse_prefix_list(&list),
            None => parse_prefix_list(&ask(
                &mut prompter,
                "keep-prefixes",
                "Enter comma-separated tag prefixes to keep (e.g., latest,dev,main):",
            )?),
        };

        let dry_run = match self.dry_run {
            Some(dry_run) => dry_run,
            None => parse_dry_run_answer(&ask(
                &mut prompter,
                "dry-run",
                "Dry-run mode? (yes/no):",
            )?),
        };

        Ok(PolicyConfig::new(
            region,
            RetentionPeriod::new(amount, self.unit),
            keep_prefixes,
            dry_run,
        )?)
    }
}

fn ask<R: BufRead, W: Write>(
    prompter: &mut Option<&mut Prompter<R, W>>,
    name: &'static str,
    question: &str,
) -> Result<String> {
    match prompter {
        Some(prompter) => prompter.ask(question),
        None => Err(ConfigError::Missing(name).into()),
    }
}
