use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

use crate::domain::AgeUnit;
use crate::report::{ImageAction, RepositoryStatus, RunReport};

/// Write the run report in pretty JSON format.
pub fn write_report_json(path: &Path, report: &RunReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("serialize run report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render a human-readable summary for terminal output.
pub fn render_summary_text(report: &RunReport, unit: AgeUnit) -> String {
    let mut out = String::new();
    let mode = if report.dry_run { "dry-run" } else { "live" };
    let _ = writeln!(
        out,
        "Retention run {} ({}, region {})",
        report.run_id, mode, report.region
    );

    if report.repositories.is_empty() {
        out.push_str("No repositories found.\n");
    }

    for repo in &report.repositories {
        match &repo.status {
            RepositoryStatus::Processed => {
                let _ = writeln!(out, "\n{}", repo.name);
            }
            RepositoryStatus::NoImages => {
                let _ = writeln!(out, "\n{} (no images)", repo.name);
            }
            RepositoryStatus::ListFailed { error } => {
                let _ = writeln!(out, "\n{} (listing failed: {})", repo.name, error);
            }
        }
        for image in &repo.images {
            let tags = if image.tags.is_empty() {
                "<untagged>".to_string()
            } else {
                image.tags.join(",")
            };
            let _ = write!(
                out,
                "  {}  [{}]  age {}  {}  -> {}",
                image.digest.short(),
                tags,
                unit.format(image.age),
                image.verdict,
                image.action.label()
            );
            if let ImageAction::DeleteFailed { error } = &image.action {
                let _ = write!(out, ": {}", error);
            }
            out.push('\n');
        }
        if repo.skipped_without_push_time > 0 {
            let _ = writeln!(
                out,
                "  ({} image(s) without push time not evaluated)",
                repo.skipped_without_push_time
            );
        }
    }

    let t = &report.totals;
    let _ = writeln!(
        out,
        "\nrepositories: {} (failed {}, empty {})\nimages: {} evaluated, {} kept, {} delete candidates\nactions: {} deleted, {} skipped (dry-run), {} failed",
        t.repositories,
        t.repositories_failed,
        t.repositories_empty,
        t.images_evaluated,
        t.kept,
        t.delete_candidates,
        t.deleted,
        t.skipped_dry_run,
        t.delete_failed
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{KeepReason, PolicyConfig, RetentionPeriod, Verdict};
    use crate::report::{ImageOutcome, ReportBuilder, RepositoryOutcome};
    use chrono::{DateTime, Duration, Utc};
    use registry_gateway::ImageDigest;

    fn sample_report() -> RunReport {
        let policy =
            PolicyConfig::new("us-east-1", RetentionPeriod::days(10), vec![], true).unwrap();
        let at = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .expect("parse RFC3339")
            .with_timezone(&Utc);
        let mut builder = ReportBuilder::new(&policy, at);
        let mut web = RepositoryOutcome::processed("web");
        web.images.push(ImageOutcome {
            repository: "web".into(),
            digest: ImageDigest::from_bytes(b"tmp"),
            tags: vec!["tmp".into()],
            age: Duration::days(30),
            verdict: Verdict::DeleteExpired {
                age: Duration::days(30),
            },
            action: ImageAction::SkippedDryRun,
        });
        web.images.push(ImageOutcome {
            repository: "web".into(),
            digest: ImageDigest::from_bytes(b"prod"),
            tags: vec!["prod-v1".into()],
            age: Duration::days(2),
            verdict: Verdict::Keep(KeepReason::NotYetExpired),
            action: ImageAction::Retained,
        });
        builder.push(web);
        builder.push(RepositoryOutcome::list_failed("api", "AccessDenied"));
        builder.finish(at)
    }

    #[test]
    fn report_json_has_expected_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report_json(&path, &sample_report()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["region"], "us-east-1");
        assert_eq!(value["dry_run"], true);
        assert_eq!(value["totals"]["skipped_dry_run"], 1);
        assert_eq!(value["repositories"][0]["images"][0]["age_secs"], 30 * 86_400);
        assert_eq!(value["repositories"][1]["status"]["status"], "list_failed");
    }

    #[test]
    fn report_write_failure_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let err = write_report_json(&path, &sample_report()).unwrap_err();
        assert!(format!("{err:#}").contains("report.json"));
    }

    #[test]
    fn report_json_round_trips() {
        let report = sample_report();
        let json = serde_json::to_string(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn summary_mentions_every_decision() {
        let text = render_summary_text(&sample_report(), AgeUnit::Days);
        assert!(text.contains("dry-run"));
        assert!(text.contains("[tmp]"));
        assert!(text.contains("age 30 days"));
        assert!(text.contains("skipped-dry-run"));
        assert!(text.contains("keep (not yet expired)"));
        assert!(text.contains("api (listing failed: AccessDenied)"));
        assert!(text.contains("1 skipped (dry-run)"));
    }

    #[test]
    fn summary_for_empty_run() {
        let policy =
            PolicyConfig::new("us-east-1", RetentionPeriod::days(10), vec![], false).unwrap();
        let report = ReportBuilder::new(&policy, Utc::now()).finish(Utc::now());
        let text = render_summary_text(&report, AgeUnit::Days);
        assert!(text.contains("No repositories found."));
        assert!(text.contains("live"));
    }
}
