//! Console rendering and JSON export of a comparison report.
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use groomwatch_classifiers::evaluation::{ComparisonReport, DetectorRole};

use crate::util::write_bytes_to_file;

fn role_label(role: DetectorRole) -> &'static str {
    match role {
        DetectorRole::Primary => "primary",
        DetectorRole::Baseline => "baseline",
    }
}

/// Human-readable report: run summary, per-detector table, F1 deltas with
/// McNemar p-values, then the literature figures.
pub fn render_report(report: &ComparisonReport) -> String {
    let run = &report.run;
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(
        out,
        "groomwatch comparison report ({}, seed {})",
        run.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        run.random_seed
    );
    let _ = writeln!(
        out,
        "Corpus: {} samples ({} grooming / {} normal); train {}, test {} ({} grooming); vocabulary {} terms",
        run.corpus.total(),
        run.corpus.grooming,
        run.corpus.normal,
        run.train.total(),
        run.test.total(),
        run.test.grooming,
        run.vocabulary_size
    );
    let _ = writeln!(out);

    let name_width = report
        .models
        .iter()
        .map(|m| m.name.len())
        .max()
        .unwrap_or(0)
        .max("Detector".len());
    let _ = writeln!(
        out,
        "{:<nw$}  {:<8}  {:<11}  {:>8}  {:>9}  {:>6}  {:>6}  {:>7}",
        "Detector",
        "Role",
        "Scope",
        "Accuracy",
        "Precision",
        "Recall",
        "F1",
        "Support",
        nw = name_width
    );
    for model in &report.models {
        let m = &model.metrics;
        let _ = writeln!(
            out,
            "{:<nw$}  {:<8}  {:<11}  {:>8.4}  {:>9.4}  {:>6.4}  {:>6.4}  {:>7}",
            model.name,
            role_label(model.role),
            model.scope.to_string(),
            m.accuracy,
            m.precision,
            m.recall,
            m.f1,
            m.support,
            nw = name_width
        );
    }

    if !report.f1_deltas.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "F1 delta on the test split (primary - baseline):");
        for delta in &report.f1_deltas {
            let p_value = report
                .paired_tests
                .iter()
                .find(|t| t.baseline == delta.baseline)
                .map(|t| format!("McNemar p = {:.4}", t.result.p_value))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  {} vs {}: {:.4} - {:.4} = {:+.4}  {}",
                delta.primary,
                delta.baseline,
                delta.primary_f1,
                delta.baseline_f1,
                delta.delta,
                p_value
            );
        }
    }

    if !report.literature.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Literature reference figures:");
        for figure in &report.literature {
            let _ = writeln!(
                out,
                "  {} {} {:.2} ({})",
                figure.model, figure.metric, figure.value, figure.source
            );
        }
    }

    out
}

/// Write the full report as pretty-printed JSON.
pub fn write_json_report<P: AsRef<Path>>(report: &ComparisonReport, path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    write_bytes_to_file(path, json.as_bytes())
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    log::info!("Wrote JSON report to {}", path.display());
    Ok(())
}
