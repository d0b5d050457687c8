//! Markdown evaluation report of a run

use crate::metrics::SeriesMetrics;
use crate::run::RunReport;
use demand_math::median;
use std::cmp::Ordering;
use std::fmt::Write;

/// Recommendations listed in the report
const TOP_RECOMMENDATIONS: usize = 10;
const LISTED_FAILURES: usize = 5;

struct ColumnStats {
    median: f64,
    mean: f64,
    min: f64,
    max: f64,
}

fn column_stats(metrics: &[SeriesMetrics], f: fn(&SeriesMetrics) -> f64) -> Option<ColumnStats> {
    let values: Vec<f64> = metrics.iter().map(f).collect();
    let median = median(&values).ok()?;
    Some(ColumnStats {
        median,
        mean: values.iter().sum::<f64>() / values.len() as f64,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

/// Render the run as a markdown document
pub fn render_markdown(report: &RunReport) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &RunReport) -> std::fmt::Result {
    let summary = &report.summary;
    writeln!(out, "# Forecast Evaluation Report")?;
    writeln!(out)?;
    writeln!(out, "Run: `{}`", report.run_id)?;
    writeln!(out)?;
    writeln!(
        out,
        "Holdout: {} days, horizon: {} days, interval: {:.0}%",
        report.holdout_days,
        report.horizon_days,
        report.interval_width * 100.0
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "Series eligible: {}, forecast: {}, failed: {}",
        summary.eligible, summary.succeeded, summary.failed
    )?;
    if let Some(quality) = summary.quality {
        writeln!(out)?;
        writeln!(out, "Overall quality: **{}**", quality)?;
    }
    if let Some(coverage) = summary.median_coverage_pct {
        let target = report.interval_width * 100.0;
        let verdict = if coverage >= target {
            "meets"
        } else {
            "below"
        };
        writeln!(out)?;
        writeln!(
            out,
            "Median interval coverage {:.1}% {} the {:.0}% target",
            coverage, verdict, target
        )?;
    }

    writeln!(out)?;
    writeln!(out, "## Accuracy")?;
    writeln!(out)?;
    writeln!(out, "| Metric | Median | Mean | Min | Max |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    let columns: [(&str, fn(&SeriesMetrics) -> f64); 5] = [
        ("MAPE (%)", |m| m.mean_absolute_percentage_error),
        ("MAE", |m| m.mean_absolute_error),
        ("RMSE", |m| m.root_mean_squared_error),
        ("Bias", |m| m.bias),
        ("Coverage (%)", |m| m.interval_coverage_pct),
    ];
    for (label, f) in columns {
        if let Some(s) = column_stats(&report.metrics, f) {
            writeln!(
                out,
                "| {} | {:.2} | {:.2} | {:.2} | {:.2} |",
                label, s.median, s.mean, s.min, s.max
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "## Per-Series Results")?;
    writeln!(out)?;
    writeln!(out, "| Series | Train | Holdout | MAPE (%) | MAE | Bias | Coverage (%) |")?;
    writeln!(out, "|---|---|---|---|---|---|---|")?;
    let mut by_mape: Vec<&SeriesMetrics> = report.metrics.iter().collect();
    by_mape.sort_by(|a, b| {
        a.mean_absolute_percentage_error
            .partial_cmp(&b.mean_absolute_percentage_error)
            .unwrap_or(Ordering::Equal)
    });
    for m in by_mape {
        writeln!(
            out,
            "| {} | {} | {} | {:.2} | {:.2} | {:+.2} | {:.1} |",
            m.series_key,
            m.training_count,
            m.holdout_count,
            m.mean_absolute_percentage_error,
            m.mean_absolute_error,
            m.bias,
            m.interval_coverage_pct
        )?;
    }

    if !report.recommendations.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Replenishment")?;
        writeln!(out)?;
        writeln!(
            out,
            "| Series | On hand | Lead-time demand | Safety stock | Purchase | Confidence |"
        )?;
        writeln!(out, "|---|---|---|---|---|---|")?;
        for r in report.recommendations.iter().take(TOP_RECOMMENDATIONS) {
            writeln!(
                out,
                "| {} | {:.0} | {:.1} | {:.1} | {:.0} | {} |",
                r.series_key,
                r.on_hand_quantity,
                r.lead_time_demand,
                r.safety_stock,
                r.purchase_quantity.ceil(),
                r.confidence_tier
            )?;
        }
    }

    if !report.failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Failures")?;
        writeln!(out)?;
        for failure in report.failures.iter().take(LISTED_FAILURES) {
            writeln!(out, "- {}", failure)?;
        }
        if report.failures.len() > LISTED_FAILURES {
            writeln!(out, "- and {} more", report.failures.len() - LISTED_FAILURES)?;
        }
    }

    Ok(())
}
