//! Terminal tables for batch runs (stdout).

use crate::report::BatchReport;

/// Header + processed/skipped tables for a `fold` run.
pub fn format_batch_summary(report: &BatchReport) -> String {
    let mut out = String::new();

    out.push_str("=== lcfold - eclipse epoch + phase folding ===\n");
    out.push_str(&format!("Manifest: {}\n", report.manifest.display()));
    out.push_str(&format!(
        "Objects: {} | processed={} | skipped={} | rows={} (duplicates={}, bad rows={})\n",
        report.outcomes.len(),
        report.processed_count(),
        report.skipped_count(),
        report.manifest_rows,
        report.duplicates,
        report.manifest_row_errors.len(),
    ));

    if report.processed_count() > 0 {
        out.push_str("\nProcessed:\n");
        out.push_str(&format_epoch_table(report));
    }

    if report.skipped_count() > 0 {
        out.push_str("\nSkipped:\n");
        for (name, reason) in report.skipped() {
            out.push_str(&format!("  {name:<24} {:<17} {reason}\n", reason.kind()));
        }
    }

    out
}

/// One line per processed object: epoch, provenance, fit diagnostics, output.
pub fn format_epoch_table(report: &BatchReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "  {:<24} {:>12} {:>18} {:<8} {:>7} {:>10}  {}\n",
        "name", "period", "epoch0", "source", "n", "width", "output"
    ));
    for (name, p) in report.processed() {
        let width = p
            .epoch
            .fit
            .map(|f| format!("{:.5}", f.width))
            .unwrap_or_else(|| "-".to_string());
        let output = p
            .output
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {name:<24} {:>12.6} {:>18.6} {:<8} {:>7} {:>10}  {output}\n",
            p.period,
            p.epoch.value,
            p.epoch.source.label(),
            p.n_samples,
            width,
        ));
    }
    out
}
