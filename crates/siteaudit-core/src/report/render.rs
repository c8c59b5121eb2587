//! Plain-text rendering of a run summary.

use std::fmt::Write;

use crate::scheduler::RunSummary;

pub fn render_summary(s: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "targets: {} candidates, {} planned, {} skipped (recent), {} skipped (quarantined)",
        s.candidates, s.planned_targets, s.skipped_recent, s.skipped_quarantined
    );
    let _ = writeln!(
        out,
        "probes: {} attempted, {} succeeded ({} targets), {} failed",
        s.attempted,
        s.succeeded,
        s.succeeded_targets,
        s.failed_total()
    );
    for (category, n) in &s.failed {
        let _ = writeln!(out, "  {:<20} {}", category.as_str(), n);
    }
    if s.deadline_reached {
        let _ = writeln!(out, "soft deadline reached: {} probes not scheduled", s.not_scheduled);
    } else if s.not_scheduled > 0 {
        let _ = writeln!(out, "stopped early: {} probes not scheduled", s.not_scheduled);
    }
    if !s.newly_quarantined.is_empty() {
        let _ = writeln!(out, "newly quarantined: {}", s.newly_quarantined.len());
        for url in &s.newly_quarantined {
            let _ = writeln!(out, "  {url}");
        }
    }
    let _ = writeln!(
        out,
        "elapsed: {:.1}s ({:.2} probes/s)",
        s.elapsed_secs,
        s.probes_per_sec()
    );
    out
}
