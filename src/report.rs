//! Console rendering of batch results.

use crate::models::{EmailOutcome, EmailStatus};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;

/// Addresses listed per status group before truncating.
const MAX_SHOWN_PER_GROUP: usize = 10;
const RULE_WIDTH: usize = 80;

/// Writes the grouped report: per-status listings in first-appearance order,
/// then a per-status summary.
pub fn write_results<W: Write>(out: &mut W, outcomes: &[EmailOutcome], rate_limit: i64) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out)?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "EMAIL CHECK RESULTS (rate limit: {})", describe_limit(rate_limit))?;
    writeln!(out, "{}", rule)?;

    for (status, group) in group_by_status(outcomes) {
        writeln!(out)?;
        writeln!(
            out,
            "{} ({}): {} addresses",
            status.description().to_uppercase(),
            status.label(),
            group.len()
        )?;
        writeln!(out, "{}", "-".repeat(40))?;

        for outcome in group.iter().take(MAX_SHOWN_PER_GROUP) {
            writeln!(out, "  {}", outcome.address())?;
            if let Some(detail) = outcome.detail() {
                writeln!(out, "    Error: {}", detail)?;
            }
            if !outcome.mx_hosts().is_empty() {
                writeln!(out, "    MX records: {}", outcome.mx_hosts().join(", "))?;
            }
        }
        if group.len() > MAX_SHOWN_PER_GROUP {
            writeln!(out, "  ... and {} more", group.len() - MAX_SHOWN_PER_GROUP)?;
        }
    }

    let counts: BTreeMap<String, i64> = group_by_status(outcomes)
        .into_iter()
        .map(|(status, group)| (status.label().to_string(), group.len() as i64))
        .collect();
    writeln!(out)?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "SUMMARY")?;
    writeln!(out, "{}", rule)?;
    write_counts(out, &counts)?;
    Ok(())
}

/// Writes one JSON object per outcome, one per line.
pub fn write_json_lines<W: Write>(out: &mut W, outcomes: &[EmailOutcome]) -> io::Result<()> {
    for outcome in outcomes {
        serde_json::to_writer(&mut *out, outcome)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Writes `label: count` lines sorted by label, then the total.
pub fn write_counts<W: Write>(out: &mut W, counts: &BTreeMap<String, i64>) -> io::Result<()> {
    for (label, count) in counts {
        writeln!(out, "  {}: {}", label, count)?;
    }
    writeln!(out, "Total: {}", counts.values().sum::<i64>())
}

/// Timing figures for a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub processed: usize,
    pub elapsed: Duration,
    pub rate_limit: i64,
    pub dns_queries: u64,
}

impl RunStats {
    pub fn average_per_address(&self) -> Option<Duration> {
        u32::try_from(self.processed)
            .ok()
            .filter(|n| *n > 0)
            .map(|n| self.elapsed / n)
    }

    pub fn throughput(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.processed as f64 / secs)
    }

    /// Share of the theoretical best time `processed / rate_limit` that the
    /// run achieved, in percent. `None` without a ceiling.
    pub fn efficiency(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        if self.rate_limit <= 0 || self.processed == 0 || secs <= 0.0 {
            return None;
        }
        let theoretical = self.processed as f64 / self.rate_limit as f64;
        Some(theoretical / secs * 100.0)
    }
}

pub fn write_stats<W: Write>(out: &mut W, stats: &RunStats) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Total processing time: {:.2} s", stats.elapsed.as_secs_f64())?;
    if let Some(average) = stats.average_per_address() {
        writeln!(out, "Average time per address: {:.2} s", average.as_secs_f64())?;
    }
    if let Some(throughput) = stats.throughput() {
        writeln!(out, "Actual throughput: {:.1} email/s", throughput)?;
    }
    writeln!(out, "DNS queries issued: {}", stats.dns_queries)?;
    if let Some(efficiency) = stats.efficiency() {
        writeln!(out, "Rate limit efficiency: {:.1}% of theoretical maximum", efficiency)?;
    }
    Ok(())
}

pub fn describe_limit(rate_limit: i64) -> String {
    if rate_limit > 0 {
        format!("{} DNS queries/s", rate_limit)
    } else {
        "unlimited".to_string()
    }
}

fn group_by_status(outcomes: &[EmailOutcome]) -> Vec<(EmailStatus, Vec<&EmailOutcome>)> {
    let mut groups: Vec<(EmailStatus, Vec<&EmailOutcome>)> = Vec::new();
    for outcome in outcomes {
        match groups.iter_mut().find(|(status, _)| *status == outcome.status()) {
            Some((_, group)) => group.push(outcome),
            None => groups.push((outcome.status(), vec![outcome])),
        }
    }
    groups
}
