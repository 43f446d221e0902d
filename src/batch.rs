//! Sequential batch driver.
//!
//! Feeds addresses one at a time into an [`EmailValidator`], keeps the output
//! in input order, and publishes progress telemetry to a [`ProgressReporter`]
//! before each classification. Telemetry never influences the outcomes.

use crate::error::Cancelled;
use crate::models::{EmailOutcome, EmailStatus};
use crate::validation::{DnsLookup, EmailValidator};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

/// Snapshot handed to the reporter before an address is classified.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// 1-based position of the address about to be classified.
    pub index: usize,
    pub total: usize,
    pub elapsed: Duration,
    /// Admissions in the limiter's trailing one-second window.
    pub current_rate: usize,
    /// Configured ceiling; zero or negative means unlimited.
    pub ceiling: i64,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.index as f64 / self.total as f64 * 100.0
    }

    /// Addresses per second since the batch started.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.index as f64 / secs
        } else {
            0.0
        }
    }
}

/// Observer for batch progress.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: &Progress);

    /// Called once when the batch stops, whether completed or interrupted.
    fn finish(&self) {}
}

impl ProgressReporter for () {
    fn report(&self, _progress: &Progress) {}
}

/// Rewrites a single status line on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn report(&self, progress: &Progress) {
        let load = if progress.ceiling > 0 {
            format!("{}/{}", progress.current_rate, progress.ceiling)
        } else {
            format!("{}/unlimited", progress.current_rate)
        };
        let mut stderr = std::io::stderr().lock();
        let _ = write!(
            stderr,
            "\rProcessing {}/{} ({:.1}%) | Speed: {:.1} email/s | DNS load: {} req/s",
            progress.index,
            progress.total,
            progress.percent(),
            progress.throughput(),
            load
        );
        let _ = stderr.flush();
    }

    fn finish(&self) {
        let _ = writeln!(std::io::stderr());
    }
}

/// Emits progress as debug-level tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, progress: &Progress) {
        debug!(
            index = progress.index,
            total = progress.total,
            throughput = progress.throughput(),
            current_rate = progress.current_rate,
            ceiling = progress.ceiling,
            "classifying address"
        );
    }
}

/// Classifies every address in order, one outcome per input (duplicates
/// included).
///
/// `shutdown` is raced against each classification; once it resolves the
/// in-flight address is abandoned and `Err(Cancelled)` is returned instead of
/// a partial list. A panic while classifying one address becomes an
/// `Unknown` outcome for that address and the batch carries on.
pub async fn process_all<L, R, S>(
    validator: &EmailValidator<L>,
    addresses: &[String],
    reporter: &R,
    shutdown: S,
) -> Result<Vec<EmailOutcome>, Cancelled>
where
    L: DnsLookup,
    R: ProgressReporter + ?Sized,
    S: Future<Output = ()>,
{
    let total = addresses.len();
    let ceiling = validator.rate_limiter().max_per_second();
    let start = Instant::now();
    let mut outcomes = Vec::with_capacity(total);
    tokio::pin!(shutdown);

    for (i, address) in addresses.iter().enumerate() {
        reporter.report(&Progress {
            index: i + 1,
            total,
            elapsed: start.elapsed(),
            current_rate: validator.rate_limiter().current_rate().await,
            ceiling,
        });

        let classify = AssertUnwindSafe(validator.classify(address)).catch_unwind();
        let outcome = tokio::select! {
            biased;
            _ = &mut shutdown => {
                reporter.finish();
                warn!(completed = outcomes.len(), total, "batch interrupted");
                return Err(Cancelled {
                    completed: outcomes.len(),
                    total,
                });
            }
            result = classify => match result {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(%address, %message, "failed to process address");
                    EmailOutcome::failed(
                        address.trim(),
                        EmailStatus::Unknown,
                        format!("processing failed: {}", message),
                    )
                }
            },
        };

        debug!(
            address = outcome.address(),
            status = %outcome.status(),
            detail = outcome.detail(),
            "address classified"
        );
        outcomes.push(outcome);
    }

    reporter.finish();
    Ok(outcomes)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{LookupOutcome, RecordKind};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers MX queries from a table; unknown domains are NXDOMAIN.
    struct ScriptedLookup {
        mx: HashMap<&'static str, LookupOutcome>,
    }

    impl ScriptedLookup {
        fn new(entries: &[(&'static str, LookupOutcome)]) -> Self {
            Self {
                mx: entries.iter().cloned().collect(),
            }
        }
    }

    #[async_trait]
    impl DnsLookup for ScriptedLookup {
        async fn lookup(&self, domain: &str, kind: RecordKind) -> LookupOutcome {
            if domain == "panic.example.com" {
                panic!("resolver blew up");
            }
            match kind {
                RecordKind::Mx => self
                    .mx
                    .get(domain)
                    .cloned()
                    .unwrap_or(LookupOutcome::NxDomain),
                RecordKind::A => LookupOutcome::Found(vec!["192.0.2.10".into()]),
            }
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        seen: Mutex<Vec<Progress>>,
        finished: Mutex<usize>,
    }

    impl ProgressReporter for RecordingReporter {
        fn report(&self, progress: &Progress) {
            self.seen.lock().unwrap().push(progress.clone());
        }

        fn finish(&self) {
            *self.finished.lock().unwrap() += 1;
        }
    }

    fn addresses(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn scripted() -> ScriptedLookup {
        ScriptedLookup::new(&[
            (
                "example.com",
                LookupOutcome::Found(vec!["mail.example.com.".into()]),
            ),
            ("nomx.example.com", LookupOutcome::NoRecords),
        ])
    }

    #[tokio::test]
    async fn test_outcomes_follow_input_order_with_duplicates() {
        let validator = EmailValidator::new(scripted(), 0);
        let input = addresses(&[
            "a@example.com",
            "broken",
            "b@nomx.example.com",
            "a@example.com",
            "c@gone.example.com",
        ]);

        let outcomes = process_all(&validator, &input, &(), std::future::pending())
            .await
            .unwrap();

        let statuses: Vec<_> = outcomes.iter().map(|o| o.status()).collect();
        assert_eq!(
            statuses,
            [
                EmailStatus::ValidDomain,
                EmailStatus::NoDomain,
                EmailStatus::NoMx,
                EmailStatus::ValidDomain,
                EmailStatus::NoDomain,
            ]
        );
        assert_eq!(outcomes[0], outcomes[3]);
        assert_eq!(outcomes[0].mx_hosts(), ["mail.example.com"]);
        // MX for 3 DNS-bound addresses, plus the A fallback for nomx.
        assert_eq!(validator.rate_limiter().total_admissions(), 5);
    }

    #[tokio::test]
    async fn test_empty_batch_returns_empty_list() {
        let validator = EmailValidator::new(scripted(), 50);
        let reporter = RecordingReporter::default();

        let outcomes = process_all(&validator, &[], &reporter, std::future::pending())
            .await
            .unwrap();

        assert!(outcomes.is_empty());
        assert!(reporter.seen.lock().unwrap().is_empty());
        assert_eq!(*reporter.finished.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ceiling_of_one_paces_three_lookups_over_two_seconds() {
        let validator = EmailValidator::new(scripted(), 1);
        let input = addresses(&["a@example.com", "b@example.com", "c@example.com"]);

        let start = Instant::now();
        let outcomes = process_all(&validator, &input, &(), std::future::pending())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.is_valid()));
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_reports_every_address() {
        let validator = EmailValidator::new(scripted(), 2);
        let reporter = RecordingReporter::default();
        let input = addresses(&["a@example.com", "b@example.com", "c@example.com"]);

        process_all(&validator, &input, &reporter, std::future::pending())
            .await
            .unwrap();

        let seen = reporter.seen.lock().unwrap();
        let indices: Vec<_> = seen.iter().map(|p| p.index).collect();
        assert_eq!(indices, [1, 2, 3]);
        assert!(seen.iter().all(|p| p.total == 3 && p.ceiling == 2));
        assert_eq!(seen[0].current_rate, 0);
        assert_eq!(seen[1].current_rate, 1);
        assert_eq!(seen[2].current_rate, 2);
        assert_eq!(*reporter.finished.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reporter_does_not_change_outcomes() {
        let input = addresses(&["a@example.com", "x@nomx.example.com", "nope"]);

        let quiet = EmailValidator::new(scripted(), 0);
        let quiet_outcomes = process_all(&quiet, &input, &(), std::future::pending())
            .await
            .unwrap();

        let observed = EmailValidator::new(scripted(), 0);
        let reporter = RecordingReporter::default();
        let observed_outcomes = process_all(&observed, &input, &reporter, std::future::pending())
            .await
            .unwrap();

        assert_eq!(quiet_outcomes, observed_outcomes);
    }

    #[tokio::test]
    async fn test_panic_in_one_address_becomes_unknown() {
        let validator = EmailValidator::new(scripted(), 0);
        let input = addresses(&["a@panic.example.com", "b@example.com"]);

        let outcomes = process_all(&validator, &input, &(), std::future::pending())
            .await
            .unwrap();

        assert_eq!(outcomes[0].status(), EmailStatus::Unknown);
        assert_eq!(outcomes[0].address(), "a@panic.example.com");
        assert_eq!(
            outcomes[0].detail(),
            Some("processing failed: resolver blew up")
        );
        assert!(outcomes[1].is_valid());
    }

    #[tokio::test]
    async fn test_ready_shutdown_cancels_before_first_address() {
        let validator = EmailValidator::new(scripted(), 0);
        let reporter = RecordingReporter::default();
        let input = addresses(&["a@example.com", "b@example.com"]);

        let result = process_all(&validator, &input, &reporter, std::future::ready(())).await;

        assert_eq!(
            result,
            Err(Cancelled {
                completed: 0,
                total: 2
            })
        );
        assert_eq!(validator.rate_limiter().total_admissions(), 0);
        assert_eq!(*reporter.finished.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_address_waiting_on_limiter() {
        let validator = EmailValidator::new(scripted(), 1);
        let input = addresses(&["a@example.com", "b@example.com", "c@example.com"]);
        let shutdown = tokio::time::sleep(Duration::from_millis(1_500));

        let result = process_all(&validator, &input, &(), shutdown).await;

        assert_eq!(
            result,
            Err(Cancelled {
                completed: 2,
                total: 3
            })
        );
    }
}
