/// # Email Check Outcome
///
/// Value objects produced by the classifier: the closed set of statuses and
/// the immutable per-address outcome.
///
/// ## Example JSON
/// ```json
/// {
///   "address": "user@example.com",
///   "status": "valid_domain",
///   "mx_hosts": ["mail.example.com"],
///   "detail": null
/// }
/// ```
pub mod outcome;

pub use outcome::{EmailOutcome, EmailStatus};
