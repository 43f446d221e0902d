/// Classifies an address into a terminal [`EmailStatus`].
///
/// Runs the syntax checks, then a rate-limited MX lookup, and on an empty MX
/// answer a second rate-limited A lookup:
/// 1. Empty or malformed input, or a malformed domain: `NoDomain`
/// 2. MX hosts found: `ValidDomain`
/// 3. No MX but an A record: `NoMx`
/// 4. Resolver infrastructure failures: `DnsError` or `Unknown`
///
/// [`EmailStatus`]: crate::models::EmailStatus
pub mod classifier;

/// DNS resolver adapter.
///
/// Wraps MX and A lookups behind the [`dnsmx::DnsLookup`] trait with a fixed
/// timeout, collapsing resolver errors into [`dnsmx::LookupOutcome`].
pub mod dnsmx;

/// Pure address and domain grammar checks.
///
/// # Examples
/// ```
/// use email_checker::validation::syntax::{is_valid_address_syntax, is_valid_domain_syntax};
///
/// assert!(is_valid_address_syntax("user@example.com"));
/// assert!(is_valid_domain_syntax("example.com"));
/// assert!(!is_valid_domain_syntax("ex--ample.com"));
/// ```
pub mod syntax;

pub use classifier::EmailValidator;
pub use dnsmx::{DnsLookup, LookupOutcome, RecordKind, TrustDnsLookup};
