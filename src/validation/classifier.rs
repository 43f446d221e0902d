use crate::models::{EmailOutcome, EmailStatus};
use crate::rate_limit::RateLimiter;
use crate::validation::dnsmx::{DnsLookup, LookupOutcome, RecordKind, normalize_exchange};
use crate::validation::syntax::{is_valid_address_syntax, is_valid_domain_syntax};
use tracing::debug;

/// Turns raw addresses into [`EmailOutcome`]s.
///
/// Owns the run's [`RateLimiter`]: every DNS query issued while classifying
/// goes through [`RateLimiter::wait`] first, so a single address costs zero,
/// one or two admissions.
pub struct EmailValidator<L> {
    lookup: L,
    limiter: RateLimiter,
}

impl<L: DnsLookup> EmailValidator<L> {
    pub fn new(lookup: L, rate_limit: i64) -> Self {
        Self::with_limiter(lookup, RateLimiter::new(rate_limit))
    }

    pub fn with_limiter(lookup: L, limiter: RateLimiter) -> Self {
        Self { lookup, limiter }
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Classifies one address. Checks run in a fixed order and the first
    /// failing check decides the outcome; resolver failures never escape.
    pub async fn classify(&self, raw: &str) -> EmailOutcome {
        let address = raw.trim();

        if address.is_empty() {
            return EmailOutcome::failed(address, EmailStatus::NoDomain, "empty string");
        }

        if !is_valid_address_syntax(address) {
            return EmailOutcome::failed(address, EmailStatus::NoDomain, "invalid email syntax");
        }

        let domain = match address.split_once('@') {
            Some((_, domain)) if !domain.is_empty() => domain,
            _ => {
                return EmailOutcome::failed(
                    address,
                    EmailStatus::NoDomain,
                    "missing @ or domain",
                );
            }
        };

        if !is_valid_domain_syntax(domain) {
            return EmailOutcome::failed(address, EmailStatus::NoDomain, "invalid domain syntax");
        }

        self.limiter.wait().await;
        match self.lookup.lookup(domain, RecordKind::Mx).await {
            LookupOutcome::Found(hosts) => {
                let hosts = hosts.iter().map(|h| normalize_exchange(h)).collect();
                EmailOutcome::valid(address, hosts)
            }
            LookupOutcome::NoRecords => self.classify_without_mx(address, domain).await,
            LookupOutcome::NxDomain => {
                EmailOutcome::failed(address, EmailStatus::NoDomain, "NXDOMAIN")
            }
            LookupOutcome::NoNameservers => {
                EmailOutcome::failed(address, EmailStatus::DnsError, "no DNS servers available")
            }
            LookupOutcome::Timeout => {
                EmailOutcome::failed(address, EmailStatus::DnsError, "DNS query timeout")
            }
            LookupOutcome::Failed(message) => EmailOutcome::failed(
                address,
                EmailStatus::Unknown,
                format!("unexpected resolver error: {}", message),
            ),
        }
    }

    /// The domain answered but has no MX records; an A record tells a
    /// resolvable host apart from a name that vanished between queries.
    async fn classify_without_mx(&self, address: &str, domain: &str) -> EmailOutcome {
        debug!(%domain, "no MX records, checking A record");
        self.limiter.wait().await;

        let cause = match self.lookup.lookup(domain, RecordKind::A).await {
            LookupOutcome::Found(_) => {
                return EmailOutcome::failed(
                    address,
                    EmailStatus::NoMx,
                    "A record present, no MX",
                );
            }
            LookupOutcome::NxDomain => {
                return EmailOutcome::failed(
                    address,
                    EmailStatus::NoDomain,
                    "domain does not exist",
                );
            }
            LookupOutcome::NoRecords => "no A records".to_string(),
            LookupOutcome::NoNameservers => "no DNS servers available".to_string(),
            LookupOutcome::Timeout => "DNS query timeout".to_string(),
            LookupOutcome::Failed(message) => message,
        };

        EmailOutcome::failed(
            address,
            EmailStatus::Unknown,
            format!("A record lookup failed: {}", cause),
        )
    }
}
