use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tracing::debug;
use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{ResolverConfig, ResolverOpts},
    error::{ResolveError, ResolveErrorKind},
    proto::op::ResponseCode,
    proto::rr::RecordType,
    system_conf,
};

/// Default per-query timeout and overall lifetime of a lookup.
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(5);

/// Record types the classifier asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Mx,
    A,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Mx => f.write_str("MX"),
            RecordKind::A => f.write_str("A"),
        }
    }
}

impl From<RecordKind> for RecordType {
    fn from(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Mx => RecordType::MX,
            RecordKind::A => RecordType::A,
        }
    }
}

/// Everything a lookup can tell the classifier.
///
/// The resolver library's error taxonomy is collapsed into these cases so the
/// classifier can match on them exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// At least one record. MX answers carry exchange names without the
    /// trailing root dot, A answers carry dotted-quad addresses.
    Found(Vec<String>),
    /// The name exists but has no records of the requested type.
    NoRecords,
    /// The name does not exist (NXDOMAIN).
    NxDomain,
    /// No nameserver could be reached.
    NoNameservers,
    /// The query did not complete within the configured lifetime.
    Timeout,
    /// Any other failure, with the resolver's message.
    Failed(String),
}

/// DNS lookups as seen by the classifier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DnsLookup: Send + Sync {
    async fn lookup(&self, domain: &str, kind: RecordKind) -> LookupOutcome;
}

/// [`DnsLookup`] backed by the trust-dns async resolver.
///
/// Configured with a single attempt per query and the given timeout, and
/// every lookup is additionally bounded by the same duration as its overall
/// lifetime. Answers are not cached between lookups.
pub struct TrustDnsLookup {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl TrustDnsLookup {
    /// Builds a resolver from the system configuration (`/etc/resolv.conf`
    /// on Unix), falling back to the library defaults when it cannot be read.
    pub fn from_system_conf(timeout: Duration) -> Self {
        let config = match system_conf::read_system_conf() {
            Ok((config, _)) => config,
            Err(e) => {
                debug!(error = %e, "system resolver configuration unavailable, using defaults");
                ResolverConfig::default()
            }
        };
        Self::new(config, timeout)
    }

    pub fn new(config: ResolverConfig, timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        opts.cache_size = 0;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout,
        }
    }

    async fn query(&self, domain: &str, kind: RecordKind) -> Result<Vec<String>, ResolveError> {
        // Relative names would be retried against the resolv.conf search list.
        let name = fully_qualified(domain);
        match kind {
            RecordKind::Mx => {
                let lookup = self.resolver.mx_lookup(name.as_str()).await?;
                Ok(lookup
                    .iter()
                    .map(|mx| normalize_exchange(&mx.exchange().to_utf8()))
                    .collect())
            }
            RecordKind::A => {
                let lookup = self.resolver.ipv4_lookup(name.as_str()).await?;
                Ok(lookup.iter().map(|a| a.to_string()).collect())
            }
        }
    }
}

#[async_trait]
impl DnsLookup for TrustDnsLookup {
    async fn lookup(&self, domain: &str, kind: RecordKind) -> LookupOutcome {
        debug!(%domain, record = %kind, "dns lookup");
        let outcome = match tokio::time::timeout(self.timeout, self.query(domain, kind)).await {
            Err(_elapsed) => LookupOutcome::Timeout,
            Ok(Ok(records)) if records.is_empty() => LookupOutcome::NoRecords,
            Ok(Ok(records)) => LookupOutcome::Found(records),
            Ok(Err(e)) => outcome_from_error(&e),
        };
        debug!(%domain, record = %kind, ?outcome, "dns lookup finished");
        outcome
    }
}

/// Maps a resolver error onto the closed set of lookup outcomes.
pub fn outcome_from_error(error: &ResolveError) -> LookupOutcome {
    match error.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => match response_code {
            ResponseCode::NXDomain => LookupOutcome::NxDomain,
            ResponseCode::NoError => LookupOutcome::NoRecords,
            _ => LookupOutcome::Failed(error.to_string()),
        },
        ResolveErrorKind::NoConnections => LookupOutcome::NoNameservers,
        ResolveErrorKind::Timeout => LookupOutcome::Timeout,
        _ => LookupOutcome::Failed(error.to_string()),
    }
}

/// Appends the root dot so the resolver sends exactly the given name.
pub fn fully_qualified(domain: &str) -> String {
    if domain.ends_with('.') {
        domain.to_string()
    } else {
        format!("{}.", domain)
    }
}

/// Strips the root dot from an exchange name (`mail.example.com.`).
pub fn normalize_exchange(exchange: &str) -> String {
    exchange.trim_end_matches('.').to_string()
}
