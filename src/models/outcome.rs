use serde::Serialize;
use std::fmt;

/// Terminal classification of a single address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    /// Domain publishes at least one MX host.
    ValidDomain,
    /// Malformed input, or the domain is confirmed absent.
    NoDomain,
    /// Domain resolves but has no usable mail route.
    NoMx,
    /// Infrastructure failure: timeout or no reachable nameservers.
    DnsError,
    /// Unanticipated resolver failure.
    Unknown,
}

impl EmailStatus {
    /// Stable machine-readable label, used as the persisted status value.
    pub fn label(self) -> &'static str {
        match self {
            EmailStatus::ValidDomain => "valid_domain",
            EmailStatus::NoDomain => "no_domain",
            EmailStatus::NoMx => "no_mx",
            EmailStatus::DnsError => "dns_error",
            EmailStatus::Unknown => "unknown",
        }
    }

    /// Human readable description used by the console report.
    pub fn description(self) -> &'static str {
        match self {
            EmailStatus::ValidDomain => "domain is valid",
            EmailStatus::NoDomain => "domain is missing",
            EmailStatus::NoMx => "MX records missing or invalid",
            EmailStatus::DnsError => "DNS error",
            EmailStatus::Unknown => "unknown error",
        }
    }
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of classifying one address.
///
/// Built only through the constructors below, so `status == ValidDomain`
/// holds exactly when `mx_hosts` is non-empty and every other status
/// carries a detail message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailOutcome {
    address: String,
    status: EmailStatus,
    mx_hosts: Vec<String>,
    detail: Option<String>,
}

impl EmailOutcome {
    /// A deliverable domain. An empty host list is not a valid MX answer and
    /// is downgraded to `NoMx`.
    pub fn valid(address: impl Into<String>, mx_hosts: Vec<String>) -> Self {
        if mx_hosts.is_empty() {
            return Self::failed(address, EmailStatus::NoMx, "MX records not found");
        }
        Self {
            address: address.into(),
            status: EmailStatus::ValidDomain,
            mx_hosts,
            detail: None,
        }
    }

    /// A non-success outcome. Passing `ValidDomain` here is a logic error and
    /// is recorded as `Unknown` so the host-list invariant still holds.
    pub fn failed(
        address: impl Into<String>,
        status: EmailStatus,
        detail: impl Into<String>,
    ) -> Self {
        let status = match status {
            EmailStatus::ValidDomain => EmailStatus::Unknown,
            other => other,
        };
        Self {
            address: address.into(),
            status,
            mx_hosts: Vec::new(),
            detail: Some(detail.into()),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn status(&self) -> EmailStatus {
        self.status
    }

    pub fn mx_hosts(&self) -> &[String] {
        &self.mx_hosts
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_valid(&self) -> bool {
        self.status == EmailStatus::ValidDomain
    }
}
