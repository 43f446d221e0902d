/// Longest domain name accepted, in characters (RFC 1035).
const MAX_DOMAIN_LEN: usize = 253;
/// Longest single label accepted, in characters (RFC 1035).
const MAX_LABEL_LEN: usize = 63;

/// Checks that the whole string is `local-part@domain-part`.
///
/// The local part is one or more characters from the dot-atom class
/// `[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]`; the domain part is one or more
/// dot-separated, non-empty labels of `[A-Za-z0-9-]`. Only the grammar is
/// checked here; label length and hyphen placement are the job of
/// [`is_valid_domain_syntax`].
///
/// # Examples
/// ```
/// use email_checker::validation::syntax::is_valid_address_syntax;
///
/// assert!(is_valid_address_syntax("user.name+tag@example.com"));
/// assert!(!is_valid_address_syntax("not-an-email"));
/// assert!(!is_valid_address_syntax("user@example.com trailing"));
/// ```
pub fn is_valid_address_syntax(address: &str) -> bool {
    let (local_part, domain_part) = match address.split_once('@') {
        Some(parts) => parts,
        None => return false,
    };

    !local_part.is_empty()
        && local_part.chars().all(is_local_char)
        && !domain_part.is_empty()
        && domain_part
            .split('.')
            .all(|label| !label.is_empty() && label.chars().all(is_domain_char))
}

/// Checks the domain part against DNS hostname rules.
///
/// Rejects names longer than 253 characters, names with fewer than two
/// labels, and labels that are empty, longer than 63 characters, contain
/// `--`, or do not start and end with an ASCII letter or digit.
///
/// # Examples
/// ```
/// use email_checker::validation::syntax::is_valid_domain_syntax;
///
/// assert!(is_valid_domain_syntax("mail.example.com"));
/// assert!(!is_valid_domain_syntax("localhost"));
/// assert!(!is_valid_domain_syntax("ex--ample.com"));
/// ```
pub fn is_valid_domain_syntax(domain: &str) -> bool {
    if domain.chars().count() > MAX_DOMAIN_LEN {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| is_valid_label(label))
}

fn is_valid_label(label: &str) -> bool {
    let len = label.chars().count();
    if len == 0 || len > MAX_LABEL_LEN || label.contains("--") {
        return false;
    }

    // ^[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?$
    let starts_ok = label.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let ends_ok = label.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    starts_ok && ends_ok && label.chars().all(is_domain_char)
}

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(c)
}

fn is_domain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}
