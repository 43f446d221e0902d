//! Command-line parsing for the `email-checker` binary.

use crate::error::CliError;
use std::path::PathBuf;

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Check(Args),
    Help,
    Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// File with one address per line.
    pub file: PathBuf,
    /// Store results in this SQLite database instead of printing them.
    pub db: Option<PathBuf>,
    /// Maximum DNS queries per second; `None` falls back to settings.
    pub rate_limit: Option<i64>,
    /// Print one JSON object per outcome instead of the grouped report.
    pub json: bool,
    /// Show the progress line on stderr.
    pub progress: bool,
}

impl Command {
    /// Parses arguments, excluding the program name.
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut file = None;
        let mut db = None;
        let mut rate_limit = None;
        let mut json = false;
        let mut progress = true;

        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
                _ => (arg.clone(), None),
            };

            match flag.as_str() {
                "-h" | "--help" => return Ok(Command::Help),
                "-V" | "--version" => return Ok(Command::Version),
                "--db" => {
                    let value = inline.or_else(|| args.next()).ok_or(CliError::MissingValue("--db"))?;
                    db = Some(PathBuf::from(value));
                }
                "--rate-limit" => {
                    let value = inline
                        .or_else(|| args.next())
                        .ok_or(CliError::MissingValue("--rate-limit"))?;
                    rate_limit = Some(parse_rate_limit(&value)?);
                }
                "--json" => json = true,
                "--no-progress" => progress = false,
                _ if arg.starts_with('-') && arg.len() > 1 => {
                    return Err(CliError::UnknownArgument(arg));
                }
                _ if file.is_none() => file = Some(PathBuf::from(arg)),
                _ => return Err(CliError::UnexpectedArgument(arg)),
            }
        }

        let file = file.ok_or(CliError::MissingFile)?;
        Ok(Command::Check(Args {
            file,
            db,
            rate_limit,
            json,
            progress,
        }))
    }
}

fn parse_rate_limit(value: &str) -> Result<i64, CliError> {
    let limit: i64 = value
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidRateLimit(value.to_string()))?;
    if limit < 0 {
        return Err(CliError::NegativeRateLimit(limit));
    }
    Ok(limit)
}

pub fn help_text() -> String {
    format!(
        r#"email-checker v{}

Checks email addresses for a well-formed, resolvable domain with MX records.

USAGE:
    email-checker <FILE> [OPTIONS]

ARGS:
    <FILE>                  File with email addresses, one per line

OPTIONS:
    --db <PATH>             Save results to a SQLite database instead of printing them
    --rate-limit <N>        Maximum DNS queries per second (0 = unlimited) [default: 50]
    --json                  Print one JSON object per address
    --no-progress           Do not show the progress line
    -h, --help              Print help information
    -V, --version           Print version information

ENVIRONMENT:
    EMAIL_CHECKER_RATE_LIMIT        Default for --rate-limit
    EMAIL_CHECKER_DNS_TIMEOUT_SECS  DNS query timeout in seconds [default: 5]
    EMAIL_CHECKER_DB                Default for --db
    EMAIL_CHECKER_LOG_LEVEL         Log level (trace, debug, info, warn, error) [default: warn]
    RUST_LOG                        Full tracing filter, overrides EMAIL_CHECKER_LOG_LEVEL

EXAMPLES:
    email-checker emails.txt                    print results (50 queries/s)
    email-checker emails.txt --db results.db    store results in SQLite
    email-checker emails.txt --rate-limit 10    at most 10 queries/s
    email-checker emails.txt --rate-limit 0     no rate limiting
"#,
        crate::VERSION
    )
}
