use anyhow::{Context, Result};
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use email_checker::batch::{ConsoleProgress, ProgressReporter, TracingProgress, process_all};
use email_checker::cli::{Args, Command, help_text};
use email_checker::config::Settings;
use email_checker::input::read_addresses;
use email_checker::report::{
    RunStats, describe_limit, write_counts, write_json_lines, write_results, write_stats,
};
use email_checker::store::SqliteStore;
use email_checker::validation::{EmailValidator, TrustDnsLookup};

/// Email Checker Entry Point
///
/// Reads addresses from a file, classifies each one by syntax and DNS
/// (MX, falling back to A), pacing DNS queries with a sliding-window rate
/// limit, then prints the grouped results or stores them in SQLite.
///
/// # Exit codes
/// - `0`: run completed, or the input file had no addresses
/// - `1`: bad arguments or settings, unreadable input, database failure,
///   or interrupted with Ctrl-C
#[tokio::main]
async fn main() -> ExitCode {
    let args = match Command::parse(std::env::args().skip(1)) {
        Ok(Command::Check(args)) => args,
        Ok(Command::Help) => {
            print!("{}", help_text());
            return ExitCode::SUCCESS;
        }
        Ok(Command::Version) => {
            println!("email-checker v{}", email_checker::VERSION);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run 'email-checker --help' for usage.");
            return ExitCode::FAILURE;
        }
    };

    // Only a real run needs settings, so a bad variable never blocks --help.
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&settings);

    let run_id = Uuid::new_v4();
    match run(args, settings).instrument(info_span!("run", %run_id)).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging. `RUST_LOG` wins over the configured level.
fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args, settings: Settings) -> Result<ExitCode> {
    let rate_limit = args.rate_limit.unwrap_or(settings.rate_limit);
    let db_path = args.db.clone().or(settings.db_path.clone());

    let addresses = read_addresses(&args.file).await?;
    if addresses.is_empty() {
        println!("Input file contains no email addresses");
        return Ok(ExitCode::SUCCESS);
    }

    // Keep stdout clean for JSON output.
    let notice = |line: String| {
        if args.json && db_path.is_none() {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    };
    notice(format!("Found {} email addresses to check", addresses.len()));
    notice(format!("Rate limit: {}", describe_limit(rate_limit)));

    let lookup = TrustDnsLookup::from_system_conf(settings.dns_timeout);
    let validator = EmailValidator::new(lookup, rate_limit);
    info!(
        addresses = addresses.len(),
        rate_limit,
        dns_timeout_secs = settings.dns_timeout.as_secs(),
        "starting check"
    );

    let reporter: Box<dyn ProgressReporter> = if args.progress {
        Box::new(ConsoleProgress)
    } else {
        Box::new(TracingProgress)
    };
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let started = Instant::now();
    let outcomes = match process_all(&validator, &addresses, &*reporter, shutdown).await {
        Ok(outcomes) => outcomes,
        Err(cancelled) => {
            eprintln!("\nInterrupted by user ({})", cancelled);
            return Ok(ExitCode::FAILURE);
        }
    };
    let stats = RunStats {
        processed: outcomes.len(),
        elapsed: started.elapsed(),
        rate_limit,
        dns_queries: validator.rate_limiter().total_admissions(),
    };
    info!(
        processed = stats.processed,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        dns_queries = stats.dns_queries,
        "check finished"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(path) = db_path {
        writeln!(out, "\nSaving results to database: {}", path.display())?;
        let mut store = SqliteStore::open(&path)
            .with_context(|| format!("cannot open database '{}'", path.display()))?;
        store.save_all(&outcomes, rate_limit)?;
        let summary = store.summary()?;
        writeln!(out, "\nSaved to database. Summary:")?;
        write_counts(&mut out, &summary)?;
        write_stats(&mut out, &stats)?;
    } else if args.json {
        write_json_lines(&mut out, &outcomes)?;
        write_stats(&mut io::stderr().lock(), &stats)?;
    } else {
        write_results(&mut out, &outcomes, rate_limit)?;
        write_stats(&mut out, &stats)?;
    }
    out.flush()?;

    Ok(ExitCode::SUCCESS)
}
