use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use delver_core::config::{ScanConfig, parse_base_url, parse_header};
use delver_core::report::write_report;
use delver_core::scan::{ScanOptions, execute_scan};
use delver_scanner::error::{Result, ScanError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Exit code after a Ctrl-C, following the 128 + SIGINT shell convention
pub const EXIT_INTERRUPTED: u8 = 130;

/// Expand a leading `~` in a user-supplied path
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Turn parsed arguments into a validated scan configuration.
pub fn build_config(matches: &ArgMatches) -> Result<ScanConfig> {
    let raw_url = matches
        .get_one::<String>("url")
        .ok_or_else(|| ScanError::ConfigurationInvalid("--url is required".to_string()))?;
    let mut config = ScanConfig::new(parse_base_url(raw_url)?);

    if let Some(wordlist) = matches.get_one::<PathBuf>("wordlist") {
        config = config.with_wordlist(expand_path(wordlist));
    }
    if let Some(rate) = matches.get_one::<f64>("rate-limit") {
        config = config.with_rate_limit(*rate);
    }
    if let Some(headers) = matches.get_many::<String>("header") {
        for raw in headers {
            let (name, value) = parse_header(raw)?;
            config = config.with_header(&name, &value);
        }
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config = config.with_timeout(Duration::from_secs(*timeout));
    }
    if let Some(concurrency) = matches.get_one::<usize>("concurrency") {
        config = config.with_concurrency(*concurrency);
    }
    if let Some(max_retries) = matches.get_one::<u32>("max-retries") {
        config = config.with_max_retries(*max_retries);
    }
    if let Some(output) = matches.get_one::<PathBuf>("output") {
        config = config.with_output(expand_path(output));
    }

    config = config
        .with_verbose(matches.get_flag("verbose"))
        .with_ignore_ssl(matches.get_flag("ignore-ssl"));

    config.validate()?;
    Ok(config)
}

/// Cancel `token` on the first Ctrl-C and exit immediately on the second.
pub fn install_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupt received, stopping after in-flight requests unwind");
        eprintln!(
            "\n{} Interrupted, finishing up with partial results (Ctrl-C again to quit now)...",
            "!".yellow().bold()
        );
        token.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{} Aborted.", "✗".red().bold());
            std::process::exit(i32::from(EXIT_INTERRUPTED));
        }
    });
}

pub async fn handle_scan(matches: &ArgMatches) -> anyhow::Result<ExitCode> {
    let config = build_config(matches)?;
    let quiet = matches.get_flag("quiet");

    if !quiet {
        println!("{} {}", "Target:".blue(), config.base_url.as_str().bright_white());
        match config.wordlist {
            Some(ref path) => println!("{} {}", "Wordlist:".blue(), path.display()),
            None => println!("{} {}", "Wordlist:".blue(), "remote default".bright_black()),
        }
        println!(
            "{} {}  {} {}\n",
            "Concurrency:".blue(),
            config.concurrency,
            "Retries:".blue(),
            config.max_retries
        );
    }

    let cancel = CancellationToken::new();
    install_interrupt_handler(cancel.clone());

    let options = ScanOptions {
        show_progress_bar: !quiet,
        cancel,
        ..ScanOptions::default()
    };
    let report = execute_scan(&config, options).await?;

    print!("{}", report.render_text());

    if let Some(ref output) = config.output {
        write_report(&report, output)
            .with_context(|| format!("failed to write report to {}", output.display()))?;
        println!("{} Report saved to {}", "✓".green().bold(), output.display());
    }

    if report.interrupted {
        println!("{} Scan was interrupted; results are partial.", "⚠".yellow().bold());
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }

    Ok(ExitCode::SUCCESS)
}
