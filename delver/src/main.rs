use colored::Colorize;
use delver::command_argument_builder;
use delver::handlers::handle_scan;
use delver_core::print_banner;
use std::process::ExitCode;
use tracing::Level;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = command_argument_builder().get_matches();
    let quiet = matches.get_flag("quiet");
    let verbose = matches.get_flag("verbose");

    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if !quiet {
        print_banner();
    }

    match handle_scan(&matches).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
