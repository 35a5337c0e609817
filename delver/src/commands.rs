use clap::arg;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("delver")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("delver")
        .about("Probe a web service with a wordlist of candidate paths and report what answers")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-u --"url" <URL>)
                .required(true)
                .help("Base URL to probe; candidates are resolved relative to it, so end it with '/'"),
        )
        .arg(
            arg!(-w --"wordlist" <PATH>)
                .required(false)
                .help("Newline-delimited wordlist (default: fetch the SecLists common.txt list)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            arg!(-r --"rate-limit" <REQUESTS_PER_SECOND>)
                .required(false)
                .help("Maximum requests issued per second (default: unlimited)")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            arg!(-H --"header" <HEADER>)
                .required(false)
                .help("Extra request header as 'Name: value'; may be repeated")
                .action(clap::ArgAction::Append),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Request timeout in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("10"),
        )
        .arg(
            arg!(-c --"concurrency" <NUM>)
                .required(false)
                .help("Maximum number of requests in flight at once")
                .value_parser(clap::value_parser!(usize))
                .default_value("10"),
        )
        .arg(
            arg!(--"max-retries" <NUM>)
                .required(false)
                .help("Attempts per candidate before recording a failure")
                .value_parser(clap::value_parser!(u32))
                .default_value("3"),
        )
        .arg(
            arg!(-o --"output" <PATH>)
                .required(false)
                .help("Write the JSON report to this file")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            arg!(-v --"verbose" "Log every probe outcome as it arrives")
                .required(false)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-k --"ignore-ssl" "Skip TLS certificate validation")
                .required(false)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-q --"quiet" "Suppress banner and progress bar")
                .required(false)
                .action(clap::ArgAction::SetTrue),
        )
}
