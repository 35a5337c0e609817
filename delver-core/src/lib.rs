pub mod config;
pub mod report;
pub mod scan;
pub mod source;

use colored::Colorize;

pub use config::ScanConfig;
pub use report::{Report, summarize, write_report};
pub use scan::{ScanOptions, execute_scan};
pub use source::CandidateSource;

pub fn print_banner() {
    let banner = r#"
     _      _
  __| | ___| |_   _____ _ __
 / _` |/ _ \ \ \ / / _ \ '__|
| (_| |  __/ |\ V /  __/ |
 \__,_|\___|_| \_/ \___|_|
"#;
    println!("{}", banner.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "concurrent HTTP endpoint prober".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
