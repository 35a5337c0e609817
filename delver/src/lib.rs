pub mod commands;
pub mod handlers;

pub use commands::command_argument_builder;
pub use handlers::{build_config, expand_path, handle_scan};
