//! rustiny-make CLI: build orchestrator for the RusTiny compiler.

use clap::Parser;
use rustiny_make::cli::{self, Cli};
use rustiny_make::notice::Notices;

fn main() {
    let mut builder = env_logger::Builder::from_env("RUSTINY_MAKE_LOG");
    builder.format_timestamp(None).format_indent(Some(2));
    builder.init();

    let cli = Cli::parse();
    let mut notices = Notices::stdout();
    if let Err(e) = cli::dispatch(&cli, &mut notices) {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}
