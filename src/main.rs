use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use tidyfile::cli::{self, Cli};
use tidyfile::output::OutputFormatter;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    }) {
        log::warn!("Could not install interrupt handler: {}", e);
    }

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli, cancel) {
        OutputFormatter::error(&e);
        process::exit(1);
    }
}
