//! Postings lookup binary.

use std::io::Write;
use std::process;

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use spimi::cli::args::LookupArgs;
use spimi::cli::commands::run_lookup;

fn main() {
    let args = LookupArgs::parse();

    let log_level = match args.output.verbosity() {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = run_lookup(&args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
