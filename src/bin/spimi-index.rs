//! Index builder binary.

use std::io::Write;
use std::process;

use clap::{CommandFactory, Parser};
use env_logger::Builder;
use log::LevelFilter;

use spimi::cli::args::IndexArgs;
use spimi::cli::commands::run_index;
use spimi::error::SpimiError;

fn main() {
    let args = IndexArgs::parse();

    let log_level = match args.output.verbosity() {
        0 => LevelFilter::Error, // Quiet mode
        1 => LevelFilter::Warn,  // Default
        2 => LevelFilter::Info,  // Verbose
        _ => LevelFilter::Debug, // Very verbose (3+)
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    match run_index(&args) {
        Ok(_) => {}
        Err(e @ SpimiError::MissingArgument(_)) => {
            eprintln!("Error: {e}");
            eprintln!("{}", IndexArgs::command().render_usage());
            process::exit(2);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
