use clap::Parser;
use log::{debug, error};

mod args;
mod rcv;

use crate::args::Args;

fn main() {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    debug!("args: {:?}", args);

    if let Err(e) = rcv::run_election(&args) {
        error!("Tabulation failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
