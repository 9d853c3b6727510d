use clap::Parser;
use log::warn;
use snafu::ErrorCompat;

mod args;
mod survey;

fn main() {
    let a = args::Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if a.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    let res = survey::run_analysis(a.config, a.input, a.out, a.pii_out, a.reference);
    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
