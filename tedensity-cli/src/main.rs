mod overlap;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use tracing_subscriber::filter::LevelFilter;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "tedensity";
    pub const BIN_NAME: &str = "tedensity";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Base pair overlap of transposable elements with genes and their flanking windows.")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Set the log level to DEBUG"),
        )
        .subcommand(overlap::cli::create_overlap_cli())
}

/// Route `log` records through a fmt subscriber on stderr.
fn init_logging(verbose: bool) {
    let level = match verbose {
        true => LevelFilter::DEBUG,
        false => LevelFilter::INFO,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    init_logging(matches.get_flag("verbose"));

    match matches.subcommand() {
        //
        // OVERLAP
        //
        Some((overlap::cli::OVERLAP_CMD, matches)) => {
            overlap::handlers::run_overlap(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
