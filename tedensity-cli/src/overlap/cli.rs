use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const OVERLAP_CMD: &str = "overlap";
pub const DEFAULT_WINDOW: u32 = 1000;
pub const DEFAULT_INCREMENT: u32 = 1000;
pub const DEFAULT_MAX_WINDOW: u32 = 10000;
pub const DEFAULT_OUTPUT_DIR: &str = ".";

pub fn create_overlap_cli() -> Command {
    Command::new(OVERLAP_CMD)
        .about("Compute the overlap of transposable elements with every gene, per chromosome.")
        .arg_required_else_help(true)
        .arg(Arg::new("genes").required(true).help("Gene annotation (GFF-like, optionally gzipped)"))
        .arg(
            Arg::new("transposons")
                .required(true)
                .help("Transposable element annotation (GFF-like, optionally gzipped)"),
        )
        .arg(arg!(-o --"output-dir" <output_dir> "Directory for the overlap stores"))
        .arg(
            arg!(--window <window> "First window size in base pairs")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--increment <increment> "Step between window sizes")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"max-window" <max_window> "Largest window size (inclusive)")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"chunk-genes" <chunk_genes> "Genes per left/right chunk")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--"drop-contigs" "Skip genes on contigs")
                .action(ArgAction::SetTrue),
        )
}
