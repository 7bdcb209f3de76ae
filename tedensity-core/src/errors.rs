use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Error parsing line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Input TE missing fields: {left}.len() {left_len} != {right}.len() {right_len}")]
    ShapeMismatch {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    #[error("Duplicate gene name on {chromosome}: {name}")]
    DuplicateGene { chromosome: String, name: String },

    #[error("Stop {stop} is before start {start} for {what}")]
    InvertedCoordinates { what: String, start: u32, stop: u32 },

    #[error("Records from more than one chromosome: {0} and {1}")]
    MixedChromosomes(String, String),
}
