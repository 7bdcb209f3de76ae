use thiserror::Error;

use tedensity_core::DataError;

use crate::kernel::Direction;

#[derive(Error, Debug)]
pub enum OverlapError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("{direction} overlap has {found} elements but there are {expected} transposons")]
    ShapeMismatch {
        direction: Direction,
        expected: usize,
        found: usize,
    },

    #[error("Gene not found: {0}")]
    MissingGene(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Can't encode or decode store manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("{direction} {axis} index {index} is out of range (size {size})")]
    OutOfRange {
        direction: Direction,
        axis: &'static str,
        index: usize,
        size: usize,
    },

    #[error("{direction} row has {found} values, expected {expected}")]
    RowLength {
        direction: Direction,
        expected: usize,
        found: usize,
    },

    #[error("Store index does not match store shape: {0}")]
    IndexMismatch(String),

    #[error("Corrupted store file: {0}")]
    Corrupt(String),

    #[error("Store is already closed")]
    Closed,
}
