//! Core data models for computing transposable element (TE) overlap with genes.
//!
//! A [`GeneData`] holds one chromosome's genes keyed by name and a
//! [`TransposonData`] holds that chromosome's TEs as parallel coordinate
//! vectors. Both are built from GFF-like annotation files with the readers in
//! [`io`], and are consumed read-only by the overlap engine.
//!
//! Coordinates are `u32` and every region is closed on both ends, so a feature
//! spanning `[start, stop]` covers `stop - start + 1` base pairs.

pub mod errors;
pub mod families;
pub mod io;
pub mod models;
pub mod utils;

// re-exports
pub use self::errors::DataError;
pub use self::models::{GeneData, GeneDatum, Strand, TransposonData};
