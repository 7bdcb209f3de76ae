//! Base pair overlap between transposable elements (TEs) and genes.
//!
//! For one chromosome, every requested gene is compared against every TE in
//! three regions: the left flanking window, the gene body ("intra") and the
//! right flanking window. Left and right are computed once per requested
//! window size. Results land in a chunked, compressed on-disk store with three
//! datasets:
//!
//! - `left[gene_idx, window_idx, te_idx]`
//! - `right[gene_idx, window_idx, te_idx]`
//! - `intra[gene_idx, te_idx]`
//!
//! ## Quick Start
//!
//! ```no_run
//! use tedensity_core::{GeneData, GeneDatum, Strand, TransposonData};
//! use tedensity_overlap::{OverlapData, OverlapStoreReader, StoreConfig};
//!
//! let genes = GeneData::new(vec![GeneDatum {
//!     name: "g1".to_string(),
//!     chromosome: "chr1".to_string(),
//!     start: 100,
//!     stop: 200,
//!     strand: Strand::Forward,
//! }])?;
//! let tes = TransposonData::new(vec![180], vec![220])?;
//!
//! let mut overlaps = OverlapData::new(StoreConfig::new("/tmp"));
//! let path = overlaps.calculate(&genes, &tes, &[50, 100], &["g1"], None)?;
//!
//! let store = OverlapStoreReader::open(&path)?;
//! assert_eq!(store.intra()?[[0, 0]], 21.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod errors;
pub mod kernel;
pub mod orchestrator;
pub mod store;

// re-exports
pub use self::config::StoreConfig;
pub use self::errors::{OverlapError, StoreError};
pub use self::kernel::{Direction, Overlap};
pub use self::orchestrator::OverlapData;
pub use self::store::{ArrayStore, OverlapStoreReader, StoreIndex, StoreShape};

pub mod consts {
    /// File extension of a persisted overlap store.
    pub const STORE_EXTENSION: &str = "teo";
    /// Prefix of generated store file names.
    pub const STORE_PREFIX: &str = "overlap_";
    /// Upper bound on genes per left/right chunk.
    pub const MAX_CHUNK_GENES: usize = 32;
    /// Target uncompressed size of one left/right chunk.
    pub const DEFAULT_CHUNK_BYTES: usize = 4 * 1024 * 1024;
    /// zlib level; 1 is the fastest.
    pub const DEFAULT_COMPRESSION_LEVEL: u32 = 1;
}
