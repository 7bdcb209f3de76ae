use std::path::{Path, PathBuf};

use crate::consts::{DEFAULT_CHUNK_BYTES, DEFAULT_COMPRESSION_LEVEL, MAX_CHUNK_GENES};

///
/// Where and how an overlap store is written.
///
/// There is no default output directory; callers always say where results go.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub output_dir: PathBuf,
    /// Genes per left/right chunk; derived from `chunk_bytes` when `None`.
    pub chunk_genes: Option<usize>,
    pub chunk_bytes: usize,
    pub compression_level: u32,
}

impl StoreConfig {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        StoreConfig {
            output_dir: output_dir.as_ref().to_path_buf(),
            chunk_genes: None,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    pub fn with_chunk_genes(mut self, chunk_genes: usize) -> Self {
        self.chunk_genes = Some(chunk_genes.max(1));
        self
    }

    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes;
        self
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    ///
    /// Genes per left/right chunk for a given number of windows and TEs.
    ///
    /// Without an explicit setting this is the largest count up to
    /// [MAX_CHUNK_GENES] whose chunk fits in `chunk_bytes`, and at least one.
    pub fn chunk_genes_for(&self, n_windows: usize, n_tes: usize) -> usize {
        if let Some(chunk_genes) = self.chunk_genes {
            return chunk_genes.max(1);
        }

        let gene_bytes = n_windows * n_tes * std::mem::size_of::<f32>();
        if gene_bytes == 0 {
            return MAX_CHUNK_GENES;
        }
        (self.chunk_bytes / gene_bytes).clamp(1, MAX_CHUNK_GENES)
    }
}
