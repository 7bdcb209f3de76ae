//! Chunked, compressed on-disk storage for overlap tensors.
//!
//! A store file (`*.teo`) is laid out as
//!
//! ```text
//! MAGIC | chunk | chunk | ... | manifest (JSON) | manifest offset: u64 | manifest length: u64 | MAGIC
//! ```
//!
//! Every chunk is a zlib-compressed block of little-endian `f32` values in
//! row-major order, covering a contiguous run of genes of one dataset. The
//! manifest records the dataset shapes, where each chunk lives, and the gene
//! names / window sizes behind every index.

pub mod format;
pub mod reader;
pub mod writer;

pub use self::format::{ChunkEntry, DatasetManifest, Manifest, StoreIndex, StoreShape};
pub use self::reader::OverlapStoreReader;
pub use self::writer::ArrayStore;
