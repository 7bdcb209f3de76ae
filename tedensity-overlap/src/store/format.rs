use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::kernel::Direction;

pub const MAGIC: &[u8; 8] = b"TEOVRLP\x01";
pub const FORMAT_VERSION: u32 = 1;
/// Manifest offset, manifest length and the closing magic.
pub const FOOTER_LEN: u64 = 8 + 8 + 8;

/// Dimensions of one calculation run.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreShape {
    pub n_genes: usize,
    pub n_windows: usize,
    pub n_tes: usize,
}

impl StoreShape {
    pub fn dataset_shape(&self, direction: Direction) -> Vec<usize> {
        match direction {
            Direction::Left | Direction::Right => vec![self.n_genes, self.n_windows, self.n_tes],
            Direction::Intra => vec![self.n_genes, self.n_tes],
        }
    }

    /// Rows of `n_tes` values stored per gene.
    pub fn rows_per_gene(&self, direction: Direction) -> usize {
        match direction {
            Direction::Left | Direction::Right => self.n_windows,
            Direction::Intra => 1,
        }
    }
}

///
/// Names behind the gene and window axes.
///
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreIndex {
    pub chromosome: Option<String>,
    pub gene_names: Vec<String>,
    pub windows: Vec<u32>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkEntry {
    pub index: usize,
    pub offset: u64,
    pub length: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DatasetManifest {
    pub name: String,
    pub shape: Vec<usize>,
    pub chunk_shape: Vec<usize>,
    pub chunks: Vec<ChunkEntry>,
}

impl DatasetManifest {
    /// Genes covered by one chunk.
    pub fn chunk_genes(&self) -> usize {
        self.chunk_shape.first().copied().unwrap_or(1).max(1)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    pub version: u32,
    pub shape: StoreShape,
    #[serde(flatten)]
    pub index: StoreIndex,
    pub datasets: Vec<DatasetManifest>,
}

impl Manifest {
    pub fn dataset(&self, direction: Direction) -> Option<&DatasetManifest> {
        self.datasets.iter().find(|d| d.name == direction.name())
    }
}

pub fn write_footer<W: Write>(writer: &mut W, offset: u64, length: u64) -> Result<(), StoreError> {
    writer.write_u64::<LittleEndian>(offset)?;
    writer.write_u64::<LittleEndian>(length)?;
    writer.write_all(MAGIC)?;
    Ok(())
}

/// Returns the manifest offset and length.
pub fn read_footer<R: Read>(reader: &mut R) -> Result<(u64, u64), StoreError> {
    let offset = reader.read_u64::<LittleEndian>()?;
    let length = reader.read_u64::<LittleEndian>()?;
    check_magic(reader, "footer")?;
    Ok((offset, length))
}

pub fn check_magic<R: Read>(reader: &mut R, place: &str) -> Result<(), StoreError> {
    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(StoreError::Corrupt(format!("bad magic in {}", place)));
    }
    Ok(())
}

/// Encode values as little-endian `f32` bytes.
pub fn encode_values<'a, I>(values: I, len: usize) -> Vec<u8>
where
    I: IntoIterator<Item = &'a f32>,
{
    let mut bytes = vec![0u8; len * std::mem::size_of::<f32>()];
    for (dst, value) in bytes.chunks_exact_mut(4).zip(values) {
        LittleEndian::write_f32(dst, *value);
    }
    bytes
}

///
/// Compress a block of values into one chunk payload.
///
pub fn compress_values<'a, I>(values: I, len: usize, level: Compression) -> Result<Vec<u8>, StoreError>
where
    I: IntoIterator<Item = &'a f32>,
{
    let bytes = encode_values(values, len);
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(bytes.len() / 4 + 64), level);
    encoder.write_all(&bytes)?;
    Ok(encoder.finish()?)
}

///
/// Decompress one chunk payload into `dst`, which must match the chunk size exactly.
///
pub fn decompress_values(compressed: &[u8], dst: &mut [f32]) -> Result<(), StoreError> {
    let mut bytes = Vec::with_capacity(dst.len() * std::mem::size_of::<f32>());
    ZlibDecoder::new(compressed).read_to_end(&mut bytes)?;
    if bytes.len() != dst.len() * std::mem::size_of::<f32>() {
        return Err(StoreError::Corrupt(format!(
            "chunk holds {} bytes, expected {}",
            bytes.len(),
            dst.len() * std::mem::size_of::<f32>()
        )));
    }
    LittleEndian::read_f32_into(&bytes, dst);
    Ok(())
}
