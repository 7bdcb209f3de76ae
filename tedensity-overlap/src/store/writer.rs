use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use fxhash::FxHashMap as HashMap;
use ndarray::{Array2, ArrayView1};

use crate::config::StoreConfig;
use crate::consts::{STORE_EXTENSION, STORE_PREFIX};
use crate::errors::StoreError;
use crate::kernel::Direction;
use crate::store::format::{
    ChunkEntry, DatasetManifest, FORMAT_VERSION, MAGIC, Manifest, StoreIndex, StoreShape,
    compress_values, decompress_values, encode_values, write_footer,
};

///
/// Destination for the overlap of one calculation run.
///
/// Holds the `left`, `intra` and `right` datasets of a single store file.
/// `left` and `right` rows are buffered per chunk; a chunk is compressed and
/// appended to the file as soon as all of its rows are written, so writing
/// genes in order keeps at most one chunk per dataset in memory. `intra` rows
/// are compressed into a spill file as they arrive and copied in at close.
///
/// The file is finalized by [ArrayStore::close]. A store that is dropped
/// without being closed closes itself.
///
pub struct ArrayStore {
    filepath: PathBuf,
    writer: Option<BufWriter<File>>,
    spill_dir: PathBuf,
    offset: u64,
    shape: StoreShape,
    index: StoreIndex,
    compression: Compression,
    left: ChunkedDataset,
    intra: ChunkedDataset,
    intra_rows: IntraRows,
    right: ChunkedDataset,
}

impl ArrayStore {
    ///
    /// Create a uniquely named store file in the configured output directory.
    ///
    /// # Arguments
    /// - shape: number of genes, windows and transposons.
    /// - config: output directory, chunking and compression.
    pub fn open(shape: StoreShape, config: &StoreConfig) -> Result<Self, StoreError> {
        let (file, filepath) = tempfile::Builder::new()
            .prefix(STORE_PREFIX)
            .suffix(&format!(".{}", STORE_EXTENSION))
            .tempfile_in(&config.output_dir)?
            .keep()
            .map_err(io::Error::from)?;

        let mut writer = BufWriter::new(file);
        if let Err(e) = writer.write_all(MAGIC) {
            drop(writer);
            let _ = std::fs::remove_file(&filepath);
            return Err(e.into());
        }

        let lr_chunk_genes = config.chunk_genes_for(shape.n_windows, shape.n_tes);
        let store = ArrayStore {
            filepath,
            writer: Some(writer),
            spill_dir: config.output_dir.clone(),
            offset: MAGIC.len() as u64,
            shape,
            index: StoreIndex::default(),
            compression: Compression::new(config.compression_level),
            left: ChunkedDataset::new(Direction::Left, shape, lr_chunk_genes),
            intra: ChunkedDataset::new(Direction::Intra, shape, shape.n_genes.max(1)),
            intra_rows: IntraRows::Empty,
            right: ChunkedDataset::new(Direction::Right, shape, lr_chunk_genes),
        };

        log::debug!(
            "opened overlap store {} with shape {:?}, {} genes per left/right chunk",
            store.filepath.display(),
            shape,
            lr_chunk_genes
        );

        Ok(store)
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    pub fn shape(&self) -> StoreShape {
        self.shape
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    pub fn chunk_genes(&self, direction: Direction) -> usize {
        match direction {
            Direction::Left => self.left.chunk_genes,
            Direction::Intra => self.intra.chunk_genes,
            Direction::Right => self.right.chunk_genes,
        }
    }

    ///
    /// Record the gene names and windows behind the store's axes.
    ///
    pub fn set_index(&mut self, index: StoreIndex) -> Result<(), StoreError> {
        if index.gene_names.len() != self.shape.n_genes {
            return Err(StoreError::IndexMismatch(format!(
                "{} gene names for {} genes",
                index.gene_names.len(),
                self.shape.n_genes
            )));
        }
        if index.windows.len() != self.shape.n_windows {
            return Err(StoreError::IndexMismatch(format!(
                "{} window sizes for {} windows",
                index.windows.len(),
                self.shape.n_windows
            )));
        }
        self.index = index;
        Ok(())
    }

    pub fn write_left(
        &mut self,
        window_idx: usize,
        gene_idx: usize,
        values: ArrayView1<f32>,
    ) -> Result<(), StoreError> {
        self.write(Direction::Left, window_idx, gene_idx, values)
    }

    pub fn write_right(
        &mut self,
        window_idx: usize,
        gene_idx: usize,
        values: ArrayView1<f32>,
    ) -> Result<(), StoreError> {
        self.write(Direction::Right, window_idx, gene_idx, values)
    }

    pub fn write_intra(&mut self, gene_idx: usize, values: ArrayView1<f32>) -> Result<(), StoreError> {
        self.write(Direction::Intra, 0, gene_idx, values)
    }

    ///
    /// Write one row: all transposons for one gene (and window, for left/right).
    ///
    pub fn write(
        &mut self,
        direction: Direction,
        window_idx: usize,
        gene_idx: usize,
        values: ArrayView1<f32>,
    ) -> Result<(), StoreError> {
        let ArrayStore {
            writer,
            spill_dir,
            offset,
            shape,
            compression,
            left,
            intra,
            intra_rows,
            right,
            ..
        } = self;
        let writer = writer.as_mut().ok_or(StoreError::Closed)?;
        let dataset = match direction {
            Direction::Left => left,
            Direction::Right => right,
            Direction::Intra => {
                intra.check_row(window_idx, gene_idx, values.len())?;
                return intra_rows.write(spill_dir, *shape, *compression, gene_idx, values);
            }
        };

        dataset.check_row(window_idx, gene_idx, values.len())?;
        let chunk_idx = gene_idx / dataset.chunk_genes;

        if !dataset.open.contains_key(&chunk_idx) {
            let chunk = dataset.load_chunk(writer, *offset, chunk_idx)?;
            dataset.open.insert(chunk_idx, chunk);
        }

        let row = dataset.chunk_row(window_idx, gene_idx);
        let complete = match dataset.open.get_mut(&chunk_idx) {
            Some(chunk) => chunk.set_row(row, values),
            None => false,
        };

        if complete {
            if let Some(chunk) = dataset.open.remove(&chunk_idx) {
                dataset.seal(writer, offset, *compression, chunk_idx, chunk)?;
            }
        }

        Ok(())
    }

    ///
    /// Flush every buffered chunk, write the manifest and close the file.
    ///
    /// Calling it again after success is a no-op that returns the same path.
    pub fn close(&mut self) -> Result<PathBuf, StoreError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(self.filepath.clone());
        };

        for dataset in [&mut self.left, &mut self.right] {
            let mut pending: Vec<(usize, OpenChunk)> = dataset.open.drain().collect();
            pending.sort_by_key(|(chunk_idx, _)| *chunk_idx);
            for (chunk_idx, chunk) in pending {
                dataset.seal(
                    &mut writer,
                    &mut self.offset,
                    self.compression,
                    chunk_idx,
                    chunk,
                )?;
            }
        }

        match std::mem::replace(&mut self.intra_rows, IntraRows::Empty) {
            IntraRows::Empty => {}
            IntraRows::Streaming {
                mut encoder,
                next_gene,
            } => {
                pad_rows(&mut encoder, next_gene, self.shape.n_genes, self.shape.n_tes)?;
                let mut spill = finish_spill(encoder)?;
                self.intra
                    .append(&mut writer, &mut self.offset, 0, &mut spill)?;
            }
            IntraRows::Buffered(chunk) => {
                self.intra
                    .seal(&mut writer, &mut self.offset, self.compression, 0, chunk)?;
            }
        }

        let manifest = Manifest {
            version: FORMAT_VERSION,
            shape: self.shape,
            index: self.index.clone(),
            datasets: vec![
                self.left.manifest(),
                self.intra.manifest(),
                self.right.manifest(),
            ],
        };
        let manifest_bytes = serde_json::to_vec(&manifest)?;
        writer.write_all(&manifest_bytes)?;
        write_footer(&mut writer, self.offset, manifest_bytes.len() as u64)?;

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;

        log::debug!("closed overlap store {}", self.filepath.display());

        Ok(self.filepath.clone())
    }
}

impl Drop for ArrayStore {
    fn drop(&mut self) {
        if self.writer.is_some() {
            if let Err(e) = self.close() {
                log::error!(
                    "failed to close overlap store {}: {}",
                    self.filepath.display(),
                    e
                );
            }
        }
    }
}

/// One dataset's chunk bookkeeping.
struct ChunkedDataset {
    direction: Direction,
    shape: StoreShape,
    chunk_genes: usize,
    open: HashMap<usize, OpenChunk>,
    sealed: HashMap<usize, ChunkEntry>,
}

impl ChunkedDataset {
    fn new(direction: Direction, shape: StoreShape, chunk_genes: usize) -> Self {
        ChunkedDataset {
            direction,
            shape,
            chunk_genes: chunk_genes.max(1),
            open: HashMap::default(),
            sealed: HashMap::default(),
        }
    }

    fn check_row(&self, window_idx: usize, gene_idx: usize, len: usize) -> Result<(), StoreError> {
        let n_rows = self.shape.rows_per_gene(self.direction);
        if gene_idx >= self.shape.n_genes {
            return Err(StoreError::OutOfRange {
                direction: self.direction,
                axis: "gene",
                index: gene_idx,
                size: self.shape.n_genes,
            });
        }
        if window_idx >= n_rows {
            return Err(StoreError::OutOfRange {
                direction: self.direction,
                axis: "window",
                index: window_idx,
                size: n_rows,
            });
        }
        if len != self.shape.n_tes {
            return Err(StoreError::RowLength {
                direction: self.direction,
                expected: self.shape.n_tes,
                found: len,
            });
        }
        Ok(())
    }

    /// Number of `n_tes` rows held by a chunk; the last chunk may be short.
    fn chunk_rows(&self, chunk_idx: usize) -> usize {
        let first_gene = chunk_idx * self.chunk_genes;
        let n_genes = self.chunk_genes.min(self.shape.n_genes - first_gene);
        n_genes * self.shape.rows_per_gene(self.direction)
    }

    fn chunk_row(&self, window_idx: usize, gene_idx: usize) -> usize {
        (gene_idx % self.chunk_genes) * self.shape.rows_per_gene(self.direction) + window_idx
    }

    ///
    /// A fresh chunk, or the sealed one read back from disk when it is written again.
    ///
    fn load_chunk(
        &self,
        writer: &mut BufWriter<File>,
        end: u64,
        chunk_idx: usize,
    ) -> Result<OpenChunk, StoreError> {
        let rows = self.chunk_rows(chunk_idx);
        let Some(entry) = self.sealed.get(&chunk_idx) else {
            return Ok(OpenChunk::new(rows, self.shape.n_tes));
        };

        log::debug!("reloading sealed {} chunk {}", self.direction, chunk_idx);

        writer.flush()?;
        let file = writer.get_mut();
        file.seek(SeekFrom::Start(entry.offset))?;
        let mut compressed = Vec::with_capacity(entry.length as usize);
        Read::by_ref(file).take(entry.length).read_to_end(&mut compressed)?;
        file.seek(SeekFrom::Start(end))?;

        let mut chunk = OpenChunk::new(rows, self.shape.n_tes);
        if let Some(dst) = chunk.data.as_slice_mut() {
            decompress_values(&compressed, dst)?;
        }
        chunk.written.fill(true);
        chunk.remaining = 0;

        Ok(chunk)
    }

    fn seal(
        &mut self,
        writer: &mut BufWriter<File>,
        offset: &mut u64,
        compression: Compression,
        chunk_idx: usize,
        chunk: OpenChunk,
    ) -> Result<(), StoreError> {
        let compressed = compress_values(chunk.data.iter(), chunk.data.len(), compression)?;
        writer.write_all(&compressed)?;

        let entry = ChunkEntry {
            index: chunk_idx,
            offset: *offset,
            length: compressed.len() as u64,
        };
        *offset += entry.length;
        self.sealed.insert(chunk_idx, entry);

        Ok(())
    }

    /// Copy an already compressed chunk in from `src`.
    fn append<R: Read>(
        &mut self,
        writer: &mut BufWriter<File>,
        offset: &mut u64,
        chunk_idx: usize,
        src: &mut R,
    ) -> Result<(), StoreError> {
        let length = io::copy(src, writer)?;

        let entry = ChunkEntry {
            index: chunk_idx,
            offset: *offset,
            length,
        };
        *offset += length;
        self.sealed.insert(chunk_idx, entry);

        Ok(())
    }

    fn manifest(&self) -> DatasetManifest {
        let mut chunk_shape = self.shape.dataset_shape(self.direction);
        if let Some(genes) = chunk_shape.first_mut() {
            *genes = self.chunk_genes;
        }

        let mut chunks: Vec<ChunkEntry> = self.sealed.values().copied().collect();
        chunks.sort_by_key(|c| c.index);

        DatasetManifest {
            name: self.direction.name().to_string(),
            shape: self.shape.dataset_shape(self.direction),
            chunk_shape,
            chunks,
        }
    }
}

/// Rows of one chunk that are still in memory.
struct OpenChunk {
    data: Array2<f32>,
    written: Vec<bool>,
    remaining: usize,
}

impl OpenChunk {
    fn new(rows: usize, n_tes: usize) -> Self {
        OpenChunk {
            data: Array2::zeros((rows, n_tes)),
            written: vec![false; rows],
            remaining: rows,
        }
    }

    /// Copy a row in; returns whether every row of the chunk is now written.
    fn set_row(&mut self, row: usize, values: ArrayView1<f32>) -> bool {
        self.data.row_mut(row).assign(&values);
        if !self.written[row] {
            self.written[row] = true;
            self.remaining -= 1;
        }
        self.remaining == 0
    }
}

///
/// Rows of the single `intra` chunk.
///
/// Rows written in gene order are compressed straight into an anonymous spill
/// file in the output directory, skipped rows as zeros. A row written behind
/// the stream switches to an in-memory buffer seeded with what was streamed.
///
enum IntraRows {
    Empty,
    Streaming {
        encoder: ZlibEncoder<BufWriter<File>>,
        next_gene: usize,
    },
    Buffered(OpenChunk),
}

impl IntraRows {
    fn write(
        &mut self,
        spill_dir: &Path,
        shape: StoreShape,
        compression: Compression,
        gene_idx: usize,
        values: ArrayView1<f32>,
    ) -> Result<(), StoreError> {
        if let IntraRows::Empty = self {
            let spill = tempfile::tempfile_in(spill_dir)?;
            *self = IntraRows::Streaming {
                encoder: ZlibEncoder::new(BufWriter::new(spill), compression),
                next_gene: 0,
            };
        }

        let behind = matches!(self, IntraRows::Streaming { next_gene, .. } if gene_idx < *next_gene);
        if behind {
            log::debug!("intra row {} written out of order, buffering", gene_idx);
            let streamed = std::mem::replace(self, IntraRows::Empty);
            *self = IntraRows::Buffered(streamed.into_chunk(shape)?);
        }

        match self {
            IntraRows::Streaming { encoder, next_gene } => {
                pad_rows(encoder, *next_gene, gene_idx, shape.n_tes)?;
                encoder.write_all(&encode_values(values.iter(), values.len()))?;
                *next_gene = gene_idx + 1;
            }
            IntraRows::Buffered(chunk) => {
                chunk.set_row(gene_idx, values);
            }
            IntraRows::Empty => {}
        }

        Ok(())
    }

    fn into_chunk(self, shape: StoreShape) -> Result<OpenChunk, StoreError> {
        match self {
            IntraRows::Empty => Ok(OpenChunk::new(shape.n_genes, shape.n_tes)),
            IntraRows::Buffered(chunk) => Ok(chunk),
            IntraRows::Streaming { encoder, next_gene } => {
                let mut compressed = Vec::new();
                finish_spill(encoder)?.read_to_end(&mut compressed)?;

                let mut chunk = OpenChunk::new(shape.n_genes, shape.n_tes);
                if let Some(dst) = chunk.data.as_slice_mut() {
                    decompress_values(&compressed, &mut dst[..next_gene * shape.n_tes])?;
                }
                chunk.written[..next_gene].fill(true);
                chunk.remaining -= next_gene;

                Ok(chunk)
            }
        }
    }

    #[cfg(test)]
    fn is_streaming(&self) -> bool {
        matches!(self, IntraRows::Streaming { .. })
    }
}

/// Write zero rows for genes `from..to`.
fn pad_rows<W: Write>(writer: &mut W, from: usize, to: usize, n_tes: usize) -> io::Result<()> {
    let zeros = vec![0u8; n_tes * std::mem::size_of::<f32>()];
    for _ in from..to {
        writer.write_all(&zeros)?;
    }
    Ok(())
}

/// Finish the zlib stream and rewind the spill file for reading.
fn finish_spill(encoder: ZlibEncoder<BufWriter<File>>) -> Result<File, StoreError> {
    let mut spill = encoder.finish()?.into_inner().map_err(|e| e.into_error())?;
    spill.seek(SeekFrom::Start(0))?;
    Ok(spill)
}
