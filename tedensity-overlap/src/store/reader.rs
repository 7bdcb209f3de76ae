use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3, ArrayD, IxDyn};

use crate::errors::StoreError;
use crate::kernel::Direction;
use crate::store::format::{
    FOOTER_LEN, FORMAT_VERSION, MAGIC, Manifest, StoreShape, check_magic, decompress_values,
    read_footer,
};

///
/// Read access to a closed overlap store.
///
/// Chunks that were never written read back as zeros.
///
pub struct OverlapStoreReader {
    filepath: PathBuf,
    file: File,
    manifest: Manifest,
}

impl OverlapStoreReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let filepath = path.as_ref().to_path_buf();
        let mut file = File::open(&filepath)?;

        let file_len = file.metadata()?.len();
        if file_len < MAGIC.len() as u64 + FOOTER_LEN {
            return Err(StoreError::Corrupt(format!(
                "{} is too short to be an overlap store",
                filepath.display()
            )));
        }

        check_magic(&mut file, "header")?;
        file.seek(SeekFrom::Start(file_len - FOOTER_LEN))?;
        let (offset, length) = read_footer(&mut file)?;
        if offset < MAGIC.len() as u64 || offset + length > file_len - FOOTER_LEN {
            return Err(StoreError::Corrupt(format!(
                "manifest at {}+{} is outside the file",
                offset, length
            )));
        }

        file.seek(SeekFrom::Start(offset))?;
        let mut manifest_bytes = Vec::with_capacity(length as usize);
        (&mut file).take(length).read_to_end(&mut manifest_bytes)?;
        let manifest: Manifest = serde_json::from_slice(&manifest_bytes)?;

        if manifest.version != FORMAT_VERSION {
            return Err(StoreError::Corrupt(format!(
                "unsupported store version {}",
                manifest.version
            )));
        }

        Ok(OverlapStoreReader {
            filepath,
            file,
            manifest,
        })
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn shape(&self) -> StoreShape {
        self.manifest.shape
    }

    pub fn chromosome(&self) -> Option<&str> {
        self.manifest.index.chromosome.as_deref()
    }

    pub fn gene_names(&self) -> &[String] {
        &self.manifest.index.gene_names
    }

    pub fn windows(&self) -> &[u32] {
        &self.manifest.index.windows
    }

    pub fn gene_index(&self, name: &str) -> Option<usize> {
        self.gene_names().iter().position(|g| g == name)
    }

    pub fn window_index(&self, window: u32) -> Option<usize> {
        self.windows().iter().position(|&w| w == window)
    }

    pub fn left(&self) -> Result<Array3<f32>, StoreError> {
        self.read(Direction::Left)?
            .into_dimensionality()
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    pub fn right(&self) -> Result<Array3<f32>, StoreError> {
        self.read(Direction::Right)?
            .into_dimensionality()
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    pub fn intra(&self) -> Result<Array2<f32>, StoreError> {
        self.read(Direction::Intra)?
            .into_dimensionality()
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    ///
    /// Materialize one dataset in memory.
    ///
    pub fn read(&self, direction: Direction) -> Result<ArrayD<f32>, StoreError> {
        let dataset = self.manifest.dataset(direction).ok_or_else(|| {
            StoreError::Corrupt(format!("missing dataset '{}'", direction.name()))
        })?;

        let shape = self.manifest.shape.dataset_shape(direction);
        if dataset.shape != shape {
            return Err(StoreError::Corrupt(format!(
                "dataset '{}' has shape {:?}, expected {:?}",
                dataset.name, dataset.shape, shape
            )));
        }

        let n_genes = shape[0];
        let per_gene: usize = shape[1..].iter().product();
        let chunk_genes = dataset.chunk_genes();
        let mut values = vec![0.0f32; n_genes * per_gene];

        let mut file = &self.file;
        let mut compressed = Vec::new();
        for chunk in dataset.chunks.iter() {
            let first_gene = chunk.index * chunk_genes;
            if first_gene >= n_genes {
                return Err(StoreError::Corrupt(format!(
                    "chunk {} of '{}' starts past gene {}",
                    chunk.index, dataset.name, n_genes
                )));
            }
            let last_gene = (first_gene + chunk_genes).min(n_genes);

            compressed.clear();
            file.seek(SeekFrom::Start(chunk.offset))?;
            file.take(chunk.length).read_to_end(&mut compressed)?;
            decompress_values(
                &compressed,
                &mut values[first_gene * per_gene..last_gene * per_gene],
            )?;
        }

        ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }
}
