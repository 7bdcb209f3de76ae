use std::path::{Path, PathBuf};

use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
use ndarray::Array1;

use tedensity_core::{GeneData, TransposonData};

use crate::config::StoreConfig;
use crate::errors::OverlapError;
use crate::kernel::{Direction, Overlap};
use crate::store::{ArrayStore, StoreIndex, StoreShape};

///
/// The overlap between the genes and transposable elements of one chromosome.
///
/// Each [OverlapData::calculate] call filters the requested gene names and
/// windows, indexes them, and writes one store file. The index maps of the
/// most recent run stay available for interpreting that file.
///
pub struct OverlapData {
    config: StoreConfig,
    gene_names: Vec<String>,
    windows: Vec<u32>,
    gene_name_2_idx: HashMap<String, usize>,
    window_2_idx: HashMap<u32, usize>,
    filepath: Option<PathBuf>,
}

impl OverlapData {
    pub fn new(config: StoreConfig) -> Self {
        OverlapData {
            config,
            gene_names: Vec::new(),
            windows: Vec::new(),
            gene_name_2_idx: HashMap::default(),
            window_2_idx: HashMap::default(),
            filepath: None,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Gene names of the last run, in `gene_idx` order.
    pub fn gene_names(&self) -> &[String] {
        &self.gene_names
    }

    /// Window sizes of the last run, in `window_idx` order.
    pub fn windows(&self) -> &[u32] {
        &self.windows
    }

    pub fn gene_index(&self, name: &str) -> Option<usize> {
        self.gene_name_2_idx.get(name).copied()
    }

    pub fn window_index(&self, window: u32) -> Option<usize> {
        self.window_2_idx.get(&window).copied()
    }

    /// Store written by the last successful run.
    pub fn filepath(&self) -> Option<&Path> {
        self.filepath.as_deref()
    }

    ///
    /// Calculate the overlap for the genes and windows.
    ///
    /// Unknown gene names and non-positive windows are logged and skipped;
    /// repeated ones are computed once. The run is sequential: its cost is
    /// bounded by the number of requested genes times windows.
    ///
    /// # Arguments
    /// - genes: the chromosome's genes.
    /// - transposons: the chromosome's transposable elements.
    /// - windows: window sizes in base pairs.
    /// - gene_names: the genes to use.
    /// - progress: called once per gene after all of its windows are done.
    ///
    /// # Returns
    /// Path of the store holding the `left`, `intra` and `right` datasets.
    pub fn calculate<S: AsRef<str>>(
        &mut self,
        genes: &GeneData,
        transposons: &TransposonData,
        windows: &[i64],
        gene_names: &[S],
        progress: Option<&mut dyn FnMut()>,
    ) -> Result<PathBuf, OverlapError> {
        transposons.check_shape()?;
        self.reset(genes, windows, gene_names);

        let shape = StoreShape {
            n_genes: self.gene_names.len(),
            n_windows: self.windows.len(),
            n_tes: transposons.number_elements(),
        };
        log::debug!(
            "{}: {} genes x {} windows x {} transposons",
            genes.chromosome(),
            shape.n_genes,
            shape.n_windows,
            shape.n_tes
        );

        let mut store = ArrayStore::open(shape, &self.config)?;
        let result = store
            .set_index(StoreIndex {
                chromosome: Some(genes.chromosome().to_string()).filter(|c| !c.is_empty()),
                gene_names: self.gene_names.clone(),
                windows: self.windows.clone(),
            })
            .map_err(OverlapError::from)
            .and_then(|_| self.fill(&mut store, genes, transposons, progress));

        // close on every path; a fill error wins over a close error
        let closed = store.close();
        result?;
        let filepath = closed?;

        self.filepath = Some(filepath.clone());
        Ok(filepath)
    }

    fn fill(
        &self,
        store: &mut ArrayStore,
        genes: &GeneData,
        transposons: &TransposonData,
        mut progress: Option<&mut dyn FnMut()>,
    ) -> Result<(), OverlapError> {
        let n_tes = transposons.number_elements();

        for gene_name in self.gene_names.iter() {
            let gene = genes
                .get_gene(gene_name)
                .ok_or_else(|| OverlapError::MissingGene(gene_name.clone()))?;
            let g_idx = self.gene_name_2_idx[gene_name];

            let intra = Overlap::intra(gene, transposons)?;
            check_overlap_shape(Direction::Intra, &intra, n_tes)?;
            store.write_intra(g_idx, intra.view())?;

            for window in self.windows.iter() {
                let left = Overlap::left(gene, transposons, *window)?;
                check_overlap_shape(Direction::Left, &left, n_tes)?;
                let right = Overlap::right(gene, transposons, *window)?;
                check_overlap_shape(Direction::Right, &right, n_tes)?;

                let w_idx = self.window_2_idx[window];
                store.write_left(w_idx, g_idx, left.view())?;
                store.write_right(w_idx, g_idx, right.view())?;
            }

            if let Some(progress) = progress.as_deref_mut() {
                progress();
            }
        }

        Ok(())
    }

    /// Filter and index the request; mutates self.
    fn reset<S: AsRef<str>>(&mut self, genes: &GeneData, windows: &[i64], gene_names: &[S]) {
        self.gene_names = filter_gene_names(gene_names, genes);
        self.gene_name_2_idx = map_gene_names_2_indices(&self.gene_names);
        self.windows = filter_windows(windows);
        self.window_2_idx = map_windows_2_indices(&self.windows);
        self.filepath = None;
    }
}

/// Only the gene names present on the chromosome, first occurrence kept.
fn filter_gene_names<S: AsRef<str>>(requested: &[S], genes: &GeneData) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::default();
    let mut names = Vec::with_capacity(requested.len());

    for name in requested.iter().map(|n| n.as_ref()) {
        if !genes.contains(name) {
            log::error!("invalid gene name: {}", name);
        } else if !seen.insert(name) {
            log::debug!("duplicate gene name: {}", name);
        } else {
            names.push(name.to_string());
        }
    }

    names
}

/// Only the positive windows, first occurrence kept.
fn filter_windows(requested: &[i64]) -> Vec<u32> {
    let mut seen: HashSet<u32> = HashSet::default();
    let mut windows = Vec::with_capacity(requested.len());

    for &window in requested {
        match u32::try_from(window) {
            Ok(0) | Err(_) => log::error!("invalid window: {}", window),
            Ok(w) if !seen.insert(w) => log::debug!("duplicate window: {}", w),
            Ok(w) => windows.push(w),
        }
    }

    windows
}

fn map_gene_names_2_indices(gene_names: &[String]) -> HashMap<String, usize> {
    gene_names
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), idx))
        .collect()
}

fn map_windows_2_indices(windows: &[u32]) -> HashMap<u32, usize> {
    windows
        .iter()
        .enumerate()
        .map(|(idx, &window)| (window, idx))
        .collect()
}

fn check_overlap_shape(
    direction: Direction,
    overlap: &Array1<f32>,
    n_tes: usize,
) -> Result<(), OverlapError> {
    if overlap.len() != n_tes {
        return Err(OverlapError::ShapeMismatch {
            direction,
            expected: n_tes,
            found: overlap.len(),
        });
    }
    Ok(())
}
