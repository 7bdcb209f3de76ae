use std::collections::HashMap;
use std::fmt::{self, Display};

use crate::errors::DataError;
use crate::models::Strand;

///
/// One gene on one chromosome.
///
/// Start and stop are both inclusive. Strand is recorded but the windows are
/// not swapped for antisense genes: "left" is always towards coordinate 0.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct GeneDatum {
    pub name: String,
    pub chromosome: String,
    pub start: u32,
    pub stop: u32,
    pub strand: Strand,
}

impl GeneDatum {
    ///
    /// Number of base pairs in the gene body.
    ///
    pub fn length(&self) -> u64 {
        self.stop as u64 - self.start as u64 + 1
    }

    ///
    /// Effective window size, truncated so the left window never passes coordinate 0.
    ///
    pub fn win_length(&self, window: u32) -> u32 {
        window.min(self.start)
    }

    /// First base of the left window for an effective window length.
    pub fn left_win_start(&self, win_length: u32) -> i64 {
        self.start as i64 - win_length as i64
    }

    /// Last base of the left window; -1 when the gene starts at 0.
    pub fn left_win_stop(&self) -> i64 {
        self.start as i64 - 1
    }

    pub fn right_win_start(&self) -> i64 {
        self.stop as i64 + 1
    }

    pub fn right_win_stop(&self, win_length: u32) -> i64 {
        self.stop as i64 + win_length as i64
    }
}

impl Display for GeneDatum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.chromosome, self.start, self.stop, self.strand, self.name
        )
    }
}

///
/// The genes of one chromosome, addressable by name.
///
/// Iteration order of [GeneData::names] is the order the genes were supplied in.
///
#[derive(Clone, Debug)]
pub struct GeneData {
    chromosome: String,
    genes: Vec<GeneDatum>,
    name_2_idx: HashMap<String, usize>,
}

impl GeneData {
    ///
    /// Build the gene table for one chromosome.
    ///
    /// # Arguments
    /// - genes: the genes, all on the same chromosome, with unique names.
    pub fn new(genes: Vec<GeneDatum>) -> Result<Self, DataError> {
        let chromosome = genes
            .first()
            .map(|g| g.chromosome.clone())
            .unwrap_or_default();

        let mut name_2_idx = HashMap::with_capacity(genes.len());
        for (idx, gene) in genes.iter().enumerate() {
            if gene.chromosome != chromosome {
                return Err(DataError::MixedChromosomes(
                    chromosome,
                    gene.chromosome.clone(),
                ));
            }
            if gene.stop < gene.start {
                return Err(DataError::InvertedCoordinates {
                    what: gene.name.clone(),
                    start: gene.start,
                    stop: gene.stop,
                });
            }
            if name_2_idx.insert(gene.name.clone(), idx).is_some() {
                return Err(DataError::DuplicateGene {
                    chromosome,
                    name: gene.name.clone(),
                });
            }
        }

        Ok(GeneData {
            chromosome,
            genes,
            name_2_idx,
        })
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn get_gene(&self, name: &str) -> Option<&GeneDatum> {
        self.name_2_idx.get(name).map(|&idx| &self.genes[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_2_idx.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.genes.iter().map(|g| g.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeneDatum> {
        self.genes.iter()
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}
