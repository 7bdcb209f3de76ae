//! Readers for tab separated, GFF-like gene and transposon annotations.
//!
//! Both files share the nine column layout
//! `chromosome software feature start stop score strand frame attributes`.
//! Runs of tabs count as one separator and `#` lines are comments.

pub mod genes;
pub mod transposons;

use std::collections::BTreeMap;

use crate::errors::DataError;
use crate::models::{GeneData, GeneDatum, TransposonData, TransposonRecord};

pub use self::genes::read_genes;
pub use self::transposons::read_transposons;

/// Split an annotation line into its non-empty tab separated fields.
pub(crate) fn split_fields(line: &str) -> Vec<&str> {
    line.split('\t').filter(|f| !f.is_empty()).collect()
}

pub(crate) fn parse_coordinate(field: &str, name: &str, line: usize) -> Result<u32, DataError> {
    field.trim().parse::<u32>().map_err(|e| DataError::Parse {
        line,
        reason: format!("invalid {} '{}': {}", name, field, e),
    })
}

///
/// Split genes into one [GeneData] per chromosome, ordered by chromosome name.
///
pub fn genes_by_chromosome(
    genes: Vec<GeneDatum>,
) -> Result<BTreeMap<String, GeneData>, DataError> {
    let mut grouped: BTreeMap<String, Vec<GeneDatum>> = BTreeMap::new();
    for gene in genes {
        grouped.entry(gene.chromosome.clone()).or_default().push(gene);
    }

    grouped
        .into_iter()
        .map(|(chromosome, genes)| Ok((chromosome, GeneData::new(genes)?)))
        .collect()
}

///
/// Split transposons into one [TransposonData] per chromosome, ordered by chromosome name.
///
pub fn transposons_by_chromosome(
    records: Vec<TransposonRecord>,
) -> Result<BTreeMap<String, TransposonData>, DataError> {
    let mut grouped: BTreeMap<String, Vec<TransposonRecord>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.chromosome.clone())
            .or_default()
            .push(record);
    }

    grouped
        .into_iter()
        .map(|(chromosome, records)| Ok((chromosome, TransposonData::from_records(records)?)))
        .collect()
}
