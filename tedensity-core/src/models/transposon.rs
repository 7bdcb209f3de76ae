use crate::errors::DataError;
use crate::families::{UNKNOWN_SUBFAMILY, normalize_family, normalize_subfamily};
use crate::models::Strand;

///
/// One transposable element as read from an annotation file.
///
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TransposonRecord {
    pub chromosome: String,
    pub start: u32,
    pub stop: u32,
    pub strand: Strand,
    pub family: String,
    pub subfamily: String,
}

impl TransposonRecord {
    ///
    /// Split a `Family/SubFamily` feature label and normalize both halves.
    ///
    pub fn set_classification(&mut self, feature: &str) {
        let (family, subfamily) = match feature.split_once('/') {
            Some((family, subfamily)) => (family, subfamily),
            None => (feature, UNKNOWN_SUBFAMILY),
        };
        self.family = normalize_family(family).to_string();
        self.subfamily = normalize_subfamily(subfamily).to_string();
    }
}

///
/// Transposable elements of one chromosome, stored as parallel columns.
///
/// `starts`, `stops` and `lengths` are public so callers can hand over
/// columns they already own; [TransposonData::check_shape] must pass before
/// the columns are used together.
///
#[derive(Clone, Debug, Default)]
pub struct TransposonData {
    pub chromosome: String,
    pub starts: Vec<u32>,
    pub stops: Vec<u32>,
    pub lengths: Vec<u64>,
    pub families: Vec<String>,
    pub subfamilies: Vec<String>,
}

impl TransposonData {
    ///
    /// Build from coordinate columns only; families are left unclassified.
    ///
    pub fn new(starts: Vec<u32>, stops: Vec<u32>) -> Result<Self, DataError> {
        if starts.len() != stops.len() {
            return Err(DataError::ShapeMismatch {
                left: "starts",
                left_len: starts.len(),
                right: "stops",
                right_len: stops.len(),
            });
        }

        let mut lengths = Vec::with_capacity(starts.len());
        for (idx, (&start, &stop)) in starts.iter().zip(stops.iter()).enumerate() {
            if stop < start {
                return Err(DataError::InvertedCoordinates {
                    what: format!("transposon {}", idx),
                    start,
                    stop,
                });
            }
            lengths.push(stop as u64 - start as u64 + 1);
        }

        let n = starts.len();
        Ok(TransposonData {
            chromosome: String::new(),
            starts,
            stops,
            lengths,
            families: vec![String::new(); n],
            subfamilies: vec![String::new(); n],
        })
    }

    ///
    /// Collect records of a single chromosome into columns, keeping their order.
    ///
    pub fn from_records(records: Vec<TransposonRecord>) -> Result<Self, DataError> {
        let chromosome = records
            .first()
            .map(|r| r.chromosome.clone())
            .unwrap_or_default();

        let mut starts = Vec::with_capacity(records.len());
        let mut stops = Vec::with_capacity(records.len());
        let mut families = Vec::with_capacity(records.len());
        let mut subfamilies = Vec::with_capacity(records.len());

        for record in records {
            if record.chromosome != chromosome {
                return Err(DataError::MixedChromosomes(chromosome, record.chromosome));
            }
            starts.push(record.start);
            stops.push(record.stop);
            families.push(record.family);
            subfamilies.push(record.subfamily);
        }

        let mut data = TransposonData::new(starts, stops)?;
        data.chromosome = chromosome;
        data.families = families;
        data.subfamilies = subfamilies;

        Ok(data)
    }

    pub fn number_elements(&self) -> usize {
        self.starts.len()
    }

    ///
    /// Fail if the coordinate columns do not all have the same length.
    ///
    pub fn check_shape(&self) -> Result<(), DataError> {
        let n = self.starts.len();
        for (name, len) in [("stops", self.stops.len()), ("lengths", self.lengths.len())] {
            if len != n {
                return Err(DataError::ShapeMismatch {
                    left: "starts",
                    left_len: n,
                    right: name,
                    right_len: len,
                });
            }
        }
        Ok(())
    }
}
