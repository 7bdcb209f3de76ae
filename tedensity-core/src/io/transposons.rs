use std::io::BufRead;
use std::path::Path;

use anyhow::Result;

use crate::errors::DataError;
use crate::families::is_dropped_family;
use crate::io::{parse_coordinate, split_fields};
use crate::models::{Strand, TransposonRecord};
use crate::utils::get_dynamic_reader;

///
/// Read every transposable element of an annotation file.
///
/// The feature column holds the `Family/SubFamily` classification. Simple
/// repeats are not transposons and are dropped.
pub fn read_transposons(path: &Path) -> Result<Vec<TransposonRecord>> {
    let reader = get_dynamic_reader(path)?;
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let record = parse_transposon_line(&line, idx + 1)?;
        if is_dropped_family(&record.family) {
            dropped += 1;
            continue;
        }
        records.push(record);
    }

    log::debug!(
        "read {} transposons from {} ({} dropped)",
        records.len(),
        path.display(),
        dropped
    );

    Ok(records)
}

pub fn parse_transposon_line(line: &str, line_number: usize) -> Result<TransposonRecord, DataError> {
    let fields = split_fields(line);
    if fields.len() < 7 {
        return Err(DataError::Parse {
            line: line_number,
            reason: format!("expected at least 7 columns, found {}", fields.len()),
        });
    }

    let start = parse_coordinate(fields[3], "start", line_number)?;
    let stop = parse_coordinate(fields[4], "stop", line_number)?;
    if stop < start {
        return Err(DataError::InvertedCoordinates {
            what: format!("transposon on line {}", line_number),
            start,
            stop,
        });
    }
    let strand = fields[6].parse::<Strand>().map_err(|reason| DataError::Parse {
        line: line_number,
        reason,
    })?;

    let mut record = TransposonRecord {
        chromosome: fields[0].to_string(),
        start,
        stop,
        strand,
        family: String::new(),
        subfamily: String::new(),
    };
    record.set_classification(fields[2]);

    Ok(record)
}
