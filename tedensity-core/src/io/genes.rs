use std::io::BufRead;
use std::path::Path;

use anyhow::Result;

use crate::errors::DataError;
use crate::io::{parse_coordinate, split_fields};
use crate::models::{GeneDatum, Strand};
use crate::utils::get_dynamic_reader;

const GENE_FEATURE: &str = "gene";
const CONTIG_MARKER: &str = "contig";

///
/// Read the `gene` rows of an annotation file.
///
/// # Arguments
/// - path: annotation file, optionally gzipped.
/// - drop_contigs: skip rows whose chromosome id names a contig.
pub fn read_genes(path: &Path, drop_contigs: bool) -> Result<Vec<GeneDatum>> {
    let reader = get_dynamic_reader(path)?;
    let mut genes = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        if let Some(gene) = parse_gene_line(&line, idx + 1)? {
            if drop_contigs && gene.chromosome.contains(CONTIG_MARKER) {
                continue;
            }
            genes.push(gene);
        }
    }

    log::debug!("read {} genes from {}", genes.len(), path.display());

    Ok(genes)
}

///
/// Parse one annotation line; non-gene features yield `None`.
///
pub fn parse_gene_line(line: &str, line_number: usize) -> Result<Option<GeneDatum>, DataError> {
    let fields = split_fields(line);
    if fields.len() < 9 {
        return Err(DataError::Parse {
            line: line_number,
            reason: format!("expected 9 columns, found {}", fields.len()),
        });
    }

    if fields[2] != GENE_FEATURE {
        return Ok(None);
    }

    let start = parse_coordinate(fields[3], "start", line_number)?;
    let stop = parse_coordinate(fields[4], "stop", line_number)?;
    let strand = fields[6].parse::<Strand>().map_err(|reason| DataError::Parse {
        line: line_number,
        reason,
    })?;
    let name = gene_name(fields[8]).ok_or_else(|| DataError::Parse {
        line: line_number,
        reason: format!("no gene name in attributes '{}'", fields[8]),
    })?;

    Ok(Some(GeneDatum {
        name: name.to_string(),
        chromosome: fields[0].to_string(),
        start,
        stop,
        strand,
    }))
}

/// Gene name from the attribute column: the value of `Name=`, else `ID=`.
fn gene_name(attributes: &str) -> Option<&str> {
    if let Some((_, name)) = attributes.split_once(";Name=") {
        return Some(name.split(';').next().unwrap_or(name)).filter(|n| !n.is_empty());
    }

    let mut id = None;
    for pair in attributes.split(';') {
        match pair.split_once('=') {
            Some(("Name", value)) if !value.is_empty() => return Some(value),
            Some(("ID", value)) if !value.is_empty() => id = Some(value),
            _ => {}
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("ID=gene:FvH4_1g00010;Name=FvH4_1g00010", Some("FvH4_1g00010"))]
    #[case("ID=g1;Name=maker-1;Note=x", Some("maker-1"))]
    #[case("Name=only", Some("only"))]
    #[case("ID=fallback", Some("fallback"))]
    #[case("Note=nothing", None)]
    fn test_gene_name(#[case] attributes: &str, #[case] expected: Option<&str>) {
        assert_eq!(gene_name(attributes), expected);
    }

    #[rstest]
    fn test_parse_gene_line() {
        let line = "Fvb1-1\tmaker\tgene\t41\t2396\t.\t+\t.\tID=g1;Name=FvH4_1g00010";
        let gene = parse_gene_line(line, 1).unwrap().unwrap();
        assert_eq!(gene.name, "FvH4_1g00010");
        assert_eq!(gene.chromosome, "Fvb1-1");
        assert_eq!((gene.start, gene.stop), (41, 2396));
        assert_eq!(gene.strand, Strand::Forward);
    }

    #[rstest]
    fn test_parse_gene_line_skips_other_features() {
        let line = "Fvb1-1\tmaker\tmRNA\t41\t2396\t.\t+\t.\tID=m1;Name=FvH4_1g00010-T1";
        assert!(parse_gene_line(line, 1).unwrap().is_none());
    }

    #[rstest]
    #[case("Fvb1-1\tmaker\tgene\t41\t2396")]
    #[case("Fvb1-1\tmaker\tgene\tx\t2396\t.\t+\t.\tName=a")]
    #[case("Fvb1-1\tmaker\tgene\t41\t2396\t.\t*\t.\tName=a")]
    #[case("Fvb1-1\tmaker\tgene\t41\t2396\t.\t+\t.\tNote=a")]
    fn test_parse_gene_line_malformed(#[case] line: &str) {
        assert!(matches!(
            parse_gene_line(line, 3),
            Err(DataError::Parse { line: 3, .. })
        ));
    }
}
