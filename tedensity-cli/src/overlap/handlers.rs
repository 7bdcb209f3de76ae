use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use tedensity_core::io::{
    genes_by_chromosome, read_genes, read_transposons, transposons_by_chromosome,
};
use tedensity_core::{GeneData, TransposonData};
use tedensity_overlap::{OverlapData, StoreConfig};

use super::cli::{DEFAULT_INCREMENT, DEFAULT_MAX_WINDOW, DEFAULT_OUTPUT_DIR, DEFAULT_WINDOW};

pub fn run_overlap(matches: &ArgMatches) -> Result<()> {
    // get arguments from CLI
    let genes_file = matches
        .get_one::<String>("genes")
        .expect("A path to a gene annotation file is required.");

    let transposons_file = matches
        .get_one::<String>("transposons")
        .expect("A path to a transposon annotation file is required.");

    let default_out = DEFAULT_OUTPUT_DIR.to_string();
    let output_dir = matches
        .get_one::<String>("output-dir")
        .unwrap_or(&default_out);

    let window = *matches.get_one::<u32>("window").unwrap_or(&DEFAULT_WINDOW);
    let increment = *matches
        .get_one::<u32>("increment")
        .unwrap_or(&DEFAULT_INCREMENT);
    let max_window = *matches
        .get_one::<u32>("max-window")
        .unwrap_or(&DEFAULT_MAX_WINDOW);
    let drop_contigs = matches.get_flag("drop-contigs");

    // coerce arguments to types
    let genes_path = PathBuf::from(genes_file);
    let transposons_path = PathBuf::from(transposons_file);
    let output_dir = PathBuf::from(output_dir);
    validate_paths(&genes_path, &transposons_path, &output_dir)?;

    let windows = window_range(window, increment, max_window)?;
    info!("windows are {}:{}:{} --> {:?}", window, increment, max_window, windows);

    let mut config = StoreConfig::new(&output_dir);
    if let Some(&chunk_genes) = matches.get_one::<usize>("chunk-genes") {
        config = config.with_chunk_genes(chunk_genes);
    }

    info!("importing genes from {}", genes_path.display());
    let genes = genes_by_chromosome(read_genes(&genes_path, drop_contigs)?)?;
    info!("importing transposons from {}", transposons_path.display());
    let transposons = transposons_by_chromosome(read_transposons(&transposons_path)?)?;

    let stores = overlap_by_chromosome(&genes, &transposons, &windows, &config)?;
    for (chromosome, path) in stores.iter() {
        info!("{}\t{}", chromosome, path.display());
    }

    Ok(())
}

fn validate_paths(genes: &Path, transposons: &Path, output_dir: &Path) -> Result<()> {
    if !genes.is_file() {
        anyhow::bail!("gene annotation {} is not a file", genes.display());
    }
    if !transposons.is_file() {
        anyhow::bail!("transposon annotation {} is not a file", transposons.display());
    }
    if !output_dir.is_dir() {
        anyhow::bail!("output directory {} is not a directory", output_dir.display());
    }
    Ok(())
}

///
/// Window sizes `window, window + increment, ...` up to and including `max_window`.
///
pub fn window_range(window: u32, increment: u32, max_window: u32) -> Result<Vec<i64>> {
    if window == 0 {
        anyhow::bail!("window must be positive");
    }
    if increment == 0 {
        anyhow::bail!("increment must be positive");
    }
    if max_window < window {
        anyhow::bail!("max window {} is smaller than window {}", max_window, window);
    }

    Ok((window..=max_window)
        .step_by(increment as usize)
        .map(i64::from)
        .collect())
}

///
/// Run one overlap calculation per chromosome present in both annotations.
///
/// # Returns
/// The store written for each chromosome.
pub fn overlap_by_chromosome(
    genes: &BTreeMap<String, GeneData>,
    transposons: &BTreeMap<String, TransposonData>,
    windows: &[i64],
    config: &StoreConfig,
) -> Result<BTreeMap<String, PathBuf>> {
    for chromosome in genes.keys().filter(|c| !transposons.contains_key(*c)) {
        warn!("no transposons on {}, skipping its genes", chromosome);
    }
    for chromosome in transposons.keys().filter(|c| !genes.contains_key(*c)) {
        warn!("no genes on {}, skipping its transposons", chromosome);
    }

    let mut stores = BTreeMap::new();
    for (chromosome, gene_data) in genes.iter() {
        let Some(te_data) = transposons.get(chromosome) else {
            continue;
        };

        let bar = ProgressBar::new(gene_data.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
            )?
            .progress_chars("##-"),
        );
        bar.set_message(chromosome.clone());

        let names: Vec<&str> = gene_data.names().collect();
        let mut overlaps = OverlapData::new(config.clone());
        let mut tick = || bar.inc(1);
        let path = overlaps
            .calculate(gene_data, te_data, windows, &names, Some(&mut tick))
            .with_context(|| format!("overlap failed for {}", chromosome))?;
        bar.finish_and_clear();

        stores.insert(chromosome.clone(), path);
    }

    Ok(stores)
}
