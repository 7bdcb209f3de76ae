use std::path::Path;

use ndarray::{Array1, s};
use rstest::*;
use tempfile::TempDir;

use tedensity_core::{GeneData, GeneDatum, Strand, TransposonData};
use tedensity_overlap::{
    ArrayStore, Direction, Overlap, OverlapData, OverlapError, OverlapStoreReader, StoreConfig,
    StoreError, StoreShape,
};

fn gene(name: &str, start: u32, stop: u32) -> GeneDatum {
    GeneDatum {
        name: name.to_string(),
        chromosome: "Fvb1-1".to_string(),
        start,
        stop,
        strand: Strand::Forward,
    }
}

#[fixture]
fn tempdir() -> TempDir {
    tempfile::tempdir().unwrap()
}

#[fixture]
fn genes() -> GeneData {
    GeneData::new(vec![
        gene("FvH4_1g00010", 100, 200),
        gene("FvH4_1g00020", 50, 80),
        gene("FvH4_1g00030", 1000, 1500),
        gene("FvH4_1g00040", 2200, 2300),
        gene("FvH4_1g00050", 0, 40),
    ])
    .unwrap()
}

#[fixture]
fn transposons() -> TransposonData {
    let spans: Vec<(u32, u32)> = vec![
        (180, 220),
        (10, 60),
        (1400, 1700),
        (2000, 2250),
        (5000, 5100),
        (0, 3000),
        (95, 99),
    ];
    TransposonData::new(
        spans.iter().map(|s| s.0).collect(),
        spans.iter().map(|s| s.1).collect(),
    )
    .unwrap()
}

fn store_files(dir: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    fn test_single_gene_scenario(tempdir: TempDir) {
        let genes = GeneData::new(vec![gene("g", 100, 200)]).unwrap();
        let tes = TransposonData::new(vec![180], vec![220]).unwrap();

        let mut overlaps = OverlapData::new(StoreConfig::new(tempdir.path()));
        let path = overlaps.calculate(&genes, &tes, &[50], &["g"], None).unwrap();

        assert!(path.starts_with(tempdir.path()));
        assert_eq!(path.extension().unwrap(), "teo");

        let store = OverlapStoreReader::open(&path).unwrap();
        assert_eq!(store.intra().unwrap()[[0, 0]], 21.0);
        assert_eq!(store.right().unwrap()[[0, 0, 0]], 20.0);
        assert_eq!(store.left().unwrap()[[0, 0, 0]], 0.0);
        assert_eq!(store.chromosome(), Some("Fvb1-1"));
    }

    #[rstest]
    fn test_store_matches_direct_computation(
        tempdir: TempDir,
        genes: GeneData,
        transposons: TransposonData,
    ) {
        let config = StoreConfig::new(tempdir.path()).with_chunk_genes(2);
        let mut overlaps = OverlapData::new(config);
        let names: Vec<&str> = genes.names().collect();
        let windows = [100i64, 25, 1000];

        let path = overlaps
            .calculate(&genes, &transposons, &windows, &names, None)
            .unwrap();
        let store = OverlapStoreReader::open(&path).unwrap();

        let left = store.left().unwrap();
        let right = store.right().unwrap();
        let intra = store.intra().unwrap();
        assert_eq!(left.shape(), &[5, 3, 7]);
        assert_eq!(right.shape(), &[5, 3, 7]);
        assert_eq!(intra.shape(), &[5, 7]);

        for name in names.iter() {
            let g = genes.get_gene(name).unwrap();
            let g_idx = overlaps.gene_index(name).unwrap();
            assert_eq!(store.gene_index(name), Some(g_idx));

            assert_eq!(
                intra.slice(s![g_idx, ..]),
                Overlap::intra(g, &transposons).unwrap()
            );
            for &window in windows.iter() {
                let window = window as u32;
                let w_idx = overlaps.window_index(window).unwrap();
                assert_eq!(store.window_index(window), Some(w_idx));
                assert_eq!(
                    left.slice(s![g_idx, w_idx, ..]),
                    Overlap::left(g, &transposons, window).unwrap()
                );
                assert_eq!(
                    right.slice(s![g_idx, w_idx, ..]),
                    Overlap::right(g, &transposons, window).unwrap()
                );
            }
        }
    }

    #[rstest]
    fn test_truncated_window_near_origin(tempdir: TempDir, genes: GeneData) {
        let tes = TransposonData::new(vec![0, 0], vec![49, 10_000]).unwrap();
        let mut overlaps = OverlapData::new(StoreConfig::new(tempdir.path()));
        let path = overlaps
            .calculate(&genes, &tes, &[100], &["FvH4_1g00020"], None)
            .unwrap();

        let left = OverlapStoreReader::open(&path).unwrap().left().unwrap();
        // gene starts at 50 so the left window is [0, 49], not 100 bp
        assert_eq!(left.slice(s![0, 0, ..]).to_vec(), vec![50.0, 50.0]);
    }

    #[rstest]
    fn test_invalid_requests_are_filtered(
        tempdir: TempDir,
        genes: GeneData,
        transposons: TransposonData,
    ) {
        let mut valid = OverlapData::new(StoreConfig::new(tempdir.path()));
        let valid_path = valid
            .calculate(
                &genes,
                &transposons,
                &[500, 100],
                &["FvH4_1g00030", "FvH4_1g00010"],
                None,
            )
            .unwrap();

        let mut noisy = OverlapData::new(StoreConfig::new(tempdir.path()));
        let noisy_path = noisy
            .calculate(
                &genes,
                &transposons,
                &[-5, 500, 0, 100, 500],
                &["missing", "FvH4_1g00030", "FvH4_1g00010", "FvH4_1g00030"],
                None,
            )
            .unwrap();

        assert_ne!(valid_path, noisy_path);
        assert_eq!(valid.gene_names(), noisy.gene_names());
        assert_eq!(valid.windows(), noisy.windows());
        assert_eq!(noisy.windows(), &[500, 100]);
        assert_eq!(noisy.gene_index("missing"), None);

        let a = OverlapStoreReader::open(&valid_path).unwrap();
        let b = OverlapStoreReader::open(&noisy_path).unwrap();
        assert_eq!(a.shape(), b.shape());
        assert_eq!(a.gene_names(), b.gene_names());
        assert_eq!(a.left().unwrap(), b.left().unwrap());
        assert_eq!(a.right().unwrap(), b.right().unwrap());
        assert_eq!(a.intra().unwrap(), b.intra().unwrap());
    }

    #[rstest]
    fn test_runs_are_deterministic(
        tempdir: TempDir,
        genes: GeneData,
        transposons: TransposonData,
    ) {
        let names: Vec<&str> = genes.names().collect();
        let mut first = OverlapData::new(StoreConfig::new(tempdir.path()).with_chunk_genes(3));
        let mut second = OverlapData::new(StoreConfig::new(tempdir.path()));

        let a = first
            .calculate(&genes, &transposons, &[10, 300], &names, None)
            .unwrap();
        let b = second
            .calculate(&genes, &transposons, &[10, 300], &names, None)
            .unwrap();

        let a = OverlapStoreReader::open(a).unwrap();
        let b = OverlapStoreReader::open(b).unwrap();
        for direction in Direction::ALL {
            assert_eq!(a.read(direction).unwrap(), b.read(direction).unwrap());
        }
    }

    #[rstest]
    fn test_progress_is_called_once_per_gene(
        tempdir: TempDir,
        genes: GeneData,
        transposons: TransposonData,
    ) {
        let mut calls = 0;
        let mut tick = || calls += 1;
        let mut overlaps = OverlapData::new(StoreConfig::new(tempdir.path()));
        overlaps
            .calculate(
                &genes,
                &transposons,
                &[100, 200, 300],
                &["FvH4_1g00010", "nope", "FvH4_1g00040"],
                Some(&mut tick),
            )
            .unwrap();
        assert_eq!(calls, 2);
    }

    #[rstest]
    fn test_missing_output_dir_fails_before_writing(genes: GeneData, transposons: TransposonData) {
        let tempdir = tempfile::tempdir().unwrap();
        let missing = tempdir.path().join("not/here");
        let mut overlaps = OverlapData::new(StoreConfig::new(&missing));

        let result = overlaps.calculate(&genes, &transposons, &[100], &["FvH4_1g00010"], None);

        assert!(matches!(result, Err(OverlapError::Store(StoreError::Io(_)))));
        assert!(overlaps.filepath().is_none());
        assert!(store_files(tempdir.path()).is_empty());
    }

    #[rstest]
    fn test_mismatched_transposons_abort_before_store(tempdir: TempDir, genes: GeneData) {
        let mut tes = TransposonData::new(vec![1, 2], vec![3, 4]).unwrap();
        tes.stops.push(9);

        let mut overlaps = OverlapData::new(StoreConfig::new(tempdir.path()));
        let result = overlaps.calculate(&genes, &tes, &[100], &["FvH4_1g00010"], None);

        assert!(matches!(result, Err(OverlapError::Data(_))));
        assert!(store_files(tempdir.path()).is_empty());
    }

    #[rstest]
    fn test_empty_request_still_writes_store(tempdir: TempDir, genes: GeneData, transposons: TransposonData) {
        let mut overlaps = OverlapData::new(StoreConfig::new(tempdir.path()));
        let path = overlaps
            .calculate::<&str>(&genes, &transposons, &[-1], &[], None)
            .unwrap();

        let store = OverlapStoreReader::open(path).unwrap();
        assert_eq!(store.left().unwrap().shape(), &[0, 0, 7]);
        assert_eq!(store.intra().unwrap().shape(), &[0, 7]);
    }

    #[rstest]
    fn test_left_right_are_chunked_by_gene(tempdir: TempDir) {
        let shape = StoreShape {
            n_genes: 5,
            n_windows: 2,
            n_tes: 3,
        };
        let config = StoreConfig::new(tempdir.path()).with_chunk_genes(2);
        let mut store = ArrayStore::open(shape, &config).unwrap();
        assert_eq!(store.chunk_genes(Direction::Left), 2);
        assert_eq!(store.chunk_genes(Direction::Intra), 5);

        for g in 0..5 {
            let row = Array1::from_elem(3, g as f32 + 0.25);
            store.write_intra(g, row.view()).unwrap();
            for w in 0..2 {
                let row = Array1::from_elem(3, (g * 10 + w) as f32);
                store.write_left(w, g, row.view()).unwrap();
                store.write_right(w, g, row.view()).unwrap();
            }
        }
        let path = store.close().unwrap();

        let reader = OverlapStoreReader::open(&path).unwrap();
        let left = reader.manifest().dataset(Direction::Left).unwrap();
        assert_eq!(left.chunk_shape, vec![2, 2, 3]);
        assert_eq!(left.chunks.len(), 3);
        let intra = reader.manifest().dataset(Direction::Intra).unwrap();
        assert_eq!(intra.chunk_shape, vec![5, 3]);
        assert_eq!(intra.chunks.len(), 1);

        let values = reader.left().unwrap();
        assert_eq!(values[[4, 1, 2]], 41.0);
        assert_eq!(values[[2, 0, 0]], 20.0);
        assert_eq!(reader.intra().unwrap()[[3, 1]], 3.25);
    }

    #[rstest]
    fn test_unwritten_rows_read_as_zero(tempdir: TempDir) {
        let shape = StoreShape {
            n_genes: 4,
            n_windows: 1,
            n_tes: 2,
        };
        let config = StoreConfig::new(tempdir.path()).with_chunk_genes(1);
        let mut store = ArrayStore::open(shape, &config).unwrap();
        store
            .write_left(0, 2, Array1::from_vec(vec![1.5, 2.5]).view())
            .unwrap();
        let path = store.close().unwrap();

        let left = OverlapStoreReader::open(path).unwrap().left().unwrap();
        assert_eq!(left.slice(s![2, 0, ..]).to_vec(), vec![1.5, 2.5]);
        assert!(left.slice(s![0..2, .., ..]).iter().all(|&v| v == 0.0));
        assert!(left.slice(s![3, .., ..]).iter().all(|&v| v == 0.0));
    }

    #[rstest]
    fn test_rewriting_a_sealed_chunk_keeps_other_rows(tempdir: TempDir) {
        let shape = StoreShape {
            n_genes: 2,
            n_windows: 2,
            n_tes: 2,
        };
        let config = StoreConfig::new(tempdir.path()).with_chunk_genes(2);
        let mut store = ArrayStore::open(shape, &config).unwrap();
        for g in 0..2 {
            for w in 0..2 {
                let row = Array1::from_elem(2, (g * 2 + w) as f32);
                store.write_left(w, g, row.view()).unwrap();
            }
        }
        // chunk 0 is sealed by now; write one of its rows again
        store
            .write_left(1, 0, Array1::from_elem(2, 9.0).view())
            .unwrap();
        let path = store.close().unwrap();

        let left = OverlapStoreReader::open(path).unwrap().left().unwrap();
        assert_eq!(left[[0, 0, 0]], 0.0);
        assert_eq!(left[[0, 1, 0]], 9.0);
        assert_eq!(left[[1, 0, 1]], 2.0);
        assert_eq!(left[[1, 1, 1]], 3.0);
    }

    #[rstest]
    fn test_bad_writes_are_rejected(tempdir: TempDir) {
        let shape = StoreShape {
            n_genes: 2,
            n_windows: 1,
            n_tes: 3,
        };
        let mut store = ArrayStore::open(shape, &StoreConfig::new(tempdir.path())).unwrap();
        let row = Array1::<f32>::zeros(3);

        assert!(matches!(
            store.write_left(0, 2, row.view()),
            Err(StoreError::OutOfRange { axis: "gene", .. })
        ));
        assert!(matches!(
            store.write_right(1, 0, row.view()),
            Err(StoreError::OutOfRange { axis: "window", .. })
        ));
        assert!(matches!(
            store.write_intra(0, Array1::<f32>::zeros(2).view()),
            Err(StoreError::RowLength { expected: 3, found: 2, .. })
        ));

        store.close().unwrap();
        assert!(!store.is_open());
        assert!(matches!(
            store.write_intra(0, row.view()),
            Err(StoreError::Closed)
        ));
        // closing twice is fine
        store.close().unwrap();
    }

    #[rstest]
    fn test_dropped_store_is_still_readable(tempdir: TempDir) {
        let shape = StoreShape {
            n_genes: 3,
            n_windows: 1,
            n_tes: 1,
        };
        let path = {
            let mut store = ArrayStore::open(shape, &StoreConfig::new(tempdir.path())).unwrap();
            store
                .write_intra(1, Array1::from_elem(1, 7.0).view())
                .unwrap();
            store.filepath().to_path_buf()
        };

        let intra = OverlapStoreReader::open(path).unwrap().intra().unwrap();
        assert_eq!(intra.column(0).to_vec(), vec![0.0, 7.0, 0.0]);
    }

    #[rstest]
    fn test_fractional_values_round_trip(tempdir: TempDir) {
        let shape = StoreShape {
            n_genes: 1,
            n_windows: 1,
            n_tes: 4,
        };
        let values = Array1::from_vec(vec![0.1f32, 1.0 / 3.0, 1e-7, 123456.79]);
        let mut store = ArrayStore::open(shape, &StoreConfig::new(tempdir.path())).unwrap();
        store.write_right(0, 0, values.view()).unwrap();
        let path = store.close().unwrap();

        let right = OverlapStoreReader::open(path).unwrap().right().unwrap();
        for (read, written) in right.iter().zip(values.iter()) {
            assert_eq!(read.to_bits(), written.to_bits());
        }
    }

    #[rstest]
    fn test_set_index_checks_lengths(tempdir: TempDir) {
        let shape = StoreShape {
            n_genes: 1,
            n_windows: 2,
            n_tes: 1,
        };
        let mut store = ArrayStore::open(shape, &StoreConfig::new(tempdir.path())).unwrap();
        let result = store.set_index(tedensity_overlap::StoreIndex {
            chromosome: None,
            gene_names: vec!["a".to_string()],
            windows: vec![100],
        });
        assert!(matches!(result, Err(StoreError::IndexMismatch(_))));
    }

    #[rstest]
    fn test_reader_rejects_foreign_file(tempdir: TempDir) {
        let path = tempdir.path().join("genes.teo");
        std::fs::write(&path, vec![0u8; 64]).unwrap();
        assert!(matches!(
            OverlapStoreReader::open(&path),
            Err(StoreError::Corrupt(_))
        ));
    }
}
