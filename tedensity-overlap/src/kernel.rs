use std::fmt::{self, Display};

use ndarray::{Array1, ArrayView1, Zip};

use tedensity_core::{GeneDatum, TransposonData};

use crate::errors::OverlapError;

/// Where the overlap is calculated relative to the gene.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy)]
pub enum Direction {
    Left,
    Intra,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Left, Direction::Intra, Direction::Right];

    /// Dataset name in a persisted store.
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Intra => "intra",
            Direction::Right => "right",
        }
    }

    pub fn from_name(name: &str) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.name() == name)
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

///
/// Base pair overlap between one gene's regions and every transposon.
///
/// Each function returns one value per TE, in the TE collection's order.
/// Regions are closed on both ends.
///
pub struct Overlap;

impl Overlap {
    ///
    /// Overlap with the window left of (before) the gene.
    ///
    /// The window is truncated at coordinate 0, so a gene at 50 with a window
    /// of 100 is scored against `[0, 49]`.
    pub fn left(
        gene: &GeneDatum,
        transposons: &TransposonData,
        window: u32,
    ) -> Result<Array1<f32>, OverlapError> {
        let w_len = gene.win_length(window);
        let w_0 = gene.left_win_start(w_len);
        let w_1 = gene.left_win_stop();
        clipped_overlap(w_0, w_1, transposons)
    }

    /// Overlap with the gene body.
    pub fn intra(
        gene: &GeneDatum,
        transposons: &TransposonData,
    ) -> Result<Array1<f32>, OverlapError> {
        clipped_overlap(gene.start as i64, gene.stop as i64, transposons)
    }

    ///
    /// Overlap with the window right of (after) the gene.
    ///
    /// Uses the same effective window length as [Overlap::left] so both flanks
    /// of a gene share one denominator.
    pub fn right(
        gene: &GeneDatum,
        transposons: &TransposonData,
        window: u32,
    ) -> Result<Array1<f32>, OverlapError> {
        let w_len = gene.win_length(window);
        let w_0 = gene.right_win_start();
        let w_1 = gene.right_win_stop(w_len);
        clipped_overlap(w_0, w_1, transposons)
    }

    pub fn calculate(
        direction: Direction,
        gene: &GeneDatum,
        transposons: &TransposonData,
        window: u32,
    ) -> Result<Array1<f32>, OverlapError> {
        match direction {
            Direction::Left => Overlap::left(gene, transposons, window),
            Direction::Intra => Overlap::intra(gene, transposons),
            Direction::Right => Overlap::right(gene, transposons, window),
        }
    }
}

/// Clip every TE to `[w_0, w_1]` and take the clipped length, floored at zero.
fn clipped_overlap(
    w_0: i64,
    w_1: i64,
    transposons: &TransposonData,
) -> Result<Array1<f32>, OverlapError> {
    transposons.check_shape()?;

    let starts = ArrayView1::from(transposons.starts.as_slice());
    let stops = ArrayView1::from(transposons.stops.as_slice());

    Ok(Zip::from(&starts).and(&stops).map_collect(|&start, &stop| {
        let lower_bound = w_0.max(start as i64);
        let upper_bound = w_1.min(stop as i64);
        (upper_bound - lower_bound + 1).max(0) as f32
    }))
}
