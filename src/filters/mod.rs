use std::time::Instant;

use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::errors::Result;
use crate::models::intensity_matrix::IntensityMatrix;
use crate::models::ion_chromatogram::IonChromatogram;
use crate::utils::time::{duration_to_odd_points, nearest_odd, time_str_secs};

pub mod savitzky_golay;
pub mod tophat;

/// A window size for the chromatogram filters: either a raw point count or a
/// time duration resolved against the chromatogram's actual average sample
/// spacing (the acquisition grid is irregular, so a duration cannot map to a
/// fixed count up front).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Window {
    Points(usize),
    DurationSecs(f64),
}

impl Window {
    /// Parse a `"1.5m"` / `"90s"` / `"90"` duration token.
    pub fn parse(token: &str) -> Result<Self> {
        Ok(Window::DurationSecs(time_str_secs(token)?))
    }

    /// Resolve to an odd point count >= 1 on the given chromatogram.
    pub(crate) fn to_points(self, ic: &IonChromatogram) -> usize {
        match self {
            Window::Points(n) => nearest_odd(n.max(1)),
            Window::DurationSecs(secs) => duration_to_odd_points(secs, ic.time_step()),
        }
    }
}

impl From<usize> for Window {
    fn from(points: usize) -> Self {
        Window::Points(points)
    }
}

/// One noise/baseline correction step over a single ion chromatogram.
/// Implementations are pure: same IC and parameters in, same IC out, no
/// state retained between calls.
pub trait IcFilter: Send + Sync {
    fn filter_ic(&self, ic: &IonChromatogram) -> Result<IonChromatogram>;
}

/// Run a filter chain over every mass bin of the matrix and write the
/// corrected chromatograms back.
///
/// Columns are independent, so the chain fans out over a rayon pool; the
/// matrix is only written once every column has succeeded, so a failing
/// column leaves it unmodified.
#[instrument(name = "filter_ics_in_place", skip(im, filters))]
pub fn filter_ics_in_place(im: &mut IntensityMatrix, filters: &[&dyn IcFilter]) -> Result<()> {
    let start = Instant::now();
    let (_, n_mz) = im.size();
    let ics: Vec<IonChromatogram> = (0..n_mz)
        .map(|col| im.get_ic_at_index(col))
        .collect::<Result<_>>()?;

    let corrected: Vec<IonChromatogram> = ics
        .into_par_iter()
        .progress_count(n_mz as u64)
        .map(|ic| {
            filters
                .iter()
                .try_fold(ic, |current, filter| filter.filter_ic(&current))
        })
        .collect::<Result<_>>()?;

    for (col, ic) in corrected.iter().enumerate() {
        im.set_ic_at_index(col, ic)?;
    }
    info!(
        "filtered {} ion chromatograms in {:#?}",
        n_mz,
        start.elapsed()
    );
    Ok(())
}
