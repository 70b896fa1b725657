use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::errors::{DomainError, Result};
use crate::models::intensity_matrix::IntensityMatrix;
use crate::models::peak::Peak;

/// Biller-Biemann multi-scan peak detection.
///
/// Phase 1 marks, per scan, the mass bins that are strict local maxima
/// within a window of `points` consecutive bins. Phase 2 slides a window of
/// `scans` consecutive scans and emits one peak whenever the same mass bin
/// (within `bin_tolerance` bins) apexes in a majority of the window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillerBiemann {
    pub points: usize,
    pub scans: usize,
    pub bin_tolerance: usize,
}

impl Default for BillerBiemann {
    fn default() -> Self {
        BillerBiemann {
            points: 3,
            scans: 1,
            bin_tolerance: 1,
        }
    }
}

/// Apex candidates of one resampled scan: bin `c` is a candidate iff it
/// holds the maximum of the `points`-wide window centred on it, the window
/// is not flat, and no earlier bin in the window ties it (leftmost wins
/// exact ties). Bins whose window does not fit inside the row yield nothing.
fn apex_candidates(row: &[f64], points: usize) -> Vec<usize> {
    let n = row.len();
    let mut out = Vec::new();
    if n < points {
        return out;
    }
    let half = points / 2;
    for centre in half..(n - half) {
        let window = &row[centre - half..centre + half + 1];
        let value = row[centre];
        let max = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = window.iter().cloned().fold(f64::INFINITY, f64::min);
        if value < max || max == min {
            continue;
        }
        if window[..half].iter().any(|v| *v == value) {
            continue;
        }
        out.push(centre);
    }
    out
}

/// Group the sorted candidate bins of one scan window into clusters no more
/// than `tolerance` bins apart, and return the bins of every cluster seen by
/// at least `threshold` distinct scans.
fn qualifying_bins(
    window_candidates: &[&Vec<usize>],
    tolerance: usize,
    threshold: usize,
) -> Vec<usize> {
    let mut tagged: Vec<(usize, usize)> = Vec::new();
    for (row_offset, bins) in window_candidates.iter().enumerate() {
        for bin in bins.iter() {
            tagged.push((*bin, row_offset));
        }
    }
    if tagged.is_empty() {
        return Vec::new();
    }
    tagged.sort_unstable();

    let mut qualifying = Vec::new();
    let mut cluster_start = 0;
    for i in 1..=tagged.len() {
        let cluster_ends = i == tagged.len() || tagged[i].0 - tagged[i - 1].0 > tolerance;
        if !cluster_ends {
            continue;
        }
        let cluster = &tagged[cluster_start..i];
        let mut rows: Vec<usize> = cluster.iter().map(|(_, row)| *row).collect();
        rows.sort_unstable();
        rows.dedup();
        if rows.len() >= threshold {
            qualifying.extend(cluster.iter().map(|(bin, _)| *bin));
        }
        cluster_start = i;
    }
    qualifying.sort_unstable();
    qualifying.dedup();
    qualifying
}

impl BillerBiemann {
    pub fn new(points: usize, scans: usize) -> Self {
        BillerBiemann {
            points,
            scans,
            bin_tolerance: 1,
        }
    }

    /// Detect peaks on the (smoothed, baseline-corrected) matrix. The output
    /// is ordered by retention time; every peak carries the winning scan's
    /// full spectrum and neither bounds nor area yet.
    #[instrument(name = "BillerBiemann::detect", skip(self, im))]
    pub fn detect(&self, im: &IntensityMatrix) -> Result<Vec<Peak>> {
        if self.points < 3 || self.points % 2 == 0 {
            return Err(DomainError::InvalidPoints(self.points).into());
        }
        if self.scans < 1 {
            return Err(DomainError::InvalidScans(self.scans).into());
        }
        let start = Instant::now();
        let (n_scans, n_mz) = im.size();
        if self.points > n_mz {
            warn!(
                "apex window of {} points exceeds the {} mass bins; no peaks can be found",
                self.points, n_mz
            );
        }

        // Phase 1: rows are independent
        let candidates: Vec<Vec<usize>> = (0..n_scans)
            .into_par_iter()
            .map(|row| apex_candidates(im.row(row), self.points))
            .collect();

        // Phase 2: sliding consensus; a qualifying window consumes its
        // candidates so one chemical peak spanning several scans emits once.
        let threshold = self.scans / 2 + 1;
        let mut peaks: Vec<Peak> = Vec::new();
        let mut w = 0;
        while w + self.scans <= n_scans {
            let window: Vec<&Vec<usize>> = candidates[w..w + self.scans].iter().collect();
            let bins = qualifying_bins(&window, self.bin_tolerance, threshold);
            if bins.is_empty() {
                w += 1;
                continue;
            }
            let mut winner = w;
            let mut best = f64::NEG_INFINITY;
            for row in w..w + self.scans {
                let score: f64 = candidates[row]
                    .iter()
                    .filter(|bin| bins.binary_search(*bin).is_ok())
                    .map(|bin| im.intensity_at(row, *bin))
                    .sum();
                // Earliest scan wins exact ties
                if score > best {
                    best = score;
                    winner = row;
                }
            }
            peaks.push(Peak::new(
                im.time_list()[winner],
                im.get_ms_at_index(winner)?,
            ));
            w += self.scans;
        }

        debug!("consensus threshold {} of {} scans", threshold, self.scans);
        info!("found {} peaks in {:#?}", peaks.len(), start.elapsed());
        Ok(peaks)
    }
}
