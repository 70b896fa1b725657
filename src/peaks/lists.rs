use std::collections::BTreeMap;

use tracing::debug;

use crate::errors::{DomainError, InvalidInputError, Result};
use crate::models::peak::Peak;
use crate::models::spectrum::MassSpectrum;
use crate::utils::stats::median_outlier_mask;
use crate::utils::time::time_str_secs;

// median_outlier_mask threshold, and the smallest group worth screening.
const OUTLIER_MAD_FACTOR: f64 = 2.5;
const MIN_PEAKS_FOR_SCREENING: usize = 4;

/// Merge peaks believed to represent the same underlying chemical peak
/// (e.g. the same compound across replicate runs).
///
/// The result's spectrum is the per-mass average over the union mass axis
/// (a mass absent from one peak contributes zero there) and its retention
/// time is the arithmetic mean of the input times; bounds and areas of the
/// ancestors are discarded. With `ignore_outliers` and at least four peaks,
/// each mass channel is screened by median absolute deviation and outlying
/// contributions are dropped from that channel's average; the affected
/// input peaks get their `is_outlier` flag set. Callers that must keep
/// their originals untouched pass clones.
pub fn composite_peak(peaks: &mut [Peak], ignore_outliers: bool) -> Result<Peak> {
    if peaks.is_empty() {
        return Err(InvalidInputError::EmptyPeakList.into());
    }
    let n = peaks.len();
    let avg_rt = peaks.iter().map(Peak::rt).sum::<f64>() / n as f64;

    // Union mass axis, keyed by milli-mass so float bin centres stay exact
    let mut channels: BTreeMap<u64, Vec<f64>> = BTreeMap::new();
    for (pi, peak) in peaks.iter().enumerate() {
        let spectrum = peak.mass_spectrum();
        for (mass, intensity) in spectrum.mass_list().iter().zip(spectrum.mass_spec()) {
            let key = (mass * 1000.0).round() as u64;
            channels.entry(key).or_insert_with(|| vec![0.0; n])[pi] = *intensity;
        }
    }

    let screen = ignore_outliers && n >= MIN_PEAKS_FOR_SCREENING;
    let mut mass_list = Vec::with_capacity(channels.len());
    let mut mass_spec = Vec::with_capacity(channels.len());
    let mut outliers_hit = 0usize;
    for (key, values) in channels {
        let average = if screen {
            let mask = median_outlier_mask(&values, OUTLIER_MAD_FACTOR);
            for (pi, flagged) in mask.iter().enumerate() {
                if *flagged {
                    peaks[pi].set_outlier(true);
                    outliers_hit += 1;
                }
            }
            let kept: Vec<f64> = values
                .iter()
                .zip(&mask)
                .filter(|(_, flagged)| !**flagged)
                .map(|(v, _)| *v)
                .collect();
            kept.iter().sum::<f64>() / kept.len() as f64
        } else {
            values.iter().sum::<f64>() / n as f64
        };
        mass_list.push(key as f64 / 1000.0);
        mass_spec.push(average);
    }
    if screen {
        debug!(
            "composite of {} peaks dropped {} outlying channel contributions",
            n, outliers_hit
        );
    }

    Ok(Peak::new(avg_rt, MassSpectrum::new(mass_list, mass_spec)?))
}

/// Peaks whose retention time falls inside `[lower, upper)`, with the
/// bounds given as time tokens (`"12m"`, `"720s"`, `"720"`), order
/// preserved.
pub fn select_peaks_by_rt(peaks: &[Peak], rt_range: (&str, &str)) -> Result<Vec<Peak>> {
    let lower = time_str_secs(rt_range.0)?;
    let upper = time_str_secs(rt_range.1)?;
    if lower >= upper {
        return Err(DomainError::RtRangeOrder { lower, upper }.into());
    }
    Ok(peaks
        .iter()
        .filter(|peak| peak.rt() >= lower && peak.rt() < upper)
        .cloned()
        .collect())
}
