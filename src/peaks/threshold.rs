use tracing::debug;

use crate::errors::{DomainError, Result};
use crate::models::peak::Peak;

/// Zero every ion below `percent`% of its peak's own maximum intensity.
///
/// Shrinks spectra, never removes peaks: the returned list has the same
/// length and order. Takes the list by value; clone first when the
/// unfiltered peaks are still needed.
pub fn rel_threshold(mut peaks: Vec<Peak>, percent: f64) -> Result<Vec<Peak>> {
    if percent <= 0.0 {
        return Err(DomainError::NonPositivePercent(percent).into());
    }
    for peak in peaks.iter_mut() {
        let cutoff = peak.mass_spectrum().max_intensity() * percent / 100.0;
        for intensity in peak.mass_spectrum_mut().mass_spec_mut() {
            if *intensity < cutoff {
                *intensity = 0.0;
            }
        }
    }
    Ok(peaks)
}

/// Keep only peaks with at least `n` ions of intensity >= `cutoff`,
/// preserving order. Takes the list by value; clone first when the
/// unfiltered peaks are still needed.
pub fn num_ions_threshold(peaks: Vec<Peak>, n: usize, cutoff: f64) -> Vec<Peak> {
    let before = peaks.len();
    let kept: Vec<Peak> = peaks
        .into_iter()
        .filter(|peak| {
            let ions = peak
                .mass_spectrum()
                .mass_spec()
                .iter()
                .filter(|i| **i >= cutoff)
                .count();
            ions >= n
        })
        .collect();
    debug!("num_ions_threshold kept {} of {} peaks", kept.len(), before);
    kept
}
