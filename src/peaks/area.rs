use tracing::debug;

use crate::errors::{DomainError, Result};
use crate::models::intensity_matrix::IntensityMatrix;
use crate::models::peak::{IonAreas, Peak};

// A neighbour may rise this many percent above the previous point before
// the walk calls it a local minimum and stops.
const BOUND_TOL_PCT: f64 = 0.5;

/// Conventional ion count for [`peak_top_ion_areas`].
pub const DEFAULT_TOP_IONS: usize = 5;

/// Walk outward from the apex until the first local minimum (the next point
/// rises more than the tolerance) or, when `max_bound` is non-zero, until
/// that many steps were taken. Returns the boundary index.
fn boundary(values: &[f64], apex: usize, max_bound: usize, leftward: bool) -> usize {
    let mut idx = apex;
    let mut steps = 0;
    loop {
        if max_bound > 0 && steps >= max_bound {
            return idx;
        }
        let next = if leftward {
            match idx.checked_sub(1) {
                Some(n) => n,
                None => return idx,
            }
        } else {
            if idx + 1 >= values.len() {
                return idx;
            }
            idx + 1
        };
        if values[next] > values[idx] * (1.0 + BOUND_TOL_PCT / 100.0) {
            return idx;
        }
        idx = next;
        steps += 1;
    }
}

/// Trapezoidal sum of `values[left..=right]` over the matching times.
fn trapezoid(times: &[f64], values: &[f64], left: usize, right: usize) -> f64 {
    (left..right)
        .map(|i| (times[i + 1] - times[i]) * (values[i] + values[i + 1]) / 2.0)
        .sum()
}

fn column(im: &IntensityMatrix, col: usize) -> Vec<f64> {
    (0..im.size().0).map(|row| im.intensity_at(row, col)).collect()
}

fn apex_index(im: &IntensityMatrix, peak: &Peak) -> Result<usize> {
    match peak.bounds() {
        Some((_, apex, _)) => Ok(apex),
        None => im.get_index_at_time(peak.rt()),
    }
}

fn ion_area(
    im: &IntensityMatrix,
    mass: f64,
    apex: usize,
    max_bound: usize,
) -> Result<(f64, usize, usize)> {
    let col = im.get_index_of_mass(mass)?;
    let values = column(im, col);
    let left = boundary(&values, apex, max_bound, true);
    let right = boundary(&values, apex, max_bound, false);
    let area = trapezoid(im.time_list(), &values, left, right);
    if area < 0.0 {
        return Err(DomainError::NegativeArea { mass, area }.into());
    }
    Ok((area, left, right))
}

/// Integrated area of a peak: the sum of per-ion trapezoidal areas over
/// every non-zero mass in its spectrum, each bounded by the first local
/// minimum on either side of the apex. Store the result with
/// [`Peak::set_area`].
pub fn peak_sum_area(im: &IntensityMatrix, peak: &Peak, max_bound: usize) -> Result<f64> {
    if peak.mass_spectrum().is_empty() {
        return Err(DomainError::EmptyMassSpectrum.into());
    }
    let apex = apex_index(im, peak)?;
    let mut sum = 0.0;
    for (mass, intensity) in peak
        .mass_spectrum()
        .mass_list()
        .iter()
        .zip(peak.mass_spectrum().mass_spec())
    {
        if *intensity <= 0.0 {
            continue;
        }
        let (area, _, _) = ion_area(im, *mass, apex, max_bound)?;
        sum += area;
    }
    debug!("peak at rt {:.2} integrates to {}", peak.rt(), sum);
    Ok(sum)
}

/// Individual areas for the peak's `n_top_ions` most intense ions, keyed by
/// integer mass. Store the result with [`Peak::set_ion_areas`].
pub fn peak_top_ion_areas(
    im: &IntensityMatrix,
    peak: &Peak,
    n_top_ions: usize,
    max_bound: usize,
) -> Result<IonAreas> {
    if peak.mass_spectrum().is_empty() {
        return Err(DomainError::EmptyMassSpectrum.into());
    }
    let apex = apex_index(im, peak)?;
    let mut areas = IonAreas::default();
    for mass in peak.top_ions(n_top_ions) {
        let (area, _, _) = ion_area(im, mass, apex, max_bound)?;
        areas.insert(mass.round() as u32, area);
    }
    Ok(areas)
}
