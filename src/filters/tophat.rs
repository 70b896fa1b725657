use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, Result};
use crate::filters::{IcFilter, Window};
use crate::models::ion_chromatogram::IonChromatogram;
use crate::utils::time::nearest_odd;

// Structuring element size as a fraction of the chromatogram when the
// caller does not specify one.
const STRUCT_ELM_FRAC: f64 = 0.2;

/// White top-hat baseline correction: subtract the morphological opening
/// (erosion then dilation over a sliding structuring element) from the
/// original signal, removing the slowly varying baseline and keeping
/// features narrower than the structuring element.
///
/// The structuring element is given as a point count or a time duration
/// (e.g. `"1.5m"`), resolved against the chromatogram's average sample
/// spacing and rounded to the nearest odd count. Values below zero are not
/// clamped here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TopHat {
    pub structure: Option<Window>,
}

impl TopHat {
    pub fn new(structure: Window) -> Self {
        TopHat {
            structure: Some(structure),
        }
    }

    /// Structuring element from a duration token such as `"1.5m"`.
    pub fn from_struct_str(token: &str) -> Result<Self> {
        Ok(TopHat {
            structure: Some(Window::parse(token)?),
        })
    }
}

/// Sliding-window minimum (erosion) or maximum (dilation) with windows
/// clamped at the signal borders.
fn morph_sweep(values: &[f64], half: usize, take_min: bool) -> Vec<f64> {
    let n = values.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(n);
        let window = &values[lo..hi];
        let extreme = if take_min {
            window.iter().cloned().fold(f64::INFINITY, f64::min)
        } else {
            window.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        };
        out.push(extreme);
    }
    out
}

impl IcFilter for TopHat {
    fn filter_ic(&self, ic: &IonChromatogram) -> Result<IonChromatogram> {
        let n = ic.len();
        let points = match self.structure {
            Some(window) => window.to_points(ic),
            None => nearest_odd(((n as f64 * STRUCT_ELM_FRAC).round() as usize).max(1)),
        };
        if points > n {
            return Err(DomainError::WindowExceedsData {
                window: points,
                len: n,
            }
            .into());
        }

        let half = points / 2;
        let eroded = morph_sweep(ic.intensities(), half, true);
        let opened = morph_sweep(&eroded, half, false);
        let corrected: Vec<f64> = ic
            .intensities()
            .iter()
            .zip(&opened)
            .map(|(orig, baseline)| orig - baseline)
            .collect();
        ic.with_intensities(corrected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ic_of(values: Vec<f64>) -> IonChromatogram {
        let times: Vec<f64> = (0..values.len()).map(|t| t as f64).collect();
        IonChromatogram::new(values, times, Some(100.0)).unwrap()
    }

    #[test]
    fn test_flat_baseline_removed() {
        let ic = ic_of(vec![10.0; 30]);
        let out = TopHat::new(Window::Points(9)).filter_ic(&ic).unwrap();
        assert!(out.intensities().iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_narrow_peak_survives_on_offset_baseline() {
        let mut values = vec![10.0; 41];
        values[19] = 60.0;
        values[20] = 110.0;
        values[21] = 60.0;
        let ic = ic_of(values);
        let out = TopHat::new(Window::Points(9)).filter_ic(&ic).unwrap();
        let corrected = out.intensities();
        assert!((corrected[20] - 100.0).abs() < 1e-9);
        assert!((corrected[19] - 50.0).abs() < 1e-9);
        assert!(corrected[0].abs() < 1e-9);
        assert!(corrected[40].abs() < 1e-9);
    }

    #[test]
    fn test_wide_plateau_is_treated_as_baseline() {
        // A feature wider than the structuring element is opened away
        let mut values = vec![0.0; 60];
        for v in values.iter_mut().skip(10).take(40) {
            *v = 50.0;
        }
        let ic = ic_of(values);
        let out = TopHat::new(Window::Points(5)).filter_ic(&ic).unwrap();
        assert!(out.intensities().iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_default_structure_is_fraction_of_length() {
        let ic = ic_of(vec![10.0; 50]);
        let out = TopHat::default().filter_ic(&ic).unwrap();
        assert!(out.intensities().iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_duration_structure() {
        // 0.1m = 6 s at one scan per second -> a 7-point element
        let mut values = vec![5.0; 30];
        values[15] = 25.0;
        let ic = ic_of(values);
        let out = TopHat::from_struct_str("0.1m").unwrap().filter_ic(&ic).unwrap();
        assert!((out.intensities()[15] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_exceeding_length_fails() {
        let ic = ic_of(vec![1.0; 5]);
        assert!(TopHat::new(Window::Points(11)).filter_ic(&ic).is_err());
    }
}
