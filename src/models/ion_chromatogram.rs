use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, InvalidInputError, Result};

/// Intensity over time for a single mass bin, or for the summed ("composite")
/// signal when `mass` is `None` (the TIC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonChromatogram {
    intensities: Vec<f64>,
    time_list: Vec<f64>,
    mass: Option<f64>,
}

/// Index of the acquisition time nearest to `time`. Acquisition times are
/// irregular floats, so lookups are by proximity, never exact match.
pub(crate) fn nearest_time_index(time_list: &[f64], time: f64) -> Result<usize> {
    let (first, last) = match (time_list.first(), time_list.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return Err(DomainError::TimeOutOfRange {
            time,
            min: 0.0,
            max: 0.0,
        }
        .into()),
    };
    if time < first || time > last {
        return Err(DomainError::TimeOutOfRange {
            time,
            min: first,
            max: last,
        }
        .into());
    }
    let idx = time_list.partition_point(|t| *t < time);
    if idx == 0 {
        return Ok(0);
    }
    if idx == time_list.len() {
        return Ok(idx - 1);
    }
    if (time - time_list[idx - 1]).abs() <= (time_list[idx] - time).abs() {
        Ok(idx - 1)
    } else {
        Ok(idx)
    }
}

impl IonChromatogram {
    pub fn new(intensities: Vec<f64>, time_list: Vec<f64>, mass: Option<f64>) -> Result<Self> {
        if intensities.len() != time_list.len() {
            return Err(InvalidInputError::MismatchedAxes {
                expected: time_list.len(),
                got: intensities.len(),
            }
            .into());
        }
        if time_list.windows(2).any(|w| w[0] >= w[1]) {
            return Err(InvalidInputError::TimesNotIncreasing.into());
        }
        Ok(Self {
            intensities,
            time_list,
            mass,
        })
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn time_list(&self) -> &[f64] {
        &self.time_list
    }

    /// The represented mass bin; `None` for the composite (TIC) signal.
    pub fn mass(&self) -> Option<f64> {
        self.mass
    }

    pub fn is_tic(&self) -> bool {
        self.mass.is_none()
    }

    pub fn len(&self) -> usize {
        self.intensities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }

    pub fn get_index_at_time(&self, time: f64) -> Result<usize> {
        nearest_time_index(&self.time_list, time)
    }

    /// Average sample spacing in seconds. The acquisition grid is irregular,
    /// so window sizes given as durations are converted with this.
    pub fn time_step(&self) -> f64 {
        if self.time_list.len() < 2 {
            return 0.0;
        }
        let span = self.time_list.last().unwrap() - self.time_list.first().unwrap();
        span / (self.time_list.len() - 1) as f64
    }

    /// Replace the intensity series, keeping the time axis and mass tag.
    /// The replacement must have the same length.
    pub fn with_intensities(&self, intensities: Vec<f64>) -> Result<Self> {
        if intensities.len() != self.time_list.len() {
            return Err(InvalidInputError::MismatchedAxes {
                expected: self.time_list.len(),
                got: intensities.len(),
            }
            .into());
        }
        Ok(Self {
            intensities,
            time_list: self.time_list.clone(),
            mass: self.mass,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ic() -> IonChromatogram {
        IonChromatogram::new(
            vec![0.0, 5.0, 10.0, 5.0, 0.0],
            vec![1.0, 2.1, 3.0, 4.2, 5.0],
            Some(100.0),
        )
        .unwrap()
    }

    #[test]
    fn test_nearest_time_lookup() {
        let ic = ic();
        assert_eq!(ic.get_index_at_time(2.0).unwrap(), 1);
        assert_eq!(ic.get_index_at_time(3.5).unwrap(), 2);
        assert_eq!(ic.get_index_at_time(5.0).unwrap(), 4);
        assert!(ic.get_index_at_time(0.5).is_err());
        assert!(ic.get_index_at_time(5.1).is_err());
    }

    #[test]
    fn test_time_step_is_average_spacing() {
        assert!((ic().time_step() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_increasing_times() {
        assert!(IonChromatogram::new(vec![1.0, 2.0], vec![2.0, 2.0], None).is_err());
    }

    #[test]
    fn test_with_intensities_keeps_axis() {
        let ic = ic();
        let replaced = ic.with_intensities(vec![1.0; 5]).unwrap();
        assert_eq!(replaced.time_list(), ic.time_list());
        assert_eq!(replaced.mass(), Some(100.0));
        assert!(ic.with_intensities(vec![1.0; 4]).is_err());
    }
}
