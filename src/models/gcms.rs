use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{InvalidInputError, Result};
use crate::models::ion_chromatogram::{nearest_time_index, IonChromatogram};
use crate::models::spectrum::Scan;

/// A whole acquisition: strictly increasing times paired 1:1 with scans.
/// Produced by an external format reader, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcmsData {
    time_list: Vec<f64>,
    scan_list: Vec<Scan>,
}

impl GcmsData {
    pub fn new(time_list: Vec<f64>, scan_list: Vec<Scan>) -> Result<Self> {
        if scan_list.is_empty() {
            return Err(InvalidInputError::EmptyScanList.into());
        }
        if time_list.len() != scan_list.len() {
            return Err(InvalidInputError::MismatchedLengths {
                times: time_list.len(),
                scans: scan_list.len(),
            }
            .into());
        }
        if time_list.windows(2).any(|w| w[0] >= w[1]) {
            return Err(InvalidInputError::TimesNotIncreasing.into());
        }
        let data = Self {
            time_list,
            scan_list,
        };
        debug!(
            "GcmsData with {} scans, time range [{:.2}, {:.2}] s, mass range {:?}",
            data.len(),
            data.time_list[0],
            data.time_list[data.len() - 1],
            (data.min_mass(), data.max_mass()),
        );
        Ok(data)
    }

    pub fn time_list(&self) -> &[f64] {
        &self.time_list
    }

    pub fn scan_list(&self) -> &[Scan] {
        &self.scan_list
    }

    pub fn len(&self) -> usize {
        self.scan_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scan_list.is_empty()
    }

    /// Smallest mass observed in any scan. `None` when every scan is empty.
    pub fn min_mass(&self) -> Option<f64> {
        self.scan_list
            .iter()
            .filter_map(Scan::min_mass)
            .min_by(|a, b| a.partial_cmp(b).unwrap())
    }

    /// Largest mass observed in any scan.
    pub fn max_mass(&self) -> Option<f64> {
        self.scan_list
            .iter()
            .filter_map(Scan::max_mass)
            .max_by(|a, b| a.partial_cmp(b).unwrap())
    }

    pub fn get_index_at_time(&self, time: f64) -> Result<usize> {
        nearest_time_index(&self.time_list, time)
    }

    /// Average scan spacing in seconds.
    pub fn time_step(&self) -> f64 {
        if self.time_list.len() < 2 {
            return 0.0;
        }
        let span = self.time_list.last().unwrap() - self.time_list.first().unwrap();
        span / (self.time_list.len() - 1) as f64
    }

    /// Total Ion Chromatogram: the per-scan intensity sums as a composite
    /// chromatogram.
    pub fn tic(&self) -> IonChromatogram {
        let sums: Vec<f64> = self.scan_list.iter().map(Scan::total_intensity).collect();
        // The constructor invariants hold by construction of self.
        IonChromatogram::new(sums, self.time_list.clone(), None)
            .expect("time axis already validated")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> GcmsData {
        let scans = vec![
            Scan::new(vec![50.0, 60.0], vec![10.0, 20.0]).unwrap(),
            Scan::new(vec![55.0, 70.0], vec![5.0, 15.0]).unwrap(),
            Scan::new(vec![52.0], vec![7.0]).unwrap(),
        ];
        GcmsData::new(vec![10.0, 11.0, 12.5], scans).unwrap()
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(GcmsData::new(vec![], vec![]).is_err());
        let one_scan = vec![Scan::new(vec![50.0], vec![1.0]).unwrap()];
        assert!(GcmsData::new(vec![1.0, 2.0], one_scan.clone()).is_err());
        let two_scans = vec![one_scan[0].clone(), one_scan[0].clone()];
        assert!(GcmsData::new(vec![2.0, 1.0], two_scans).is_err());
    }

    #[test]
    fn test_global_mass_range() {
        let d = data();
        assert_eq!(d.min_mass(), Some(50.0));
        assert_eq!(d.max_mass(), Some(70.0));
    }

    #[test]
    fn test_tic_sums_each_scan() {
        let tic = data().tic();
        assert!(tic.is_tic());
        assert_eq!(tic.intensities(), &[30.0, 20.0, 7.0]);
        assert_eq!(tic.time_list(), &[10.0, 11.0, 12.5]);
    }

    #[test]
    fn test_nearest_index_at_time() {
        let d = data();
        assert_eq!(d.get_index_at_time(10.4).unwrap(), 0);
        assert_eq!(d.get_index_at_time(11.4).unwrap(), 1);
        assert_eq!(d.get_index_at_time(11.9).unwrap(), 2);
        assert!(d.get_index_at_time(9.0).is_err());
    }
}
