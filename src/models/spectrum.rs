use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{DomainError, InvalidInputError, Result};

/// One acquisition time point: sparse (mass, intensity) pairs as parallel
/// lists sorted by mass. Built once by a format reader, read-only after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    mass_list: Vec<f64>,
    intensity_list: Vec<f64>,
}

impl Scan {
    pub fn new(mass_list: Vec<f64>, intensity_list: Vec<f64>) -> Result<Self> {
        if mass_list.len() != intensity_list.len() {
            return Err(InvalidInputError::MismatchedAxes {
                expected: mass_list.len(),
                got: intensity_list.len(),
            }
            .into());
        }
        if mass_list.windows(2).any(|w| w[0] > w[1]) {
            return Err(InvalidInputError::UnsortedMassList.into());
        }
        Ok(Self {
            mass_list,
            intensity_list,
        })
    }

    pub fn mass_list(&self) -> &[f64] {
        &self.mass_list
    }

    pub fn intensity_list(&self) -> &[f64] {
        &self.intensity_list
    }

    pub fn len(&self) -> usize {
        self.mass_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass_list.is_empty()
    }

    pub fn min_mass(&self) -> Option<f64> {
        self.mass_list.first().copied()
    }

    pub fn max_mass(&self) -> Option<f64> {
        self.mass_list.last().copied()
    }

    pub fn total_intensity(&self) -> f64 {
        self.intensity_list.iter().sum()
    }
}

/// A representative spectrum for one scan or one peak: sorted `mass_list`
/// with a parallel intensity per mass. Unlike [`Scan`] this is mutated in
/// place by the filtering stages (`null_mass`, `crop_mass`), which preserve
/// the sorted parallel-array invariant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MassSpectrum {
    mass_list: Vec<f64>,
    mass_spec: Vec<f64>,
}

// Crops spanning less than this many mass units are suspicious enough to
// warrant an advisory.
const NARROW_CROP_SPAN: f64 = 10.0;

impl MassSpectrum {
    pub fn new(mass_list: Vec<f64>, mass_spec: Vec<f64>) -> Result<Self> {
        if mass_list.len() != mass_spec.len() {
            return Err(InvalidInputError::MismatchedAxes {
                expected: mass_list.len(),
                got: mass_spec.len(),
            }
            .into());
        }
        if mass_list.windows(2).any(|w| w[0] > w[1]) {
            return Err(InvalidInputError::UnsortedMassList.into());
        }
        Ok(Self {
            mass_list,
            mass_spec,
        })
    }

    /// The valid "nothing found yet" spectrum.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn mass_list(&self) -> &[f64] {
        &self.mass_list
    }

    pub fn mass_spec(&self) -> &[f64] {
        &self.mass_spec
    }

    /// Mutable view of the intensities. The length (and with it the
    /// parallel-array invariant) cannot change through this.
    pub fn mass_spec_mut(&mut self) -> &mut [f64] {
        &mut self.mass_spec
    }

    pub fn len(&self) -> usize {
        self.mass_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass_list.is_empty()
    }

    pub fn min_mass(&self) -> Option<f64> {
        self.mass_list.first().copied()
    }

    pub fn max_mass(&self) -> Option<f64> {
        self.mass_list.last().copied()
    }

    pub fn max_intensity(&self) -> f64 {
        self.mass_spec.iter().cloned().fold(0.0, f64::max)
    }

    /// Index of the mass bin closest to `mass`. Assumes a non-empty list.
    pub(crate) fn index_of_nearest(&self, mass: f64) -> usize {
        let idx = self.mass_list.partition_point(|m| *m < mass);
        if idx == 0 {
            return 0;
        }
        if idx == self.mass_list.len() {
            return idx - 1;
        }
        if (mass - self.mass_list[idx - 1]).abs() <= (self.mass_list[idx] - mass).abs() {
            idx - 1
        } else {
            idx
        }
    }

    fn check_in_range(&self, mass: f64) -> Result<()> {
        match (self.min_mass(), self.max_mass()) {
            (Some(min), Some(max)) if mass >= min && mass <= max => Ok(()),
            (Some(min), Some(max)) => Err(DomainError::MassOutOfRange { mass, min, max }.into()),
            _ => Err(DomainError::EmptyMassSpectrum.into()),
        }
    }

    /// Intensity at the bin nearest to `mass`; errors outside the spectrum
    /// range.
    pub fn intensity_at_mass(&self, mass: f64) -> Result<f64> {
        self.check_in_range(mass)?;
        Ok(self.mass_spec[self.index_of_nearest(mass)])
    }

    /// Zero the intensity of the bin nearest to `mass`, leaving every other
    /// bin untouched.
    pub fn null_mass(&mut self, mass: f64) -> Result<()> {
        self.check_in_range(mass)?;
        let idx = self.index_of_nearest(mass);
        self.mass_spec[idx] = 0.0;
        Ok(())
    }

    /// Restrict the spectrum to `[mass_min, mass_max]` (inclusive). The
    /// bounds must fall inside the currently covered range.
    pub fn crop_mass(&mut self, mass_min: f64, mass_max: f64) -> Result<()> {
        if mass_min >= mass_max {
            return Err(DomainError::CropOrder { mass_min, mass_max }.into());
        }
        let (smallest, largest) = match (self.min_mass(), self.max_mass()) {
            (Some(min), Some(max)) => (min, max),
            _ => return Err(DomainError::EmptyMassSpectrum.into()),
        };
        if mass_min < smallest {
            return Err(DomainError::CropBelowRange { mass_min, smallest }.into());
        }
        if mass_max > largest {
            return Err(DomainError::CropAboveRange { mass_max, largest }.into());
        }
        if mass_max - mass_min < NARROW_CROP_SPAN {
            warn!(
                "crop range [{}, {}] spans less than {} mass units",
                mass_min, mass_max, NARROW_CROP_SPAN
            );
        }

        let start = self.mass_list.partition_point(|m| *m < mass_min);
        let end = self.mass_list.partition_point(|m| *m <= mass_max);
        self.mass_list.drain(end..);
        self.mass_list.drain(..start);
        self.mass_spec.drain(end..);
        self.mass_spec.drain(..start);
        Ok(())
    }
}
