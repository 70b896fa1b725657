use std::collections::HashMap;

use nohash_hasher::BuildNoHashHasher;
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, Result};
use crate::models::spectrum::MassSpectrum;

/// Per-ion integrated areas, keyed by integer mass.
pub type IonAreas = HashMap<u32, f64, BuildNoHashHasher<u32>>;

/// A detected chromatographic peak: retention time, representative mass
/// spectrum, and (once integration has run) area information.
///
/// Retention time is held in seconds; construct with
/// [`Peak::from_minutes`] for minutes-based data. An empty spectrum is the
/// valid "nothing found yet" state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    rt: f64,
    minutes: bool,
    mass_spectrum: MassSpectrum,
    bounds: Option<(usize, usize, usize)>,
    area: Option<f64>,
    ion_areas: IonAreas,
    is_outlier: bool,
}

impl Peak {
    pub fn new(rt_seconds: f64, mass_spectrum: MassSpectrum) -> Self {
        Self {
            rt: rt_seconds,
            minutes: false,
            mass_spectrum,
            bounds: None,
            area: None,
            ion_areas: IonAreas::default(),
            is_outlier: false,
        }
    }

    /// Minutes-based constructor: the retention time is converted to seconds
    /// internally, and the UID keeps reporting minutes.
    pub fn from_minutes(rt_minutes: f64, mass_spectrum: MassSpectrum) -> Self {
        let mut peak = Self::new(rt_minutes * 60.0, mass_spectrum);
        peak.minutes = true;
        peak
    }

    /// Retention time in seconds, whatever the construction time base.
    pub fn rt(&self) -> f64 {
        self.rt
    }

    pub fn mass_spectrum(&self) -> &MassSpectrum {
        &self.mass_spectrum
    }

    pub fn set_mass_spectrum(&mut self, mass_spectrum: MassSpectrum) {
        self.mass_spectrum = mass_spectrum;
    }

    pub(crate) fn mass_spectrum_mut(&mut self) -> &mut MassSpectrum {
        &mut self.mass_spectrum
    }

    pub fn bounds(&self) -> Option<(usize, usize, usize)> {
        self.bounds
    }

    /// Scan-index boundaries as (left, apex, right).
    pub fn set_bounds(&mut self, left: usize, apex: usize, right: usize) {
        self.bounds = Some((left, apex, right));
    }

    pub fn area(&self) -> Option<f64> {
        self.area
    }

    pub fn set_area(&mut self, area: f64) -> Result<()> {
        if area <= 0.0 {
            return Err(DomainError::NonPositiveArea(area).into());
        }
        self.area = Some(area);
        Ok(())
    }

    pub fn ion_areas(&self) -> &IonAreas {
        &self.ion_areas
    }

    pub fn set_ion_areas(&mut self, ion_areas: IonAreas) {
        self.ion_areas = ion_areas;
    }

    pub fn set_ion_area(&mut self, mass: u32, area: f64) {
        self.ion_areas.insert(mass, area);
    }

    pub fn get_ion_area(&self, mass: u32) -> Option<f64> {
        self.ion_areas.get(&mass).copied()
    }

    pub fn is_outlier(&self) -> bool {
        self.is_outlier
    }

    pub fn set_outlier(&mut self, outlier: bool) {
        self.is_outlier = outlier;
    }

    /// Spectrum indices ordered by descending intensity; exact ties keep
    /// the lower mass first.
    fn intensity_order(&self) -> Vec<usize> {
        let spec = self.mass_spectrum.mass_spec();
        let mut order: Vec<usize> = (0..spec.len()).collect();
        order.sort_by(|a, b| spec[*b].partial_cmp(&spec[*a]).unwrap());
        order
    }

    /// Masses of the `n` most intense ions, most intense first.
    pub fn top_ions(&self, n: usize) -> Vec<f64> {
        let masses = self.mass_spectrum.mass_list();
        self.intensity_order()
            .into_iter()
            .take(n)
            .map(|i| masses[i])
            .collect()
    }

    /// Derived identity: the masses at the 2nd/3rd/4th highest intensities
    /// joined as integers, then the retention time to two decimals (seconds,
    /// or minutes for a minutes-based peak). Recomputed from current state
    /// on every call — mutating the spectrum changes the UID.
    pub fn uid(&self) -> String {
        let rt = if self.minutes { self.rt / 60.0 } else { self.rt };
        let order = self.intensity_order();
        if order.len() < 4 {
            return format!("{:.2}", rt);
        }
        let masses = self.mass_spectrum.mass_list();
        format!(
            "{}-{}-{}-{:.2}",
            masses[order[1]].round() as i64,
            masses[order[2]].round() as i64,
            masses[order[3]].round() as i64,
            rt
        )
    }

    /// Intensity recorded for `ion` in this peak's spectrum; errors outside
    /// the spectrum's mass range.
    pub fn get_int_of_ion(&self, ion: f64) -> Result<f64> {
        self.mass_spectrum.intensity_at_mass(ion)
    }

    /// See [`MassSpectrum::crop_mass`]. Changes the UID.
    pub fn crop_mass(&mut self, mass_min: f64, mass_max: f64) -> Result<()> {
        self.mass_spectrum.crop_mass(mass_min, mass_max)
    }

    /// See [`MassSpectrum::null_mass`]. Changes the UID.
    pub fn null_mass(&mut self, mass: f64) -> Result<()> {
        self.mass_spectrum.null_mass(mass)
    }
}
