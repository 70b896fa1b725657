use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::errors::{ChromapeakError, DomainError, InvalidInputError, Result};
use crate::models::gcms::GcmsData;
use crate::models::ion_chromatogram::{nearest_time_index, IonChromatogram};
use crate::models::spectrum::MassSpectrum;

/// How a raw mass is assigned to a fixed-width bin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinMode {
    Floor,
    #[default]
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinConfig {
    pub mass_width: f64,
    pub mode: BinMode,
}

impl Default for BinConfig {
    fn default() -> Self {
        BinConfig {
            mass_width: 1.0,
            mode: BinMode::Round,
        }
    }
}

/// Dense resampling of the irregular scan stream: `intensity[scan][mass_bin]`
/// stored row-major in one flat buffer, with a time per row and a sorted,
/// evenly spaced mass-bin centre per column. Cells never observed in the raw
/// scans are zero.
///
/// The only mutation path is replacing a whole column through
/// [`set_ic_at_index`](IntensityMatrix::set_ic_at_index), which takes
/// `&mut self` — exclusive access, so filter stages cannot alias each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityMatrix {
    time_list: Vec<f64>,
    mass_list: Vec<f64>,
    intensities: Vec<f64>,
}

impl IntensityMatrix {
    /// (number of scans, number of mass bins)
    pub fn size(&self) -> (usize, usize) {
        (self.time_list.len(), self.mass_list.len())
    }

    pub fn time_list(&self) -> &[f64] {
        &self.time_list
    }

    pub fn mass_list(&self) -> &[f64] {
        &self.mass_list
    }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.mass_list.len() + col
    }

    #[inline]
    pub fn intensity_at(&self, row: usize, col: usize) -> f64 {
        self.intensities[self.idx(row, col)]
    }

    /// One scan's resampled spectrum as a row slice.
    pub fn row(&self, row: usize) -> &[f64] {
        let n = self.mass_list.len();
        &self.intensities[row * n..(row + 1) * n]
    }

    pub fn total_intensity(&self) -> f64 {
        self.intensities.iter().sum()
    }

    pub fn get_ms_at_index(&self, row: usize) -> Result<MassSpectrum> {
        if row >= self.time_list.len() {
            return Err(ChromapeakError::custom(format!(
                "scan index {} out of range ({} scans)",
                row,
                self.time_list.len()
            )));
        }
        MassSpectrum::new(self.mass_list.clone(), self.row(row).to_vec())
    }

    /// The ion chromatogram of one mass bin, tagged with that bin's mass.
    pub fn get_ic_at_index(&self, col: usize) -> Result<IonChromatogram> {
        if col >= self.mass_list.len() {
            return Err(ChromapeakError::custom(format!(
                "mass bin index {} out of range ({} bins)",
                col,
                self.mass_list.len()
            )));
        }
        let series: Vec<f64> = (0..self.time_list.len())
            .map(|row| self.intensities[self.idx(row, col)])
            .collect();
        IonChromatogram::new(series, self.time_list.clone(), Some(self.mass_list[col]))
    }

    /// Replace one column with a corrected chromatogram. This is the primary
    /// mutation path of the whole pipeline.
    pub fn set_ic_at_index(&mut self, col: usize, ic: &IonChromatogram) -> Result<()> {
        if col >= self.mass_list.len() {
            return Err(ChromapeakError::custom(format!(
                "mass bin index {} out of range ({} bins)",
                col,
                self.mass_list.len()
            )));
        }
        if ic.len() != self.time_list.len() {
            return Err(InvalidInputError::MismatchedAxes {
                expected: self.time_list.len(),
                got: ic.len(),
            }
            .into());
        }
        for (row, value) in ic.intensities().iter().enumerate() {
            let idx = self.idx(row, col);
            self.intensities[idx] = *value;
        }
        Ok(())
    }

    /// Index of the bin whose centre is nearest to `mass`; errors outside
    /// the covered mass range.
    pub fn get_index_of_mass(&self, mass: f64) -> Result<usize> {
        let (min, max) = (self.mass_list[0], *self.mass_list.last().unwrap());
        if mass < min || mass > max {
            return Err(DomainError::MassOutOfRange { mass, min, max }.into());
        }
        let idx = self.mass_list.partition_point(|m| *m < mass);
        if idx == 0 {
            return Ok(0);
        }
        if idx == self.mass_list.len() {
            return Ok(idx - 1);
        }
        if (mass - self.mass_list[idx - 1]).abs() <= (self.mass_list[idx] - mass).abs() {
            Ok(idx - 1)
        } else {
            Ok(idx)
        }
    }

    pub fn get_ic_at_mass(&self, mass: f64) -> Result<IonChromatogram> {
        let col = self.get_index_of_mass(mass)?;
        self.get_ic_at_index(col)
    }

    pub fn get_index_at_time(&self, time: f64) -> Result<usize> {
        nearest_time_index(&self.time_list, time)
    }
}

fn observed_mass_range(data: &GcmsData) -> Result<(f64, f64)> {
    match (data.min_mass(), data.max_mass()) {
        (Some(min), Some(max)) => Ok((min, max)),
        _ => Err(ChromapeakError::custom("no masses observed in any scan")),
    }
}

/// Resample a scan stream onto fixed-width mass bins, summing every raw
/// intensity that falls into a bin.
#[instrument(name = "build_intensity_matrix", skip(data))]
pub fn build_intensity_matrix(data: &GcmsData, config: BinConfig) -> Result<IntensityMatrix> {
    if config.mass_width <= 0.0 {
        return Err(DomainError::NonPositiveMassWidth(config.mass_width).into());
    }
    if data.is_empty() {
        return Err(InvalidInputError::EmptyScanList.into());
    }
    let start = Instant::now();
    let (min_mass, max_mass) = observed_mass_range(data)?;
    let width = config.mass_width;
    let num_bins = ((max_mass - min_mass) / width + 0.5).floor() as usize + 1;
    let mass_list: Vec<f64> = (0..num_bins).map(|i| min_mass + i as f64 * width).collect();

    let mut intensities = vec![0.0; data.len() * num_bins];
    for (row, scan) in data.scan_list().iter().enumerate() {
        for (mass, intensity) in scan.mass_list().iter().zip(scan.intensity_list()) {
            let offset = (mass - min_mass) / width;
            let bin = match config.mode {
                BinMode::Round => (offset + 0.5).floor() as usize,
                BinMode::Floor => offset.floor() as usize,
            };
            intensities[row * num_bins + bin] += intensity;
        }
    }

    let im = IntensityMatrix {
        time_list: data.time_list().to_vec(),
        mass_list,
        intensities,
    };
    info!(
        "built {}x{} intensity matrix in {:#?}",
        im.size().0,
        im.size().1,
        start.elapsed()
    );
    Ok(im)
}

/// Integer-mass variant: bins centred on consecutive integers spanning the
/// rounded global mass range.
#[instrument(name = "build_intensity_matrix_i", skip(data))]
pub fn build_intensity_matrix_i(data: &GcmsData) -> Result<IntensityMatrix> {
    if data.is_empty() {
        return Err(InvalidInputError::EmptyScanList.into());
    }
    let start = Instant::now();
    let (min_mass, max_mass) = observed_mass_range(data)?;
    let min_i = min_mass.round() as i64;
    let max_i = max_mass.round() as i64;
    let num_bins = (max_i - min_i) as usize + 1;
    let mass_list: Vec<f64> = (min_i..=max_i).map(|m| m as f64).collect();

    let mut intensities = vec![0.0; data.len() * num_bins];
    for (row, scan) in data.scan_list().iter().enumerate() {
        for (mass, intensity) in scan.mass_list().iter().zip(scan.intensity_list()) {
            let bin = (mass.round() as i64 - min_i) as usize;
            intensities[row * num_bins + bin] += intensity;
        }
    }

    let im = IntensityMatrix {
        time_list: data.time_list().to_vec(),
        mass_list,
        intensities,
    };
    debug!("integer mass axis [{}, {}]", min_i, max_i);
    info!(
        "built {}x{} intensity matrix in {:#?}",
        im.size().0,
        im.size().1,
        start.elapsed()
    );
    Ok(im)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::spectrum::Scan;

    fn data() -> GcmsData {
        let scans = vec![
            Scan::new(vec![50.1, 50.9, 52.0], vec![10.0, 20.0, 30.0]).unwrap(),
            Scan::new(vec![50.4, 53.2], vec![5.0, 15.0]).unwrap(),
            Scan::new(vec![51.6], vec![7.0]).unwrap(),
        ];
        GcmsData::new(vec![1.0, 2.0, 3.0], scans).unwrap()
    }

    #[test]
    fn test_build_preserves_total_intensity() {
        let d = data();
        let raw_total: f64 = d.scan_list().iter().map(|s| s.total_intensity()).sum();
        for config in [
            BinConfig::default(),
            BinConfig {
                mass_width: 0.5,
                mode: BinMode::Round,
            },
            BinConfig {
                mass_width: 1.0,
                mode: BinMode::Floor,
            },
        ] {
            let im = build_intensity_matrix(&d, config).unwrap();
            assert!(
                (im.total_intensity() - raw_total).abs() < 1e-9,
                "total not preserved for {:?}",
                config
            );
        }
        let im = build_intensity_matrix_i(&d).unwrap();
        assert!((im.total_intensity() - raw_total).abs() < 1e-9);
    }

    #[test]
    fn test_round_binning_merges_neighbours() {
        let im = build_intensity_matrix(&data(), BinConfig::default()).unwrap();
        // Axis starts at the observed minimum mass
        assert_eq!(im.mass_list()[0], 50.1);
        // 50.1 and 50.4 share bin 0; 50.9 rounds up to bin 1
        assert_eq!(im.intensity_at(0, 0), 10.0);
        assert_eq!(im.intensity_at(0, 1), 20.0);
        assert_eq!(im.intensity_at(1, 0), 5.0);
    }

    #[test]
    fn test_integer_binning_axis() {
        let im = build_intensity_matrix_i(&data()).unwrap();
        assert_eq!(im.mass_list(), &[50.0, 51.0, 52.0, 53.0]);
        // 50.1 + 50.4 land on 50; 50.9 + 51.6 land on 51 and 52
        assert_eq!(im.intensity_at(0, 0), 10.0);
        assert_eq!(im.intensity_at(0, 1), 20.0);
        assert_eq!(im.intensity_at(2, 2), 7.0);
    }

    #[test]
    fn test_bad_mass_width() {
        for w in [0.0, -1.0] {
            let config = BinConfig {
                mass_width: w,
                mode: BinMode::Round,
            };
            assert!(build_intensity_matrix(&data(), config).is_err());
        }
    }

    #[test]
    fn test_ic_round_trip_through_column() {
        let mut im = build_intensity_matrix_i(&data()).unwrap();
        let ic = im.get_ic_at_index(1).unwrap();
        assert_eq!(ic.mass(), Some(51.0));
        let doubled: Vec<f64> = ic.intensities().iter().map(|v| v * 2.0).collect();
        let replaced = ic.with_intensities(doubled).unwrap();
        im.set_ic_at_index(1, &replaced).unwrap();
        assert_eq!(im.get_ic_at_index(1).unwrap(), replaced);
        // Other columns untouched
        assert_eq!(im.intensity_at(2, 2), 7.0);
    }

    #[test]
    fn test_get_ic_at_mass_nearest() {
        let im = build_intensity_matrix_i(&data()).unwrap();
        assert_eq!(im.get_ic_at_mass(51.2).unwrap().mass(), Some(51.0));
        assert!(im.get_ic_at_mass(49.0).is_err());
        assert!(im.get_ic_at_mass(60.0).is_err());
    }

    #[test]
    fn test_get_ms_at_index() {
        let im = build_intensity_matrix_i(&data()).unwrap();
        let ms = im.get_ms_at_index(1).unwrap();
        assert_eq!(ms.mass_list(), im.mass_list());
        assert_eq!(ms.intensity_at_mass(53.0).unwrap(), 15.0);
    }
}
