pub mod area;
pub mod detect;
pub mod lists;
pub mod threshold;

#[cfg(test)]
mod tests {
    //! The whole pipeline against one synthetic run: build, smooth,
    //! baseline-correct, detect, filter, integrate, select.

    use crate::errors::Result;
    use crate::filters::savitzky_golay::SavitzkyGolay;
    use crate::filters::tophat::TopHat;
    use crate::filters::{filter_ics_in_place, IcFilter, Window};
    use crate::models::gcms::GcmsData;
    use crate::models::intensity_matrix::{build_intensity_matrix_i, IntensityMatrix};
    use crate::models::peak::Peak;
    use crate::models::spectrum::Scan;
    use crate::peaks::area::{peak_sum_area, peak_top_ion_areas};
    use crate::peaks::detect::BillerBiemann;
    use crate::peaks::lists::select_peaks_by_rt;
    use crate::peaks::threshold::{num_ions_threshold, rel_threshold};

    /// 60 scans starting at t = 600 s, masses 60..=80 with a flat baseline
    /// of 5 counts everywhere. Compound A elutes over scans 19..=21 with
    /// ions 70/72/75, compound B over scans 39..=41 with ions 65/68.
    fn synthetic_run() -> GcmsData {
        let masses: Vec<f64> = (60..=80).map(|m| m as f64).collect();
        let mut scans = Vec::new();
        let mut times = Vec::new();
        for i in 0..60usize {
            times.push(600.0 + i as f64);
            let elution_a = match i {
                19 => 30.0,
                20 => 100.0,
                21 => 40.0,
                _ => 0.0,
            };
            let elution_b = match i {
                39 => 24.0,
                40 => 80.0,
                41 => 32.0,
                _ => 0.0,
            };
            let intensities: Vec<f64> = masses
                .iter()
                .map(|m| {
                    let mut v = 5.0;
                    match *m as i64 {
                        70 => v += elution_a,
                        72 => v += 0.6 * elution_a,
                        75 => v += 0.3 * elution_a,
                        65 => v += elution_b,
                        68 => v += 0.5 * elution_b,
                        _ => {}
                    }
                    v
                })
                .collect();
            scans.push(Scan::new(masses.clone(), intensities).unwrap());
        }
        GcmsData::new(times, scans).unwrap()
    }

    fn corrected_matrix() -> Result<IntensityMatrix> {
        let data = synthetic_run();
        let mut im = build_intensity_matrix_i(&data)?;
        let sg = SavitzkyGolay::default();
        let th = TopHat::new(Window::Points(21));
        let filters: [&dyn IcFilter; 2] = [&sg, &th];
        filter_ics_in_place(&mut im, &filters)?;
        Ok(im)
    }

    fn strongest(peaks: &[Peak]) -> &Peak {
        peaks
            .iter()
            .max_by(|a, b| {
                a.mass_spectrum()
                    .max_intensity()
                    .partial_cmp(&b.mass_spectrum().max_intensity())
                    .unwrap()
            })
            .unwrap()
    }

    #[test]
    fn test_full_pipeline() {
        let im = corrected_matrix().unwrap();
        let peaks = BillerBiemann::new(3, 2).detect(&im).unwrap();
        assert!(!peaks.is_empty());

        // The strongest detected peak is compound A's apex scan
        let best = strongest(&peaks);
        assert_eq!(best.rt(), 620.0);
        assert_eq!(best.top_ions(1), vec![70.0]);

        // Threshold filtering keeps the apex peak
        let filtered = rel_threshold(peaks, 2.0).unwrap();
        let filtered = num_ions_threshold(filtered, 2, 20.0);
        assert!(!filtered.is_empty());
        assert!(filtered.iter().any(|p| p.rt() == 620.0));
        let mut best = strongest(&filtered).clone();

        // Ion housekeeping before integration, the usual workflow order
        let uid_before = best.uid();
        best.crop_mass(62.0, 78.0).unwrap();
        best.null_mass(75.0).unwrap();
        assert_eq!(best.get_int_of_ion(75.0).unwrap(), 0.0);
        assert_ne!(best.uid(), uid_before);

        // Integration
        let area = peak_sum_area(&im, &best, 0).unwrap();
        assert!(area > 0.0);
        best.set_area(area).unwrap();
        let ion_areas = peak_top_ion_areas(&im, &best, 2, 0).unwrap();
        assert!(ion_areas.contains_key(&70));
        assert!(ion_areas.contains_key(&72));
        assert!(ion_areas.values().all(|a| *a >= 0.0));
        best.set_ion_areas(ion_areas);

        // Retention-time selection in minutes tokens: [600 s, 660 s)
        let selected = select_peaks_by_rt(&filtered, ("10m", "11m")).unwrap();
        assert!(!selected.is_empty());
        assert!(selected.iter().all(|p| p.rt() >= 600.0 && p.rt() < 660.0));
        assert!(selected.iter().any(|p| p.rt() == 620.0));
    }

    #[test]
    fn test_filtered_list_round_trips_through_serialization() {
        let im = corrected_matrix().unwrap();
        let peaks = BillerBiemann::new(3, 2).detect(&im).unwrap();
        let filtered = num_ions_threshold(rel_threshold(peaks, 2.0).unwrap(), 2, 20.0);

        let bytes = rmp_serde::to_vec(&filtered).unwrap();
        let back: Vec<Peak> = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(filtered, back);
        // Bit-identical floats, preserved order
        for (a, b) in filtered.iter().zip(&back) {
            assert_eq!(a.rt().to_bits(), b.rt().to_bits());
            assert_eq!(a.uid(), b.uid());
        }
    }
}
