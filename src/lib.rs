// Re-export main structures
pub use crate::models::gcms::GcmsData;
pub use crate::models::intensity_matrix::{
    build_intensity_matrix, build_intensity_matrix_i, BinConfig, BinMode, IntensityMatrix,
};
pub use crate::models::ion_chromatogram::IonChromatogram;
pub use crate::models::peak::{IonAreas, Peak};
pub use crate::models::spectrum::{MassSpectrum, Scan};

// Re-export the pipeline stages
pub use crate::errors::{ChromapeakError, Result};
pub use crate::filters::savitzky_golay::SavitzkyGolay;
pub use crate::filters::tophat::TopHat;
pub use crate::filters::{filter_ics_in_place, IcFilter, Window};
pub use crate::peaks::area::{peak_sum_area, peak_top_ion_areas};
pub use crate::peaks::detect::BillerBiemann;
pub use crate::peaks::lists::{composite_peak, select_peaks_by_rt};
pub use crate::peaks::threshold::{num_ions_threshold, rel_threshold};

// Declare modules
pub mod errors;
pub mod filters;
pub mod models;
pub mod peaks;
pub mod utils;
