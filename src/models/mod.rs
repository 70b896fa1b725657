pub mod gcms;
pub mod intensity_matrix;
pub mod ion_chromatogram;
pub mod peak;
pub mod spectrum;
