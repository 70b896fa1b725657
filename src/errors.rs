use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum ChromapeakError {
    InvalidInput(InvalidInputError),
    Domain(DomainError),
    Other(String),
}

pub type Result<T> = std::result::Result<T, ChromapeakError>;

impl Display for ChromapeakError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(e) => write!(f, "{}", e),
            Self::Domain(e) => write!(f, "{}", e),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ChromapeakError {}

impl ChromapeakError {
    pub fn custom(msg: impl Display) -> Self {
        Self::Other(msg.to_string())
    }
}

/// Input contract violations: wrong shape or an argument that can never be
/// valid regardless of the data. Checked eagerly at the start of each
/// operation, before any state is touched.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidInputError {
    EmptyScanList,
    EmptyPeakList,
    MismatchedLengths { times: usize, scans: usize },
    MismatchedAxes { expected: usize, got: usize },
    UnsortedMassList,
    TimesNotIncreasing,
}

impl Display for InvalidInputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyScanList => write!(f, "'scan_list' must contain at least one scan"),
            Self::EmptyPeakList => write!(f, "'peaks' must contain at least one Peak"),
            Self::MismatchedLengths { times, scans } => write!(
                f,
                "'time_list' and 'scan_list' differ in length ({} vs {})",
                times, scans
            ),
            Self::MismatchedAxes { expected, got } => write!(
                f,
                "mass and intensity lists must be parallel (expected {} values, got {})",
                expected, got
            ),
            Self::UnsortedMassList => write!(f, "'mass_list' must be sorted in ascending order"),
            Self::TimesNotIncreasing => write!(f, "'time_list' must be strictly increasing"),
        }
    }
}

/// Domain-range violations: well-typed input outside the range an operation
/// accepts. Messages name the violated constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    NonPositiveMassWidth(f64),
    NonPositivePercent(f64),
    InvalidPoints(usize),
    InvalidScans(usize),
    WindowExceedsData { window: usize, len: usize },
    DegreeTooHigh { degree: usize, window: usize },
    MassOutOfRange { mass: f64, min: f64, max: f64 },
    TimeOutOfRange { time: f64, min: f64, max: f64 },
    CropOrder { mass_min: f64, mass_max: f64 },
    CropBelowRange { mass_min: f64, smallest: f64 },
    CropAboveRange { mass_max: f64, largest: f64 },
    EmptyMassSpectrum,
    NonPositiveArea(f64),
    NegativeArea { mass: f64, area: f64 },
    InvalidTimeString(String),
    RtRangeOrder { lower: f64, upper: f64 },
}

impl Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveMassWidth(w) => {
                write!(f, "'mass_width' must be greater than 0 (got {})", w)
            }
            Self::NonPositivePercent(p) => {
                write!(f, "'percent' must be greater than 0 (got {})", p)
            }
            Self::InvalidPoints(p) => {
                write!(f, "'points' must be an odd number >= 3 (got {})", p)
            }
            Self::InvalidScans(s) => write!(f, "'scans' must be >= 1 (got {})", s),
            Self::WindowExceedsData { window, len } => write!(
                f,
                "window of {} points exceeds the chromatogram length of {}",
                window, len
            ),
            Self::DegreeTooHigh { degree, window } => write!(
                f,
                "polynomial degree {} requires a window larger than {} points",
                degree, window
            ),
            Self::MassOutOfRange { mass, min, max } => write!(
                f,
                "mass {} is outside the spectrum range [{}, {}]",
                mass, min, max
            ),
            Self::TimeOutOfRange { time, min, max } => write!(
                f,
                "time {} is outside the acquisition range [{}, {}]",
                time, min, max
            ),
            Self::CropOrder { mass_min, mass_max } => write!(
                f,
                "'mass_min' must be less than 'mass_max' ({} >= {})",
                mass_min, mass_max
            ),
            Self::CropBelowRange { mass_min, smallest } => write!(
                f,
                "'mass_min' ({}) is less than the smallest mass: {}",
                mass_min, smallest
            ),
            Self::CropAboveRange { mass_max, largest } => write!(
                f,
                "'mass_max' ({}) is greater than the largest mass: {}",
                mass_max, largest
            ),
            Self::EmptyMassSpectrum => {
                write!(f, "the peak's mass spectrum is empty; nothing to integrate")
            }
            Self::NonPositiveArea(a) => {
                write!(f, "'Peak.area' must be a positive number (got {})", a)
            }
            Self::NegativeArea { mass, area } => {
                write!(f, "integrated area for mass {} is negative ({})", mass, area)
            }
            Self::InvalidTimeString(s) => write!(
                f,
                "time string {:?} must be a number followed by an optional 'm' or 's'",
                s
            ),
            Self::RtRangeOrder { lower, upper } => write!(
                f,
                "lower retention time limit must be less than upper ({} >= {})",
                lower, upper
            ),
        }
    }
}

impl From<InvalidInputError> for ChromapeakError {
    fn from(e: InvalidInputError) -> Self {
        ChromapeakError::InvalidInput(e)
    }
}

impl From<DomainError> for ChromapeakError {
    fn from(e: DomainError) -> Self {
        ChromapeakError::Domain(e)
    }
}
