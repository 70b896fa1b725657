use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, Result};
use crate::filters::{IcFilter, Window};
use crate::models::ion_chromatogram::IonChromatogram;

/// Savitzky-Golay noise smoothing: least-squares polynomial convolution
/// over a centred window.
///
/// The first and last half-window points are fitted with shrinking
/// asymmetric windows instead of zero padding, so the chromatogram ends are
/// not dragged towards zero. Smoothed values may go negative; clamping is
/// the caller's choice downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavitzkyGolay {
    pub window: Window,
    pub degree: usize,
}

impl Default for SavitzkyGolay {
    fn default() -> Self {
        SavitzkyGolay {
            window: Window::Points(7),
            degree: 2,
        }
    }
}

impl SavitzkyGolay {
    pub fn new(window: Window, degree: usize) -> Self {
        SavitzkyGolay { window, degree }
    }
}

/// Solve `a x = b` for a small dense system by Gaussian elimination with
/// partial pivoting. The normal matrices here are (degree+1)^2.
fn solve_linear(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|x, y| a[*x][col].abs().partial_cmp(&a[*y][col].abs()).unwrap())
            .unwrap();
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in (row + 1)..n {
            acc -= a[row][k] * x[k];
        }
        x[row] = acc / a[row][row];
    }
    x
}

/// Least-squares convolution weights for the window of offsets
/// `-n_left ..= n_right`, evaluated at offset 0: fit a polynomial of
/// `degree` through the window and take its value at the centre.
fn sg_weights(n_left: i64, n_right: i64, degree: usize) -> Vec<f64> {
    let dim = degree + 1;
    // Normal matrix M[j][k] = sum over the window of x^(j+k)
    let mut m = vec![vec![0.0; dim]; dim];
    for x in -n_left..=n_right {
        let xf = x as f64;
        let mut powers = vec![1.0; 2 * degree + 1];
        for p in 1..powers.len() {
            powers[p] = powers[p - 1] * xf;
        }
        for (j, row) in m.iter_mut().enumerate() {
            for (k, cell) in row.iter_mut().enumerate() {
                *cell += powers[j + k];
            }
        }
    }
    let mut e0 = vec![0.0; dim];
    e0[0] = 1.0;
    let z = solve_linear(m, e0);

    (-n_left..=n_right)
        .map(|x| {
            let xf = x as f64;
            let mut acc = 0.0;
            let mut power = 1.0;
            for zj in &z {
                acc += zj * power;
                power *= xf;
            }
            acc
        })
        .collect()
}

impl IcFilter for SavitzkyGolay {
    fn filter_ic(&self, ic: &IonChromatogram) -> Result<IonChromatogram> {
        let n = ic.len();
        let window = self.window.to_points(ic);
        if window > n {
            return Err(DomainError::WindowExceedsData { window, len: n }.into());
        }
        let half = (window / 2) as i64;
        if self.degree as i64 > half {
            return Err(DomainError::DegreeTooHigh {
                degree: self.degree,
                window,
            }
            .into());
        }

        let values = ic.intensities();
        let centre_weights = sg_weights(half, half, self.degree);
        let mut smoothed = Vec::with_capacity(n);
        for i in 0..n {
            let n_left = (i as i64).min(half);
            let n_right = ((n - 1 - i) as i64).min(half);
            let edge_weights;
            let weights = if n_left == half && n_right == half {
                &centre_weights
            } else {
                // Shrinking edge window
                edge_weights = sg_weights(n_left, n_right, self.degree);
                &edge_weights
            };
            let start = i as i64 - n_left;
            let mut acc = 0.0;
            for (w, v) in weights.iter().zip(&values[start as usize..]) {
                acc += w * v;
            }
            smoothed.push(acc);
        }
        ic.with_intensities(smoothed)
    }
}
