//! Dense symmetric positive-definite solves for the model fit.
//!
//! Matrices are row-major `n * n` slices; the systems are small (one row per
//! model feature) so nothing here tries to be clever.

/// Lower-triangular Cholesky factor of a symmetric positive-definite matrix,
/// kept so several right-hand sides can share one factorisation.
pub struct Cholesky {
  n: usize,
  l: Vec<f64>,
}

impl Cholesky {
  /// Factor the row-major `n * n` matrix `a`. Returns `None` if it is not
  /// positive definite.
  pub fn factor(a: &[f64], n: usize) -> Option<Self> {
    debug_assert_eq!(a.len(), n * n);

    let mut l = vec![0.0; n * n];
    for j in 0..n {
      let mut diag = a[j * n + j];
      for k in 0..j {
        diag -= l[j * n + k] * l[j * n + k];
      }
      if !(diag > 0.0) || !diag.is_finite() {
        return None;
      }
      let ljj = diag.sqrt();
      l[j * n + j] = ljj;

      for i in (j + 1)..n {
        let mut sum = a[i * n + j];
        for k in 0..j {
          sum -= l[i * n + k] * l[j * n + k];
        }
        l[i * n + j] = sum / ljj;
      }
    }

    Some(Self { n, l })
  }

  pub fn solve(&self, b: &[f64]) -> Vec<f64> {
    let (n, l) = (self.n, &self.l);
    debug_assert_eq!(b.len(), n);

    // L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
      let mut sum = b[i];
      for k in 0..i {
        sum -= l[i * n + k] * z[k];
      }
      z[i] = sum / l[i * n + i];
    }

    // Lᵀ x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
      let mut sum = z[i];
      for k in (i + 1)..n {
        sum -= l[k * n + i] * x[k];
      }
      x[i] = sum / l[i * n + i];
    }
    x
  }
}
