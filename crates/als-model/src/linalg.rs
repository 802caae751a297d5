//! Dense helpers for small k x k systems.
//!
//! Matrices are row-major `Vec<f32>` of length `n * n`.

/// Inner product of two equal-length slices
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// YᵀY for a row-major `rows x k` factor table
pub fn gram(factors: &[f32], k: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; k * k];
    for row in factors.chunks_exact(k) {
        add_outer(&mut out, row, 1.0);
    }
    out
}

/// out += scale * v vᵀ
pub fn add_outer(out: &mut [f32], v: &[f32], scale: f32) {
    let k = v.len();
    for i in 0..k {
        let vi = v[i] * scale;
        if vi == 0.0 {
            continue;
        }
        for j in 0..k {
            out[i * k + j] += vi * v[j];
        }
    }
}

/// Solve `a x = b` for symmetric positive definite `a` (A = L Lᵀ).
///
/// Returns `None` when `a` is not positive definite.
pub fn cholesky_solve(a: &[f32], b: &[f32]) -> Option<Vec<f32>> {
    let n = b.len();
    debug_assert_eq!(a.len(), n * n);

    let mut l = vec![0.0f32; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[i * n + k] * l[j * n + k];
            }
            if i == j {
                let diag = a[i * n + i] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[i * n + i] = diag.sqrt();
            } else {
                l[i * n + j] = (a[i * n + j] - sum) / l[j * n + j];
            }
        }
    }

    // L y = b
    let mut y = vec![0.0f32; n];
    for i in 0..n {
        let sum: f32 = (0..i).map(|j| l[i * n + j] * y[j]).sum();
        y[i] = (b[i] - sum) / l[i * n + i];
    }

    // Lᵀ x = y
    let mut x = vec![0.0f32; n];
    for i in (0..n).rev() {
        let sum: f32 = ((i + 1)..n).map(|j| l[j * n + i] * x[j]).sum();
        x[i] = (y[i] - sum) / l[i * n + i];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f32], b: &[f32]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn test_gram() {
        // two rows of k=2: [1, 2], [3, 4]
        let g = gram(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(g, vec![10.0, 14.0, 14.0, 20.0]);
    }

    #[test]
    fn test_cholesky_solve() {
        // [[4, 2], [2, 3]] x = [2, 1]  ->  x = [0.5, 0]
        let x = cholesky_solve(&[4.0, 2.0, 2.0, 3.0], &[2.0, 1.0]).unwrap();
        assert!(close(&x, &[0.5, 0.0]));
    }

    #[test]
    fn test_cholesky_identity() {
        let x = cholesky_solve(&[1.0, 0.0, 0.0, 1.0], &[3.0, -2.0]).unwrap();
        assert!(close(&x, &[3.0, -2.0]));
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        assert!(cholesky_solve(&[0.0, 1.0, 1.0, 0.0], &[1.0, 1.0]).is_none());
    }
}
