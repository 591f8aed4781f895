//! Small dense solvers used by the estimators.

const PIVOT_EPSILON: f64 = 1e-12;

/// Solves `a * x = b` with Gaussian elimination and partial pivoting.
///
/// Returns `None` when the system is singular relative to its scale.
pub fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return None;
    }

    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, value| acc.max(value.abs()));
    if scale == 0.0 {
        return if n == 0 { Some(Vec::new()) } else { None };
    }

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&lhs, &rhs| {
            a[lhs][col]
                .abs()
                .partial_cmp(&a[rhs][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot_row][col].abs() <= PIVOT_EPSILON * scale {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
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

    x.iter().all(|value| value.is_finite()).then_some(x)
}

/// Ordinary least squares through the normal equations.
pub fn least_squares(design: &[Vec<f64>], target: &[f64]) -> Option<Vec<f64>> {
    let cols = design.first().map(Vec::len)?;
    if design.len() != target.len() || design.len() <= cols {
        return None;
    }

    let mut xtx = vec![vec![0.0; cols]; cols];
    let mut xty = vec![0.0; cols];
    for (row, &y) in design.iter().zip(target) {
        for i in 0..cols {
            xty[i] += row[i] * y;
            for j in i..cols {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..cols {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    solve(xtx, xty)
}

/// Levinson-Durbin recursion on autocovariances `acov[0..=order]`.
pub fn levinson_durbin(acov: &[f64], order: usize) -> Option<Vec<f64>> {
    if acov.len() <= order || acov[0] <= PIVOT_EPSILON {
        return None;
    }

    let mut phi = vec![0.0; order];
    let mut error = acov[0];
    for k in 0..order {
        let mut acc = acov[k + 1];
        for j in 0..k {
            acc -= phi[j] * acov[k - j];
        }
        let reflection = acc / error;
        let previous = phi.clone();
        phi[k] = reflection;
        for j in 0..k {
            phi[j] = previous[j] - reflection * previous[k - 1 - j];
        }
        error *= 1.0 - reflection * reflection;
        if error <= PIVOT_EPSILON {
            break;
        }
    }

    phi.iter().all(|value| value.is_finite()).then_some(phi)
}

/// Biased sample autocovariances up to `max_lag` of an already centered series.
pub fn autocovariances(centered: &[f64], max_lag: usize) -> Vec<f64> {
    let n = centered.len() as f64;
    (0..=max_lag)
        .map(|lag| {
            centered
                .iter()
                .skip(lag)
                .zip(centered)
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / n
        })
        .collect()
}
