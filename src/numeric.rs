//! Small dense least-squares solver
//!
//! The design matrices here are tiny (a smoothing window of 3 columns, an ADF
//! regression of a handful of lags), so normal equations with partial-pivot
//! Gaussian elimination are accurate enough and allocation-light.

/// Result of an ordinary least-squares fit
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    /// Standard error of each coefficient
    pub std_errors: Vec<f64>,
    /// Residual sum of squares
    pub rss: f64,
}

/// Solve `a x = b` in place. Returns `None` for a singular system.
pub fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        let pivot_row = a[col].clone();
        let pivot_b = b[col];
        for row in col + 1..n {
            let factor = a[row][col] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * pivot_row[k];
            }
            b[row] -= factor * pivot_b;
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

/// Invert a small square matrix. Returns `None` if singular.
fn invert(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut columns = Vec::with_capacity(n);
    for i in 0..n {
        let mut e = vec![0.0; n];
        e[i] = 1.0;
        columns.push(solve(a.to_vec(), e)?);
    }
    // columns[i] is column i of the inverse
    Some(
        (0..n)
            .map(|r| (0..n).map(|c| columns[c][r]).collect())
            .collect(),
    )
}

fn normal_equations(rows: &[Vec<f64>], y: &[f64]) -> (Vec<Vec<f64>>, Vec<f64>) {
    let p = rows.first().map_or(0, Vec::len);
    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, &yi) in rows.iter().zip(y) {
        for i in 0..p {
            xty[i] += row[i] * yi;
            for j in 0..p {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    (xtx, xty)
}

/// Fit `y ~ X` by ordinary least squares.
///
/// `rows` holds one design row per observation. Returns `None` when the
/// system is under-determined or singular.
pub fn ols(rows: &[Vec<f64>], y: &[f64]) -> Option<OlsFit> {
    let n = y.len();
    let p = rows.first().map_or(0, Vec::len);
    if p == 0 || n <= p || rows.len() != n {
        return None;
    }

    let (xtx, xty) = normal_equations(rows, y);
    let coefficients = solve(xtx.clone(), xty)?;

    let rss: f64 = rows
        .iter()
        .zip(y)
        .map(|(row, &yi)| {
            let fitted: f64 = row.iter().zip(&coefficients).map(|(x, b)| x * b).sum();
            (yi - fitted).powi(2)
        })
        .sum();

    let sigma2 = rss / (n - p) as f64;
    let inverse = invert(&xtx)?;
    let std_errors = (0..p)
        .map(|i| (sigma2 * inverse[i][i]).max(0.0).sqrt())
        .collect();

    Some(OlsFit {
        coefficients,
        std_errors,
        rss,
    })
}

/// Least-squares polynomial of `order` through `(x, y)` points.
///
/// Coefficients are in ascending power order.
pub fn polyfit(x: &[f64], y: &[f64], order: usize) -> Option<Vec<f64>> {
    if x.len() != y.len() || x.len() <= order {
        return None;
    }
    let rows: Vec<Vec<f64>> = x
        .iter()
        .map(|&xi| (0..=order).map(|k| xi.powi(k as i32)).collect())
        .collect();
    let (xtx, xty) = normal_equations(&rows, y);
    solve(xtx, xty)
}

/// Evaluate a polynomial with ascending-power coefficients
pub fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}
