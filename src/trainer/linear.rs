use crate::error::TrainError;
use crate::model::TrainedModel;

/// Fixed ridge penalty added to every diagonal entry of the Gram matrix.
/// Keeps the solve stable when days are scarce or features collinear.
pub const RIDGE_LAMBDA: f64 = 0.01;

const PIVOT_EPSILON: f64 = 1e-10;

/// Ridge regression via the normal equations. The design matrix gets a
/// leading column of ones, so `w[0]` is the bias and the rest are the
/// per-feature coefficients. Features are used as-is; callers pre-normalize
/// them into comparable ranges.
pub fn train_linear(features: &[Vec<f64>], targets: &[f64]) -> Result<TrainedModel, TrainError> {
    if features.is_empty() || features.len() != targets.len() {
        return Err(TrainError::EmptyTrainingSet);
    }
    // Rows from different extractor versions may disagree in length; size
    // the system to the widest row and read missing entries as 0.0.
    let width = features.iter().map(Vec::len).max().unwrap_or(0);
    let dim = width + 1;

    let mut gram = vec![vec![0.0; dim]; dim];
    let mut rhs = vec![0.0; dim];
    for (row, &y) in features.iter().zip(targets) {
        for i in 0..dim {
            let xi = if i == 0 {
                1.0
            } else {
                row.get(i - 1).copied().unwrap_or(0.0)
            };
            rhs[i] += xi * y;
            for j in 0..dim {
                let xj = if j == 0 {
                    1.0
                } else {
                    row.get(j - 1).copied().unwrap_or(0.0)
                };
                gram[i][j] += xi * xj;
            }
        }
    }
    for (i, row) in gram.iter_mut().enumerate() {
        row[i] += RIDGE_LAMBDA;
    }

    let weights = solve(&mut gram, &mut rhs)?;
    Ok(TrainedModel::Linear {
        bias: weights[0],
        coefficients: weights[1..].to_vec(),
    })
}

/// Gaussian elimination with partial pivoting. Consumes its inputs.
fn solve(a: &mut [Vec<f64>], b: &mut [f64]) -> Result<Vec<f64>, TrainError> {
    let n = a.len();

    for col in 0..n {
        // Swap the row with the largest pivot magnitude into position.
        let mut max_row = col;
        let mut max_val = a[col][col].abs();
        for row in (col + 1)..n {
            if a[row][col].abs() > max_val {
                max_val = a[row][col].abs();
                max_row = row;
            }
        }
        if max_val < PIVOT_EPSILON {
            return Err(TrainError::SingularMatrix);
        }
        if max_row != col {
            a.swap(col, max_row);
            b.swap(col, max_row);
        }

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[i][j] * x[j];
        }
        x[i] = sum / a[i][i];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_recovers_known_system() {
        // [2 1; 1 3] x = [5; 10] -> x = [1, 3]
        let mut a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let mut b = vec![5.0, 10.0];
        let x = solve(&mut a, &mut b).expect("well-conditioned system");
        assert!((x[0] - 1.0).abs() < 1e-9);
        assert!((x[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn solve_rejects_singular_matrix() {
        let mut a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        let mut b = vec![1.0, 2.0];
        assert!(matches!(
            solve(&mut a, &mut b),
            Err(TrainError::SingularMatrix)
        ));
    }
}
