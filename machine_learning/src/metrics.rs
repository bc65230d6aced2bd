use ndarray::ArrayView1;

use crate::error::{MlErr, Result};

fn check(y: ArrayView1<f32>, pred: ArrayView1<f64>) -> Result<()> {
    if y.len() != pred.len() {
        return Err(MlErr::SizeMismatch {
            a: "predictions",
            b: "targets",
            got: pred.len(),
            expected: y.len(),
        });
    }

    if y.is_empty() {
        return Err(MlErr::EmptyDataset);
    }

    Ok(())
}

/// Root mean squared error.
pub fn rmse(y: ArrayView1<f32>, pred: ArrayView1<f64>) -> Result<f64> {
    check(y, pred)?;

    let mse = y
        .iter()
        .zip(pred.iter())
        .map(|(&y, &p)| (p - y as f64).powi(2))
        .sum::<f64>()
        / y.len() as f64;

    Ok(mse.sqrt())
}

/// Mean absolute error.
pub fn mae(y: ArrayView1<f32>, pred: ArrayView1<f64>) -> Result<f64> {
    check(y, pred)?;

    let total: f64 = y.iter().zip(pred.iter()).map(|(&y, &p)| (p - y as f64).abs()).sum();
    Ok(total / y.len() as f64)
}

/// Coefficient of determination. A constant target scores zero unless predicted exactly.
pub fn r2(y: ArrayView1<f32>, pred: ArrayView1<f64>) -> Result<f64> {
    check(y, pred)?;

    let mean = y.iter().map(|&v| v as f64).sum::<f64>() / y.len() as f64;
    let ss_tot: f64 = y.iter().map(|&v| (v as f64 - mean).powi(2)).sum();
    let ss_res: f64 = y
        .iter()
        .zip(pred.iter())
        .map(|(&y, &p)| (y as f64 - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_res / ss_tot)
}
