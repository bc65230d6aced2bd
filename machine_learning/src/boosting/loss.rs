use std::ops::{Add, AddAssign, Sub};

use ndarray::ArrayView1;

/// First and second order derivatives of the loss for one or more samples.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GradPair {
    pub g: f64,
    pub h: f64,
}

impl GradPair {
    pub fn new(g: f64, h: f64) -> Self {
        Self { g, h }
    }
}

impl Add for GradPair {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.g + rhs.g, self.h + rhs.h)
    }
}

impl AddAssign for GradPair {
    fn add_assign(&mut self, rhs: Self) {
        self.g += rhs.g;
        self.h += rhs.h;
    }
}

impl Sub for GradPair {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.g - rhs.g, self.h - rhs.h)
    }
}

/// A twice differentiable objective the booster descends on.
pub trait LossFn {
    /// The constant prediction every sample starts from.
    fn base_score(&self, y: ArrayView1<f32>) -> f64;

    /// Writes the derivatives of the loss with respect to each prediction into `out`.
    fn gradients(&self, preds: &[f64], y: ArrayView1<f32>, out: &mut [GradPair]);
}

/// Squared error objective, `(pred - y)^2 / 2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SquaredError;

impl SquaredError {
    /// Returns a new `SquaredError`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for SquaredError {
    fn base_score(&self, y: ArrayView1<f32>) -> f64 {
        if y.is_empty() {
            return 0.0;
        }

        y.iter().map(|&v| v as f64).sum::<f64>() / y.len() as f64
    }

    fn gradients(&self, preds: &[f64], y: ArrayView1<f32>, out: &mut [GradPair]) {
        for ((gp, &pred), &y) in out.iter_mut().zip(preds).zip(y.iter()) {
            *gp = GradPair::new(pred - y as f64, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn squared_error_starts_from_the_mean() {
        let y = array![1.0f32, 2.0, 6.0];
        assert_eq!(SquaredError.base_score(y.view()), 3.0);
    }

    #[test]
    fn squared_error_gradients() {
        let y = array![1.0f32, -2.0];
        let mut out = [GradPair::default(); 2];
        SquaredError.gradients(&[1.5, -3.0], y.view(), &mut out);

        assert_eq!(out, [GradPair::new(0.5, 1.0), GradPair::new(-1.0, 1.0)]);
    }
}
