// Trend smoothers: Whittaker penalized least squares and moving average

use crate::error::{EngineError, Result};
use serde::Deserialize;

pub const WHITTAKER_RANGE: (f64, f64) = (0.0, 5.0);
pub const WHITTAKER_DEFAULT: f64 = 2.0;
pub const WINDOW_RANGE: (f64, f64) = (1.0, 50.0);
pub const WINDOW_DEFAULT: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SmootherKind {
    #[default]
    None,
    Whittaker,
    MovingAverage,
}

/// Smoother selection plus its slider parameter.
///
/// For `whittaker` the parameter is the base-10 exponent of the penalty
/// weight; for `moving-average` it is the window length in rows.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SmoothingConfig {
    #[serde(default)]
    pub kind: SmootherKind,
    #[serde(default)]
    pub parameter: Option<f64>,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            kind: SmootherKind::None,
            parameter: None,
        }
    }
}

impl SmoothingConfig {
    pub fn new(kind: SmootherKind, parameter: Option<f64>) -> Self {
        Self { kind, parameter }
    }

    /// Parameter with the per-kind default applied
    pub fn effective_parameter(&self) -> f64 {
        match self.kind {
            SmootherKind::None => 0.0,
            SmootherKind::Whittaker => self.parameter.unwrap_or(WHITTAKER_DEFAULT),
            SmootherKind::MovingAverage => self.parameter.unwrap_or(WINDOW_DEFAULT),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let p = self.effective_parameter();
        let (lo, hi, what) = match self.kind {
            SmootherKind::None => return Ok(()),
            SmootherKind::Whittaker => (WHITTAKER_RANGE.0, WHITTAKER_RANGE.1, "whittaker exponent"),
            SmootherKind::MovingAverage => (WINDOW_RANGE.0, WINDOW_RANGE.1, "moving-average window"),
        };
        if !(lo..=hi).contains(&p) {
            return Err(EngineError::InvalidSmoothing(format!(
                "{} {} outside [{}, {}]",
                what, p, lo, hi
            )));
        }
        if self.kind == SmootherKind::MovingAverage && p.fract() != 0.0 {
            return Err(EngineError::InvalidSmoothing(format!(
                "{} {} is not a whole number of rows",
                what, p
            )));
        }
        Ok(())
    }

    /// Smooth `y` (already ordered by X). `None` when no smoother is selected;
    /// absent outputs are `None` entries.
    pub fn apply(&self, y: &[f64]) -> Result<Option<Vec<Option<f64>>>> {
        match self.kind {
            SmootherKind::None => Ok(None),
            SmootherKind::Whittaker => {
                let lambda = 10f64.powf(self.effective_parameter());
                let z = whittaker_smooth(y, lambda)?;
                Ok(Some(z.into_iter().map(Some).collect()))
            }
            SmootherKind::MovingAverage => {
                let window = self.effective_parameter() as usize;
                Ok(Some(moving_average(y, window)))
            }
        }
    }
}

/// Whittaker smoother with second-order differences.
///
/// Solves `(I + lambda * D'D) z = y`, where `D` is the `(n-2) x n` second
/// difference operator. The system matrix is symmetric pentadiagonal and is
/// factored in band storage as `L D L'`, O(n) time and memory.
pub fn whittaker_smooth(y: &[f64], lambda: f64) -> Result<Vec<f64>> {
    let n = y.len();
    if n < 3 || !lambda.is_finite() || lambda < 0.0 {
        return Err(EngineError::SingularSmoothingSystem { points: n });
    }

    // Band storage of A = I + lambda * D'D: main diagonal and two sub-diagonals
    let mut a0 = vec![1.0; n];
    let mut a1 = vec![0.0; n - 1];
    let mut a2 = vec![0.0; n - 2];
    const STENCIL: [f64; 3] = [1.0, -2.0, 1.0];
    for k in 0..n - 2 {
        for p in 0..3 {
            a0[k + p] += lambda * STENCIL[p] * STENCIL[p];
        }
        a1[k] += lambda * STENCIL[1] * STENCIL[0];
        a1[k + 1] += lambda * STENCIL[2] * STENCIL[1];
        a2[k] += lambda * STENCIL[2] * STENCIL[0];
    }

    // LDL' factorization: l1[i] = L[i+1][i], l2[i] = L[i+2][i]
    let mut d = vec![0.0; n];
    let mut l1 = vec![0.0; n - 1];
    let mut l2 = vec![0.0; n - 2];
    for i in 0..n {
        let mut di = a0[i];
        if i >= 1 {
            di -= l1[i - 1] * l1[i - 1] * d[i - 1];
        }
        if i >= 2 {
            di -= l2[i - 2] * l2[i - 2] * d[i - 2];
        }
        if !(di.is_finite() && di > 0.0) {
            return Err(EngineError::SingularSmoothingSystem { points: n });
        }
        d[i] = di;

        if i + 1 < n {
            let mut v = a1[i];
            if i >= 1 {
                v -= l2[i - 1] * l1[i - 1] * d[i - 1];
            }
            l1[i] = v / di;
        }
        if i + 2 < n {
            l2[i] = a2[i] / di;
        }
    }

    // Forward substitution (L w = y), diagonal scaling, back substitution (L' z = v)
    let mut z = y.to_vec();
    for i in 1..n {
        z[i] -= l1[i - 1] * z[i - 1];
        if i >= 2 {
            z[i] -= l2[i - 2] * z[i - 2];
        }
    }
    for i in 0..n {
        z[i] /= d[i];
    }
    for i in (0..n - 1).rev() {
        z[i] -= l1[i] * z[i + 1];
        if i + 2 < n {
            z[i] -= l2[i] * z[i + 2];
        }
    }

    Ok(z)
}

/// Trailing rolling mean; the first `window - 1` outputs are absent.
/// Any NaN inside a window makes that output NaN.
pub fn moving_average(y: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; y.len()];
    }
    (0..y.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                let slice = &y[i + 1 - window..=i];
                Some(slice.iter().sum::<f64>() / window as f64)
            }
        })
        .collect()
}
