//! # Return/Covariance Estimator
//!
//! $$
//! \hat\Sigma_{ij} = \frac{1}{L-1}\sum_{t=1}^{L} (r_{i,t}-\bar r_i)(r_{j,t}-\bar r_j)
//! $$
//!
//! Per-asset mean daily returns and the sample covariance matrix from
//! aligned return series.

use crate::error::PortfolioError;
use crate::error::Result;

use super::data::ReturnSeries;
use super::data::check_aligned;

/// Mean-return vector and covariance matrix for an asset universe.
#[derive(Clone, Debug)]
pub struct ReturnEstimates {
  /// Arithmetic mean daily return per asset.
  pub mean: Vec<f64>,
  /// Sample covariance matrix, symmetric with non-negative diagonal.
  pub cov: Vec<Vec<f64>>,
}

fn sample_mean(xs: &[f64]) -> f64 {
  if xs.is_empty() {
    0.0
  } else {
    xs.iter().sum::<f64>() / xs.len() as f64
  }
}

/// Estimate mean returns and the sample covariance matrix.
///
/// All series must share length and timestamps and hold at least two
/// observations; fails with [`PortfolioError::InsufficientData`] otherwise.
/// The empty universe fails with [`PortfolioError::InvalidInput`].
pub fn estimate_moments(series: &[ReturnSeries]) -> Result<ReturnEstimates> {
  if series.is_empty() {
    return Err(PortfolioError::InvalidInput(
      "empty asset universe".to_string(),
    ));
  }
  check_aligned(series)?;

  let n_periods = series[0].len();
  if n_periods < 2 {
    return Err(PortfolioError::InsufficientData(format!(
      "covariance needs at least 2 observations, got {n_periods}"
    )));
  }

  let n = series.len();
  let mean: Vec<f64> = series.iter().map(|s| sample_mean(&s.returns)).collect();

  let mut cov = vec![vec![0.0; n]; n];
  for i in 0..n {
    for j in i..n {
      let mut acc = 0.0;
      for t in 0..n_periods {
        acc += (series[i].returns[t] - mean[i]) * (series[j].returns[t] - mean[j]);
      }
      let c = acc / (n_periods - 1) as f64;
      cov[i][j] = c;
      cov[j][i] = c;
    }
  }

  Ok(ReturnEstimates { mean, cov })
}
