//! # Risk/Return Metrics
//!
//! $$
//! \text{Sharpe} = \frac{252\,\bar r - r_f}{\sigma\sqrt{252}}
//! $$
//!
//! Annualized return, volatility, Sharpe ratio and cumulative return for a
//! portfolio return series.

use crate::error::PortfolioError;
use crate::error::Result;

use super::types::TRADING_DAYS;

/// Risk/return summary of a portfolio (or single-asset) return series.
#[derive(Clone, Copy, Debug)]
pub struct PortfolioMetrics {
  /// Arithmetic mean daily return.
  pub avg_daily_return: f64,
  /// Sample standard deviation of daily returns.
  pub std_dev: f64,
  /// Mean daily return scaled by trading days.
  pub annualized_return: f64,
  /// Daily standard deviation scaled by the square root of trading days.
  pub annualized_volatility: f64,
  /// Annualized Sharpe ratio; 0 when volatility is zero.
  pub sharpe_ratio: f64,
  /// Compounded return over the full series.
  pub cumulative_return: f64,
}

/// Compute risk/return metrics for a return series.
///
/// Pure function; callable per asset or for a blended portfolio. Fails with
/// [`PortfolioError::InsufficientData`] on an empty series.
pub fn portfolio_metrics(returns: &[f64], risk_free_rate: f64) -> Result<PortfolioMetrics> {
  if returns.is_empty() {
    return Err(PortfolioError::InsufficientData(
      "empty return series".to_string(),
    ));
  }

  let n = returns.len() as f64;
  let avg_daily_return = returns.iter().sum::<f64>() / n;

  let std_dev = if returns.len() < 2 {
    0.0
  } else {
    let acc: f64 = returns
      .iter()
      .map(|r| {
        let d = r - avg_daily_return;
        d * d
      })
      .sum();
    (acc / (n - 1.0)).sqrt()
  };

  let annualized_return = avg_daily_return * TRADING_DAYS;
  let annualized_volatility = std_dev * TRADING_DAYS.sqrt();

  let sharpe_ratio = if annualized_volatility > 0.0 {
    (annualized_return - risk_free_rate) / annualized_volatility
  } else {
    0.0
  };

  let cumulative_return = returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0;

  Ok(PortfolioMetrics {
    avg_daily_return,
    std_dev,
    annualized_return,
    annualized_volatility,
    sharpe_ratio,
    cumulative_return,
  })
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;

  #[test]
  fn constant_series_has_zero_sharpe_not_nan() {
    let metrics = portfolio_metrics(&[0.01; 30], 0.05).unwrap();

    assert_eq!(metrics.std_dev, 0.0);
    assert_eq!(metrics.sharpe_ratio, 0.0);
    assert!(metrics.sharpe_ratio.is_finite());
  }

  #[test]
  fn cumulative_return_compounds() {
    let metrics = portfolio_metrics(&[0.1, -0.05, 0.02], 0.0).unwrap();
    assert_relative_eq!(
      metrics.cumulative_return,
      1.1 * 0.95 * 1.02 - 1.0,
      max_relative = 1e-12
    );
  }

  #[test]
  fn annualizes_known_series() {
    let returns = vec![0.01, -0.01, 0.02, 0.0];
    let metrics = portfolio_metrics(&returns, 0.0).unwrap();

    assert_relative_eq!(metrics.avg_daily_return, 0.005, max_relative = 1e-12);
    assert_relative_eq!(metrics.annualized_return, 0.005 * 252.0, max_relative = 1e-12);
    assert_relative_eq!(
      metrics.sharpe_ratio,
      metrics.annualized_return / (metrics.std_dev * 252.0_f64.sqrt()),
      max_relative = 1e-12
    );
  }

  #[test]
  fn rejects_empty_series() {
    assert!(matches!(
      portfolio_metrics(&[], 0.0),
      Err(PortfolioError::InsufficientData(_))
    ));
  }
}
