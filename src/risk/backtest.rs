//! # VaR Backtesting
//!
//! $$
//! p = \Pr\{X \ge k\}, \quad X \sim \mathrm{Bin}(n, p_0)
//! $$
//!
//! Breach counting against rolling VaR estimates and the Kupiec-style
//! unconditional coverage test.

use statrs::distribution::Binomial;
use statrs::distribution::DiscreteCDF;

use crate::error::PortfolioError;
use crate::error::Result;

use super::var::DEFAULT_CONFIDENCE;
use super::var::DEFAULT_VAR_WINDOW;
use super::var::EWMA_LAMBDA;
use super::var::ewma_mean;
use super::var::ewma_volatility;
use super::var::rolling_delta_normal_var;
use super::var::rolling_historical_var;
use super::var::rolling_mean;
use super::var::standardized_returns;

/// Configuration for [`run_var_backtest`].
#[derive(Clone, Copy, Debug)]
pub struct VarBacktestConfig {
  /// Trailing window length for the rolling VaR estimates.
  pub window: usize,
  /// VaR confidence level; the nominal breach probability is its
  /// complement.
  pub confidence: f64,
}

impl Default for VarBacktestConfig {
  fn default() -> Self {
    Self {
      window: DEFAULT_VAR_WINDOW,
      confidence: DEFAULT_CONFIDENCE,
    }
  }
}

/// Coverage statistics for both VaR models over one return series.
#[derive(Clone, Copy, Debug)]
pub struct BacktestResult {
  /// Breaches of the Delta-Normal estimate.
  pub delta_normal_violations: usize,
  /// Breaches of the Historical estimate.
  pub historical_violations: usize,
  /// Observations in the full return series.
  pub observations: usize,
  /// Nominal breach count, `observations * (1 - confidence)`.
  pub expected_violations: f64,
  /// One-sided binomial p-value for the Delta-Normal breach count.
  pub delta_normal_p_value: f64,
  /// One-sided binomial p-value for the Historical breach count.
  pub historical_p_value: f64,
}

/// Rolling estimates, diagnostics and coverage statistics of one backtest.
#[derive(Clone, Debug)]
pub struct VarBacktestReport {
  /// Window length the estimates were computed with.
  pub window: usize,
  /// Delta-Normal VaR, aligned to the input minus `window - 1` leading
  /// points.
  pub delta_normal_var: Vec<f64>,
  /// Historical VaR, same alignment.
  pub historical_var: Vec<f64>,
  /// Rolling mean diagnostic, same alignment.
  pub rolling_mean: Vec<f64>,
  /// EWMA mean diagnostic (span = window), full length.
  pub ewma_mean: Vec<f64>,
  /// EWMA volatility (lambda = 0.94), full length.
  pub ewma_volatility: Vec<f64>,
  /// Returns standardized by EWMA volatility, full length.
  pub standardized_returns: Vec<f64>,
  /// Coverage statistics.
  pub result: BacktestResult,
}

/// One-sided p-value of observing at least `violations` breaches in
/// `observations` trials at nominal breach probability `breach_probability`:
/// `1 - BinomialCDF(violations - 1; n, p)`.
///
/// Zero breaches give exactly 1.
pub fn kupiec_p_value(
  violations: usize,
  observations: usize,
  breach_probability: f64,
) -> Result<f64> {
  if observations == 0 {
    return Err(PortfolioError::InsufficientData(
      "no observations to test".to_string(),
    ));
  }
  if violations == 0 {
    return Ok(1.0);
  }

  let binomial = Binomial::new(breach_probability, observations as u64)
    .map_err(|e| PortfolioError::InvalidInput(e.to_string()))?;

  Ok(1.0 - binomial.cdf(violations as u64 - 1))
}

fn count_violations(returns: &[f64], var_estimates: &[f64], window: usize) -> usize {
  // Estimate i covers the window ending at returns[i + window - 1]; a
  // breach is a realized return strictly below it.
  var_estimates
    .iter()
    .enumerate()
    .filter(|(i, var)| returns[i + window - 1] < **var)
    .count()
}

/// Run both VaR models over a portfolio return series and test their
/// coverage.
///
/// Fails with [`PortfolioError::InsufficientData`] when the series is
/// shorter than the window, and [`PortfolioError::InvalidInput`] for a zero
/// window or a confidence level outside `(0, 1)`.
pub fn run_var_backtest(returns: &[f64], config: &VarBacktestConfig) -> Result<VarBacktestReport> {
  let window = config.window;
  let confidence = config.confidence;

  let delta_normal = rolling_delta_normal_var(returns, window, confidence)?;
  let historical = rolling_historical_var(returns, window, confidence)?;
  let means = rolling_mean(returns, window)?;
  let ewma_means = ewma_mean(returns, window)?;
  let ewma_vols = ewma_volatility(returns, EWMA_LAMBDA)?;
  let standardized = standardized_returns(returns, &ewma_vols);

  let delta_normal_violations = count_violations(returns, &delta_normal, window);
  let historical_violations = count_violations(returns, &historical, window);

  let observations = returns.len();
  let breach_probability = 1.0 - confidence;
  let expected_violations = observations as f64 * breach_probability;

  let result = BacktestResult {
    delta_normal_violations,
    historical_violations,
    observations,
    expected_violations,
    delta_normal_p_value: kupiec_p_value(delta_normal_violations, observations, breach_probability)?,
    historical_p_value: kupiec_p_value(historical_violations, observations, breach_probability)?,
  };

  tracing::debug!(
    observations,
    delta_normal_violations,
    historical_violations,
    "var backtest finished"
  );

  Ok(VarBacktestReport {
    window,
    delta_normal_var: delta_normal,
    historical_var: historical,
    rolling_mean: means,
    ewma_mean: ewma_means,
    ewma_volatility: ewma_vols,
    standardized_returns: standardized,
    result,
  })
}
