//! # Rolling VaR Estimators
//!
//! $$
//! \mathrm{VaR}^{\Delta N}_t = \hat\mu_t + \Phi^{-1}(1-c)\,\hat\sigma_t
//! $$
//!
//! Delta-Normal and Historical Value-at-Risk over a trailing window, plus
//! EWMA volatility and moving-average diagnostics. Estimates are undefined
//! until the window fills, so rolling outputs are shorter than the input by
//! `window - 1` leading points.

use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;

use crate::error::PortfolioError;
use crate::error::Result;

/// Default trailing window length.
pub const DEFAULT_VAR_WINDOW: usize = 50;
/// Default VaR confidence level.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;
/// RiskMetrics decay factor for EWMA variance.
pub const EWMA_LAMBDA: f64 = 0.94;

fn check_confidence(confidence: f64) -> Result<()> {
  if !(confidence > 0.0 && confidence < 1.0) {
    return Err(PortfolioError::InvalidInput(format!(
      "confidence level must lie in (0, 1), got {confidence}"
    )));
  }
  Ok(())
}

fn check_window(returns: &[f64], window: usize) -> Result<()> {
  if window == 0 {
    return Err(PortfolioError::InvalidInput(
      "rolling window must be positive".to_string(),
    ));
  }
  if returns.len() < window {
    return Err(PortfolioError::InsufficientData(format!(
      "{} observations for a window of {window}",
      returns.len()
    )));
  }
  Ok(())
}

fn standard_normal() -> Result<Normal> {
  Normal::new(0.0, 1.0).map_err(|e| PortfolioError::InvalidInput(e.to_string()))
}

fn window_mean_std(window: &[f64]) -> (f64, f64) {
  let n = window.len() as f64;
  let mean = window.iter().sum::<f64>() / n;
  // Population estimator, matching the rolling fit of the normal model.
  let var = window
    .iter()
    .map(|r| {
      let d = r - mean;
      d * d
    })
    .sum::<f64>()
    / n;
  (mean, var.sqrt())
}

/// Delta-Normal VaR of a single filled window.
///
/// Fits a normal distribution to the window's sample mean and standard
/// deviation and evaluates its `1 - confidence` quantile. A zero-deviation
/// window degenerates to the mean itself.
pub fn delta_normal_var(window: &[f64], confidence: f64) -> Result<f64> {
  check_confidence(confidence)?;
  if window.is_empty() {
    return Err(PortfolioError::InsufficientData(
      "empty VaR window".to_string(),
    ));
  }

  let (mean, std) = window_mean_std(window);
  if std <= 0.0 {
    return Ok(mean);
  }

  let z = standard_normal()?.inverse_cdf(1.0 - confidence);
  Ok(mean + z * std)
}

/// Historical VaR of a single filled window: the empirical `1 - confidence`
/// quantile with linear interpolation, no distributional assumption.
pub fn historical_var(window: &[f64], confidence: f64) -> Result<f64> {
  check_confidence(confidence)?;
  if window.is_empty() {
    return Err(PortfolioError::InsufficientData(
      "empty VaR window".to_string(),
    ));
  }

  Ok(empirical_quantile(window, 1.0 - confidence))
}

fn empirical_quantile(values: &[f64], q: f64) -> f64 {
  let mut sorted = values.to_vec();
  sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

  let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
  let lo = h.floor() as usize;
  let frac = h - lo as f64;

  if lo + 1 < sorted.len() {
    sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
  } else {
    sorted[lo]
  }
}

/// Rolling Delta-Normal VaR; output index `i` covers `returns[i..i + window]`.
pub fn rolling_delta_normal_var(
  returns: &[f64],
  window: usize,
  confidence: f64,
) -> Result<Vec<f64>> {
  check_window(returns, window)?;
  check_confidence(confidence)?;

  let z = standard_normal()?.inverse_cdf(1.0 - confidence);
  let out = returns
    .windows(window)
    .map(|w| {
      let (mean, std) = window_mean_std(w);
      if std <= 0.0 { mean } else { mean + z * std }
    })
    .collect();

  Ok(out)
}

/// Rolling Historical VaR; output index `i` covers `returns[i..i + window]`.
pub fn rolling_historical_var(returns: &[f64], window: usize, confidence: f64) -> Result<Vec<f64>> {
  check_window(returns, window)?;
  check_confidence(confidence)?;

  let q = 1.0 - confidence;
  Ok(
    returns
      .windows(window)
      .map(|w| empirical_quantile(w, q))
      .collect(),
  )
}

/// Exponentially weighted volatility of a return series.
///
/// RiskMetrics recursion on squared returns,
/// `sigma^2_t = lambda * sigma^2_{t-1} + (1 - lambda) * r^2_t`, seeded with
/// the first squared return. Full-length output.
pub fn ewma_volatility(returns: &[f64], lambda: f64) -> Result<Vec<f64>> {
  if !(lambda > 0.0 && lambda < 1.0) {
    return Err(PortfolioError::InvalidInput(format!(
      "EWMA decay factor must lie in (0, 1), got {lambda}"
    )));
  }

  let mut out = Vec::with_capacity(returns.len());
  let mut variance = 0.0;

  for (t, r) in returns.iter().enumerate() {
    let squared = r * r;
    variance = if t == 0 {
      squared
    } else {
      lambda * variance + (1.0 - lambda) * squared
    };
    out.push(variance.sqrt());
  }

  Ok(out)
}

/// Returns standardized by EWMA volatility, `r / sigma`, as a diagnostic.
///
/// Zero-volatility points map to 0 rather than a division by zero.
pub fn standardized_returns(returns: &[f64], ewma_vols: &[f64]) -> Vec<f64> {
  returns
    .iter()
    .zip(ewma_vols.iter())
    .map(|(r, sigma)| if *sigma > 0.0 { r / sigma } else { 0.0 })
    .collect()
}

/// Rolling arithmetic mean; output index `i` covers `returns[i..i + window]`.
pub fn rolling_mean(returns: &[f64], window: usize) -> Result<Vec<f64>> {
  check_window(returns, window)?;

  Ok(
    returns
      .windows(window)
      .map(|w| w.iter().sum::<f64>() / w.len() as f64)
      .collect(),
  )
}

/// Exponentially weighted mean with smoothing from a span,
/// `alpha = 2 / (span + 1)`. Full-length output.
pub fn ewma_mean(returns: &[f64], span: usize) -> Result<Vec<f64>> {
  if span == 0 {
    return Err(PortfolioError::InvalidInput(
      "EWMA span must be positive".to_string(),
    ));
  }

  let alpha = 2.0 / (span as f64 + 1.0);
  let mut out = Vec::with_capacity(returns.len());
  let mut mean = 0.0;

  for (t, r) in returns.iter().enumerate() {
    mean = if t == 0 {
      *r
    } else {
      (1.0 - alpha) * mean + alpha * r
    };
    out.push(mean);
  }

  Ok(out)
}
