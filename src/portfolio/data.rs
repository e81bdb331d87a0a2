//! # Portfolio Data
//!
//! $$
//! r_{p,t} = \textstyle\sum_i w_i r_{i,t}
//! $$
//!
//! Return series containers, alignment validation, portfolio blending and
//! annualization helpers.

use chrono::NaiveDate;

use crate::error::PortfolioError;
use crate::error::Result;

use super::types::TRADING_DAYS;

/// Time-ordered daily return series for a single asset.
///
/// Timestamps and returns are index-aligned; the series is immutable after
/// construction. Deduplication, gap filling and sorting are the data
/// loader's responsibility, upstream of this crate.
#[derive(Clone, Debug)]
pub struct ReturnSeries {
  /// Asset identifier.
  pub ticker: String,
  /// Observation dates, ascending.
  pub timestamps: Vec<NaiveDate>,
  /// Daily returns in decimal form.
  pub returns: Vec<f64>,
}

impl ReturnSeries {
  /// Construct a validated series.
  ///
  /// Fails with [`PortfolioError::InvalidInput`] if timestamps and returns
  /// differ in length or any return is non-finite.
  pub fn new(
    ticker: impl Into<String>,
    timestamps: Vec<NaiveDate>,
    returns: Vec<f64>,
  ) -> Result<Self> {
    let ticker = ticker.into();

    if timestamps.len() != returns.len() {
      return Err(PortfolioError::InvalidInput(format!(
        "{ticker}: {} timestamps vs {} returns",
        timestamps.len(),
        returns.len()
      )));
    }
    if let Some(bad) = returns.iter().find(|r| !r.is_finite()) {
      return Err(PortfolioError::InvalidInput(format!(
        "{ticker}: non-finite return {bad}"
      )));
    }

    Ok(Self {
      ticker,
      timestamps,
      returns,
    })
  }

  /// Number of observations.
  pub fn len(&self) -> usize {
    self.returns.len()
  }

  /// Whether the series holds no observations.
  pub fn is_empty(&self) -> bool {
    self.returns.is_empty()
  }

  /// Restrict the series to observations with `start <= t <= end`.
  pub fn slice_dates(&self, start: NaiveDate, end: NaiveDate) -> Self {
    let mut timestamps = Vec::new();
    let mut returns = Vec::new();

    for (ts, r) in self.timestamps.iter().zip(self.returns.iter()) {
      if *ts >= start && *ts <= end {
        timestamps.push(*ts);
        returns.push(*r);
      }
    }

    Self {
      ticker: self.ticker.clone(),
      timestamps,
      returns,
    }
  }
}

/// Convert close prices to simple daily returns.
pub fn simple_returns_series(closes: &[f64]) -> Vec<f64> {
  let mut out = Vec::with_capacity(closes.len().saturating_sub(1));
  for i in 1..closes.len() {
    if closes[i - 1] > 0.0 && closes[i] > 0.0 {
      out.push(closes[i] / closes[i - 1] - 1.0);
    }
  }
  out
}

/// Verify that all series share length and timestamps.
///
/// Fails with [`PortfolioError::InsufficientData`] on any disagreement; the
/// first series is the reference.
pub(crate) fn check_aligned(series: &[ReturnSeries]) -> Result<()> {
  let Some(first) = series.first() else {
    return Ok(());
  };

  for other in &series[1..] {
    if other.len() != first.len() {
      return Err(PortfolioError::InsufficientData(format!(
        "{} has {} observations, {} has {}",
        first.ticker,
        first.len(),
        other.ticker,
        other.len()
      )));
    }
    if other.timestamps != first.timestamps {
      return Err(PortfolioError::InsufficientData(format!(
        "timestamps of {} do not match {}",
        other.ticker, first.ticker
      )));
    }
  }

  Ok(())
}

/// Blend aligned per-asset returns into a portfolio return series under
/// fixed weights.
///
/// The output is recomputed from scratch for every weight vector; nothing
/// is mutated in place.
pub fn portfolio_returns(series: &[ReturnSeries], weights: &[f64]) -> Result<Vec<f64>> {
  if series.is_empty() {
    return Err(PortfolioError::InvalidInput(
      "empty asset universe".to_string(),
    ));
  }
  if series.len() != weights.len() {
    return Err(PortfolioError::DimensionMismatch(format!(
      "{} series vs {} weights",
      series.len(),
      weights.len()
    )));
  }
  check_aligned(series)?;

  let n_periods = series[0].len();
  let blended = (0..n_periods)
    .map(|t| {
      weights
        .iter()
        .zip(series.iter())
        .map(|(w, s)| w * s.returns[t])
        .sum()
    })
    .collect();

  Ok(blended)
}

/// Annualize a daily mean-return vector.
pub fn annualize_mean(mean: &[f64]) -> Vec<f64> {
  mean.iter().map(|m| m * TRADING_DAYS).collect()
}

/// Annualize a daily covariance matrix.
///
/// Scaling by a positive scalar preserves symmetry and PSD-ness.
pub fn annualize_cov(cov: &[Vec<f64>]) -> Vec<Vec<f64>> {
  cov
    .iter()
    .map(|row| row.iter().map(|c| c * TRADING_DAYS).collect())
    .collect()
}
