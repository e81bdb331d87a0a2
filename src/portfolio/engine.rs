//! # Analysis Engine
//!
//! $$
//! (\mu, \Sigma) \to \mathbf{w} \to r_p \to (\text{metrics}, \text{backtest})
//! $$
//!
//! Per-run orchestration: each analysis is described by an explicit,
//! immutable [`AnalysisRequest`] instead of hidden session state. Weight
//! selection stays with the caller: the engine scores a given weight
//! vector, it never picks an optimization objective.

use chrono::NaiveDate;

use crate::error::PortfolioError;
use crate::error::Result;
use crate::risk::VarBacktestConfig;
use crate::risk::VarBacktestReport;
use crate::risk::run_var_backtest;

use super::data::ReturnSeries;
use super::data::portfolio_returns;
use super::estimator::ReturnEstimates;
use super::estimator::estimate_moments;
use super::metrics::PortfolioMetrics;
use super::metrics::portfolio_metrics;

/// One analysis run over a fixed universe, date range and weight vector.
#[derive(Clone, Debug)]
pub struct AnalysisRequest {
  /// Universe tickers, in weight order.
  pub tickers: Vec<String>,
  /// First date included.
  pub start: NaiveDate,
  /// Last date included.
  pub end: NaiveDate,
  /// Portfolio weights, one per ticker.
  pub weights: Vec<f64>,
  /// Annual risk-free rate in decimal form, 0.0 if unavailable.
  pub risk_free_rate: f64,
}

/// Runtime configuration for [`AnalysisEngine`].
#[derive(Clone, Copy, Debug)]
pub struct AnalysisConfig {
  /// Rolling window for the VaR backtest.
  pub var_window: usize,
  /// Confidence level for the VaR backtest.
  pub confidence: f64,
}

impl Default for AnalysisConfig {
  fn default() -> Self {
    let var = VarBacktestConfig::default();
    Self {
      var_window: var.window,
      confidence: var.confidence,
    }
  }
}

/// Everything one analysis run produces, safe to hand to a presentation
/// layer as plain values.
#[derive(Clone, Debug)]
pub struct AnalysisReport {
  /// Mean returns and covariance over the sliced date range.
  pub estimates: ReturnEstimates,
  /// Blended portfolio return series under the requested weights.
  pub portfolio_returns: Vec<f64>,
  /// Risk/return metrics of the blended series.
  pub metrics: PortfolioMetrics,
  /// Rolling VaR estimates and coverage statistics.
  pub backtest: VarBacktestReport,
}

/// Stateless per-request analysis runner.
#[derive(Clone, Debug, Default)]
pub struct AnalysisEngine {
  config: AnalysisConfig,
}

impl AnalysisEngine {
  /// Construct an engine with explicit configuration.
  pub fn new(config: AnalysisConfig) -> Self {
    Self { config }
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &AnalysisConfig {
    &self.config
  }

  /// Run one analysis: slice each series to the request's date range,
  /// estimate moments, blend the portfolio series, compute metrics and
  /// backtest both VaR models.
  pub fn analyze(&self, series: &[ReturnSeries], request: &AnalysisRequest) -> Result<AnalysisReport> {
    if request.tickers.len() != series.len() {
      return Err(PortfolioError::DimensionMismatch(format!(
        "{} tickers requested for {} series",
        request.tickers.len(),
        series.len()
      )));
    }
    if request.weights.len() != series.len() {
      return Err(PortfolioError::DimensionMismatch(format!(
        "{} weights for {} series",
        request.weights.len(),
        series.len()
      )));
    }
    for (ticker, s) in request.tickers.iter().zip(series.iter()) {
      if *ticker != s.ticker {
        return Err(PortfolioError::InvalidInput(format!(
          "requested ticker {ticker} does not match series {}",
          s.ticker
        )));
      }
    }
    let weight_sum: f64 = request.weights.iter().sum();
    if (weight_sum - 1.0).abs() > 1e-6 {
      return Err(PortfolioError::InvalidInput(format!(
        "weights sum to {weight_sum}, expected 1"
      )));
    }

    let sliced: Vec<ReturnSeries> = series
      .iter()
      .map(|s| s.slice_dates(request.start, request.end))
      .collect();

    tracing::debug!(
      assets = sliced.len(),
      observations = sliced.first().map(|s| s.len()).unwrap_or(0),
      "running portfolio analysis"
    );

    let estimates = estimate_moments(&sliced)?;
    let blended = portfolio_returns(&sliced, &request.weights)?;
    let metrics = portfolio_metrics(&blended, request.risk_free_rate)?;
    let backtest = run_var_backtest(
      &blended,
      &VarBacktestConfig {
        window: self.config.var_window,
        confidence: self.config.confidence,
      },
    )?;

    Ok(AnalysisReport {
      estimates,
      portfolio_returns: blended,
      metrics,
      backtest,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::Days;

  use super::*;

  fn dates(n: usize) -> Vec<NaiveDate> {
    (0..n)
      .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(i as u64))
      .collect()
  }

  fn universe(n: usize) -> Vec<ReturnSeries> {
    let a: Vec<f64> = (0..n).map(|i| ((i % 5) as f64 - 2.0) / 250.0).collect();
    let b: Vec<f64> = (0..n).map(|i| ((i % 7) as f64 - 3.0) / 350.0).collect();
    vec![
      ReturnSeries::new("AAA", dates(n), a).unwrap(),
      ReturnSeries::new("BBB", dates(n), b).unwrap(),
    ]
  }

  fn request(n: usize) -> AnalysisRequest {
    AnalysisRequest {
      tickers: vec!["AAA".to_string(), "BBB".to_string()],
      start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
      end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(n as u64),
      weights: vec![0.6, 0.4],
      risk_free_rate: 0.02,
    }
  }

  #[test]
  fn analyze_runs_end_to_end() {
    let series = universe(120);
    let engine = AnalysisEngine::new(AnalysisConfig::default());

    let report = engine.analyze(&series, &request(120)).unwrap();

    assert_eq!(report.estimates.mean.len(), 2);
    assert_eq!(report.portfolio_returns.len(), 120);
    assert_eq!(report.backtest.delta_normal_var.len(), 120 - 49);
    assert!(report.metrics.std_dev > 0.0);
  }

  #[test]
  fn analyze_rejects_unknown_ticker_order() {
    let series = universe(120);
    let engine = AnalysisEngine::default();

    let mut req = request(120);
    req.tickers.swap(0, 1);

    assert!(matches!(
      engine.analyze(&series, &req),
      Err(PortfolioError::InvalidInput(_))
    ));
  }

  #[test]
  fn analyze_rejects_unnormalized_weights() {
    let series = universe(120);
    let engine = AnalysisEngine::default();

    let mut req = request(120);
    req.weights = vec![0.6, 0.6];

    assert!(matches!(
      engine.analyze(&series, &req),
      Err(PortfolioError::InvalidInput(_))
    ));
  }

  #[test]
  fn analyze_rejects_weight_count_mismatch() {
    let series = universe(120);
    let engine = AnalysisEngine::default();

    let mut req = request(120);
    req.weights = vec![1.0];

    assert!(matches!(
      engine.analyze(&series, &req),
      Err(PortfolioError::DimensionMismatch(_))
    ));
  }
}
