//! # Portfolio Optimizer
//!
//! $$
//! \min_{\mathbf{w} \in \Delta^{N-1}} f(\mathbf{w}), \qquad
//! f \in \left\{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}},\ -\mathbf{w}^\top\mu,\
//! -\frac{\mathbf{w}^\top\mu - r_f}{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}}\right\}
//! $$
//!
//! Three constrained programs over the long-only weight simplex: minimum
//! volatility, maximum return under a volatility budget, and maximum Sharpe
//! ratio. The simplex constraints (`sum w = 1`, `0 <= w <= 1`) are enforced
//! exactly by optimizing an unconstrained vector mapped through softmax; the
//! risk-budget inequality enters as a hinge penalty and is re-checked on the
//! final weights.

use std::sync::Arc;
use std::sync::Mutex;

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::KV;
use argmin::core::State;
use argmin::core::TerminationReason;
use argmin::core::TerminationStatus;
use argmin::core::observers::Observe;
use argmin::core::observers::ObserverMode;
use argmin::solver::neldermead::NelderMead;

use crate::error::PortfolioError;
use crate::error::Result;

use super::data::annualize_cov;
use super::data::annualize_mean;
use super::types::ConvergenceHistory;
use super::types::OptimizationResult;
use super::types::RiskBudgetAllocation;

const MAX_ITERS: u64 = 5000;
const SD_TOLERANCE: f64 = 1e-9;
const SUM_TOLERANCE: f64 = 1e-6;
const RISK_PENALTY: f64 = 1e8;
const DEGENERATE_COST: f64 = 1e10;

fn dot(a: &[f64], b: &[f64]) -> f64 {
  a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn mat_vec_mul(mat: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
  mat
    .iter()
    .map(|row| row.iter().zip(v.iter()).map(|(a, b)| a * b).sum())
    .collect()
}

fn softmax(x: &[f64]) -> Vec<f64> {
  if x.is_empty() {
    return Vec::new();
  }

  let max_x = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let exps: Vec<f64> = x.iter().map(|&v| (v - max_x).exp()).collect();
  let sum: f64 = exps.iter().sum();

  if sum < 1e-15 {
    vec![1.0 / x.len() as f64; x.len()]
  } else {
    exps.iter().map(|&e| e / sum).collect()
  }
}

fn check_finite_mean(mu: &[f64]) -> Result<()> {
  if let Some(bad) = mu.iter().find(|m| !m.is_finite()) {
    return Err(PortfolioError::InvalidInput(format!(
      "non-finite mean return {bad}"
    )));
  }
  Ok(())
}

fn check_cov(cov: &[Vec<f64>], n: usize) -> Result<()> {
  if cov.len() != n {
    return Err(PortfolioError::DimensionMismatch(format!(
      "covariance has {} rows for {n} assets",
      cov.len()
    )));
  }
  for (i, row) in cov.iter().enumerate() {
    if row.len() != n {
      return Err(PortfolioError::DimensionMismatch(format!(
        "covariance row {i} has {} columns for {n} assets",
        row.len()
      )));
    }
    if let Some(bad) = row.iter().find(|c| !c.is_finite()) {
      return Err(PortfolioError::InvalidInput(format!(
        "non-finite covariance entry {bad}"
      )));
    }
  }
  Ok(())
}

fn check_guess(guess: &[f64], n: usize) -> Result<()> {
  if guess.len() != n {
    return Err(PortfolioError::DimensionMismatch(format!(
      "initial guess has {} weights for {n} assets",
      guess.len()
    )));
  }
  if guess.iter().any(|w| !w.is_finite() || *w < 0.0 || *w > 1.0) {
    return Err(PortfolioError::InvalidInput(
      "initial guess weights must lie in [0, 1]".to_string(),
    ));
  }
  let sum: f64 = guess.iter().sum();
  if (sum - 1.0).abs() > SUM_TOLERANCE {
    return Err(PortfolioError::InvalidInput(format!(
      "initial guess weights sum to {sum}, expected 1"
    )));
  }
  Ok(())
}

struct SimplexCost<F> {
  objective: F,
}

impl<F> CostFunction for SimplexCost<F>
where
  F: Fn(&[f64]) -> f64,
{
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
    Ok((self.objective)(&softmax(x)))
  }
}

/// Records the best objective value once per solver iteration.
struct CostTrace {
  trace: Arc<Mutex<Vec<f64>>>,
}

impl<I> Observe<I> for CostTrace
where
  I: State<Float = f64>,
{
  fn observe_iter(&mut self, state: &I, _kv: &KV) -> std::result::Result<(), argmin::core::Error> {
    if let Ok(mut trace) = self.trace.lock() {
      trace.push(state.get_cost());
    }
    Ok(())
  }
}

/// Minimize `objective` over the weight simplex.
///
/// Returns the final weights, the objective value at those weights and the
/// per-iteration history. Non-convergence within the iteration budget is an
/// [`PortfolioError::OptimizationDiverged`] error, never a fallback.
fn solve_on_simplex<F>(n: usize, initial_guess: Option<&[f64]>, objective: F) -> Result<(Vec<f64>, f64, Vec<f64>)>
where
  F: Fn(&[f64]) -> f64 + 'static,
{
  if n == 0 {
    return Err(PortfolioError::InvalidInput(
      "empty asset universe".to_string(),
    ));
  }
  if let Some(guess) = initial_guess {
    check_guess(guess, n)?;
  }

  // One asset admits only one point on the simplex.
  if n == 1 {
    let value = objective(&[1.0]);
    return Ok((vec![1.0], value, vec![value]));
  }

  // Softmax of the zero vector is the equal-weight portfolio; a supplied
  // guess is mapped into solver space through its log.
  let x0: Vec<f64> = match initial_guess {
    Some(guess) => guess.iter().map(|w| w.max(1e-12).ln()).collect(),
    None => vec![0.0; n],
  };

  let mut simplex = Vec::with_capacity(n + 1);
  simplex.push(x0.clone());
  for i in 0..n {
    let mut point = x0.clone();
    point[i] += 1.0;
    simplex.push(point);
  }

  tracing::debug!(n, max_iters = MAX_ITERS, "starting simplex solve");

  let solver = NelderMead::new(simplex)
    .with_sd_tolerance(SD_TOLERANCE)
    .map_err(|e| PortfolioError::InvalidInput(e.to_string()))?;

  let trace = Arc::new(Mutex::new(Vec::new()));
  let observer = CostTrace {
    trace: Arc::clone(&trace),
  };

  let res = Executor::new(SimplexCost { objective }, solver)
    .configure(|state| state.max_iters(MAX_ITERS))
    .add_observer(observer, ObserverMode::Always)
    .run()
    .map_err(|e| PortfolioError::OptimizationDiverged(e.to_string()))?;

  if !matches!(
    res.state.termination_status,
    TerminationStatus::Terminated(TerminationReason::SolverConverged)
  ) {
    return Err(PortfolioError::OptimizationDiverged(format!(
      "solver stopped without converging: {:?}",
      res.state.termination_status
    )));
  }

  let best_x = res.state.best_param.ok_or_else(|| {
    PortfolioError::OptimizationDiverged("solver produced no best parameter".to_string())
  })?;
  let weights = softmax(&best_x);
  let best_cost = res.state.best_cost;

  let history = match Arc::try_unwrap(trace) {
    Ok(mutex) => mutex.into_inner().unwrap_or_default(),
    Err(_) => Vec::new(),
  };

  tracing::debug!(
    iterations = history.len(),
    best_cost,
    "simplex solve finished"
  );

  Ok((weights, best_cost, history))
}

/// Minimize portfolio volatility `sqrt(w' Σ w)` on daily inputs.
///
/// Default initial guess is the equal-weight portfolio.
pub fn minimize_volatility(
  cov: &[Vec<f64>],
  initial_guess: Option<&[f64]>,
) -> Result<OptimizationResult> {
  let n = cov.len();
  if n == 0 {
    return Err(PortfolioError::InvalidInput(
      "empty asset universe".to_string(),
    ));
  }
  check_cov(cov, n)?;

  let cov_owned = cov.to_vec();
  let (weights, objective_value, history) = solve_on_simplex(n, initial_guess, move |w| {
    dot(w, &mat_vec_mul(&cov_owned, w)).max(0.0).sqrt()
  })?;

  Ok(OptimizationResult {
    weights,
    objective_value,
    history: ConvergenceHistory::new(history),
  })
}

/// Maximize annualized expected return subject to an annualized volatility
/// budget.
///
/// Daily `mu` and `cov` are annualized by the trading-days factor before
/// optimizing. Fails with [`PortfolioError::OptimizationDiverged`] when the
/// solver does not converge or the final weights exceed the budget; an
/// infeasible allocation is never returned.
pub fn maximize_return(
  mu: &[f64],
  cov: &[Vec<f64>],
  target_volatility: f64,
  initial_guess: Option<&[f64]>,
) -> Result<RiskBudgetAllocation> {
  let n = mu.len();
  if n == 0 {
    return Err(PortfolioError::InvalidInput(
      "empty asset universe".to_string(),
    ));
  }
  check_finite_mean(mu)?;
  check_cov(cov, n)?;
  if !target_volatility.is_finite() || target_volatility <= 0.0 {
    return Err(PortfolioError::InvalidInput(format!(
      "target volatility must be positive, got {target_volatility}"
    )));
  }

  let mu_a = annualize_mean(mu);
  let cov_a = annualize_cov(cov);
  let budget = target_volatility * target_volatility;

  let mu_solver = mu_a.clone();
  let cov_solver = cov_a.clone();
  let (weights, _, _) = solve_on_simplex(n, initial_guess, move |w| {
    let port_var = dot(w, &mat_vec_mul(&cov_solver, w));
    let excess = (port_var - budget).max(0.0);
    -dot(w, &mu_solver) + RISK_PENALTY * excess * excess
  })?;

  let port_var = dot(&weights, &mat_vec_mul(&cov_a, &weights));
  if port_var > budget + SUM_TOLERANCE * budget + 1e-9 {
    return Err(PortfolioError::OptimizationDiverged(format!(
      "portfolio variance {port_var} exceeds risk budget {budget}"
    )));
  }

  Ok(RiskBudgetAllocation {
    annualized_return: dot(&weights, &mu_a),
    weights,
  })
}

/// Maximize the annualized Sharpe ratio `(w'μ - r_f) / sqrt(w' Σ w)`.
///
/// Daily `mu` and `cov` are annualized before optimizing. Zero-volatility
/// candidates receive a large sentinel cost so the solver is repelled from
/// degenerate portfolios instead of dividing by zero. The reported
/// `objective_value` is the minimized objective, i.e. the negated Sharpe
/// ratio.
pub fn maximize_sharpe(
  mu: &[f64],
  cov: &[Vec<f64>],
  risk_free_rate: f64,
  initial_guess: Option<&[f64]>,
) -> Result<OptimizationResult> {
  let n = mu.len();
  if n == 0 {
    return Err(PortfolioError::InvalidInput(
      "empty asset universe".to_string(),
    ));
  }
  check_finite_mean(mu)?;
  check_cov(cov, n)?;

  let mu_a = annualize_mean(mu);
  let cov_a = annualize_cov(cov);

  let (weights, objective_value, history) = solve_on_simplex(n, initial_guess, move |w| {
    let port_var = dot(w, &mat_vec_mul(&cov_a, w));
    if port_var < 1e-30 {
      return DEGENERATE_COST;
    }
    -(dot(w, &mu_a) - risk_free_rate) / port_var.sqrt()
  })?;

  Ok(OptimizationResult {
    weights,
    objective_value,
    history: ConvergenceHistory::new(history),
  })
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;

  fn assert_on_simplex(weights: &[f64]) {
    let sum: f64 = weights.iter().sum();
    assert!((sum - 1.0).abs() < 1e-6, "weights sum to {sum}");
    for w in weights {
      assert!((-1e-9..=1.0 + 1e-9).contains(w), "weight {w} out of bounds");
    }
  }

  fn three_asset_inputs() -> (Vec<f64>, Vec<Vec<f64>>) {
    let mu = vec![0.0004, 0.0005, 0.0006];
    let cov = vec![
      vec![1.6e-4, 4.0e-5, 0.0],
      vec![4.0e-5, 3.6e-4, 8.0e-5],
      vec![0.0, 8.0e-5, 6.4e-4],
    ];
    (mu, cov)
  }

  #[test]
  fn single_asset_gets_full_weight_and_own_volatility() {
    let result = minimize_volatility(&[vec![0.04]], None).unwrap();

    assert_eq!(result.weights, vec![1.0]);
    assert_relative_eq!(result.objective_value, 0.2, max_relative = 1e-12);
    assert!(result.history.len() >= 1);
  }

  #[test]
  fn min_vol_favors_lower_variance_asset() {
    // Two assets with daily returns A = [0.01, -0.02, 0.015, 0.0] and
    // B = [0.00, 0.01, -0.005, 0.02]; sample moments computed by hand.
    let cov = vec![
      vec![2.3958333333333332e-4, -1.0208333333333334e-4],
      vec![-1.0208333333333334e-4, 1.2291666666666666e-4],
    ];

    let result = minimize_volatility(&cov, None).unwrap();
    assert_on_simplex(&result.weights);
    assert!(
      result.weights[1] > result.weights[0],
      "expected the lower-variance asset to dominate: {:?}",
      result.weights
    );
  }

  #[test]
  fn all_operations_return_simplex_weights() {
    let (mu, cov) = three_asset_inputs();

    let min_vol = minimize_volatility(&cov, None).unwrap();
    assert_on_simplex(&min_vol.weights);

    let budgeted = maximize_return(&mu, &cov, 0.5, None).unwrap();
    assert_on_simplex(&budgeted.weights);

    let sharpe = maximize_sharpe(&mu, &cov, 0.01, None).unwrap();
    assert_on_simplex(&sharpe.weights);
  }

  #[test]
  fn max_return_dominates_equal_weight_when_budget_is_loose() {
    let mu = vec![0.001, 0.0002];
    let cov = vec![vec![1.0e-4, 0.0], vec![0.0, 1.0e-4]];

    // Each asset has annualized volatility ~0.159, so a 0.2 budget never
    // binds and the solver can chase return freely.
    let result = maximize_return(&mu, &cov, 0.2, None).unwrap();
    assert_on_simplex(&result.weights);

    let equal_weight_return = 0.5 * 0.001 * 252.0 + 0.5 * 0.0002 * 252.0;
    assert!(result.annualized_return >= equal_weight_return - 1e-6);

    let cov_a = annualize_cov(&cov);
    let port_var = dot(&result.weights, &mat_vec_mul(&cov_a, &result.weights));
    assert!(port_var <= 0.2 * 0.2 + 1e-6);
  }

  #[test]
  fn max_sharpe_dominates_equal_weight_when_unconstrained() {
    let mu = vec![0.001, 0.0002];
    let cov = vec![vec![1.0e-4, 0.0], vec![0.0, 4.0e-4]];

    let result = maximize_sharpe(&mu, &cov, 0.02, None).unwrap();
    assert_on_simplex(&result.weights);

    let annualized_return = result.weights[0] * 0.001 * 252.0 + result.weights[1] * 0.0002 * 252.0;
    let equal_weight_return = 0.5 * 0.001 * 252.0 + 0.5 * 0.0002 * 252.0;
    assert!(annualized_return >= equal_weight_return - 1e-6);
  }

  #[test]
  fn zero_variance_universe_hits_sentinel_not_a_panic() {
    let mu = vec![0.0005, 0.0005];
    let cov = vec![vec![0.0, 0.0], vec![0.0, 0.0]];

    let result = maximize_sharpe(&mu, &cov, 0.0, None).unwrap();
    assert_on_simplex(&result.weights);
    assert_relative_eq!(result.objective_value, 1e10, max_relative = 1e-12);
  }

  #[test]
  fn rejects_empty_universe() {
    assert!(matches!(
      minimize_volatility(&[], None),
      Err(PortfolioError::InvalidInput(_))
    ));
    assert!(matches!(
      maximize_return(&[], &[], 0.2, None),
      Err(PortfolioError::InvalidInput(_))
    ));
    assert!(matches!(
      maximize_sharpe(&[], &[], 0.0, None),
      Err(PortfolioError::InvalidInput(_))
    ));
  }

  #[test]
  fn rejects_dimension_disagreements() {
    let mu = vec![0.001, 0.002];
    let non_square = vec![vec![1.0e-4, 0.0]];
    assert!(matches!(
      maximize_sharpe(&mu, &non_square, 0.0, None),
      Err(PortfolioError::DimensionMismatch(_))
    ));

    let ragged = vec![vec![1.0e-4, 0.0], vec![0.0]];
    assert!(matches!(
      minimize_volatility(&ragged, None),
      Err(PortfolioError::DimensionMismatch(_))
    ));

    let cov = vec![vec![1.0e-4, 0.0], vec![0.0, 1.0e-4]];
    assert!(matches!(
      maximize_return(&mu, &cov, 0.2, Some(&[1.0])),
      Err(PortfolioError::DimensionMismatch(_))
    ));
  }

  #[test]
  fn rejects_invalid_initial_guess() {
    let cov = vec![vec![1.0e-4, 0.0], vec![0.0, 1.0e-4]];
    assert!(matches!(
      minimize_volatility(&cov, Some(&[0.9, 0.9])),
      Err(PortfolioError::InvalidInput(_))
    ));
  }

  #[test]
  fn rejects_non_positive_volatility_target() {
    let mu = vec![0.001, 0.0002];
    let cov = vec![vec![1.0e-4, 0.0], vec![0.0, 1.0e-4]];
    assert!(matches!(
      maximize_return(&mu, &cov, 0.0, None),
      Err(PortfolioError::InvalidInput(_))
    ));
  }

  #[test]
  fn accepts_explicit_initial_guess() {
    let cov = vec![vec![1.0e-4, 0.0], vec![0.0, 4.0e-4]];
    let result = minimize_volatility(&cov, Some(&[0.9, 0.1])).unwrap();
    assert_on_simplex(&result.weights);
    assert!(result.weights[0] > result.weights[1]);
  }

  #[test]
  fn identical_inputs_give_identical_results() {
    let (mu, cov) = three_asset_inputs();

    let a = maximize_sharpe(&mu, &cov, 0.01, None).unwrap();
    let b = maximize_sharpe(&mu, &cov, 0.01, None).unwrap();

    assert_eq!(a.weights, b.weights);
    assert_eq!(a.objective_value, b.objective_value);
  }

  #[test]
  fn objective_round_trips_through_metrics() {
    use chrono::NaiveDate;

    use crate::portfolio::data::ReturnSeries;
    use crate::portfolio::data::portfolio_returns;
    use crate::portfolio::estimator::estimate_moments;
    use crate::portfolio::metrics::portfolio_metrics;

    let dates: Vec<NaiveDate> = (0..4)
      .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i))
      .collect();
    let series = vec![
      ReturnSeries::new("AAA", dates.clone(), vec![0.01, -0.02, 0.015, 0.0]).unwrap(),
      ReturnSeries::new("BBB", dates, vec![0.00, 0.01, -0.005, 0.02]).unwrap(),
    ];
    let est = estimate_moments(&series).unwrap();

    // Feeding the optimizer's own weights back through the blended series
    // reproduces each objective value.
    let min_vol = minimize_volatility(&est.cov, None).unwrap();
    let blended = portfolio_returns(&series, &min_vol.weights).unwrap();
    let metrics = portfolio_metrics(&blended, 0.0).unwrap();
    assert_relative_eq!(min_vol.objective_value, metrics.std_dev, max_relative = 1e-9);

    let sharpe = maximize_sharpe(&est.mean, &est.cov, 0.0, None).unwrap();
    let blended = portfolio_returns(&series, &sharpe.weights).unwrap();
    let metrics = portfolio_metrics(&blended, 0.0).unwrap();
    assert_relative_eq!(
      -sharpe.objective_value,
      metrics.sharpe_ratio,
      max_relative = 1e-9
    );
  }

  #[test]
  fn history_tracks_best_cost_per_iteration() {
    let (_, cov) = three_asset_inputs();
    let result = minimize_volatility(&cov, None).unwrap();

    let history: Vec<f64> = result.history.collect();
    assert!(!history.is_empty());
    assert!(history.iter().all(|c| c.is_finite()));
    // Nelder-Mead best cost is monotone non-increasing.
    assert!(history.last().unwrap() <= history.first().unwrap());
  }
}
