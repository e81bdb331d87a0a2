//! # Portfolio Types
//!
//! $$
//! \Delta^{N-1} = \{\mathbf{w} \in \mathbb{R}^N : w_i \ge 0,\ \textstyle\sum_i w_i = 1\}
//! $$
//!
//! Shared constants and result containers for portfolio optimization.

/// Trading days per year used for annualization.
pub const TRADING_DAYS: f64 = 252.0;

/// Per-iteration objective values recorded during a single solve.
///
/// Finite, forward-only and consumed once: each optimization run produces
/// one history, and iterating it drains it.
#[derive(Debug)]
pub struct ConvergenceHistory {
  iter: std::vec::IntoIter<f64>,
}

impl ConvergenceHistory {
  pub(crate) fn new(values: Vec<f64>) -> Self {
    Self {
      iter: values.into_iter(),
    }
  }

  /// Number of iterations not yet consumed.
  pub fn len(&self) -> usize {
    self.iter.len()
  }

  /// Whether the history has been fully consumed (or the solve recorded
  /// no iterations).
  pub fn is_empty(&self) -> bool {
    self.iter.len() == 0
  }
}

impl Iterator for ConvergenceHistory {
  type Item = f64;

  fn next(&mut self) -> Option<f64> {
    self.iter.next()
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    self.iter.size_hint()
  }
}

impl ExactSizeIterator for ConvergenceHistory {}

/// Output of a weight optimization run.
#[derive(Debug)]
pub struct OptimizationResult {
  /// Final portfolio weights on the simplex.
  pub weights: Vec<f64>,
  /// Objective value at the final weights.
  pub objective_value: f64,
  /// Objective value per solver iteration, in call order.
  pub history: ConvergenceHistory,
}

/// Output of the return-maximization-under-risk-budget operation.
#[derive(Clone, Debug)]
pub struct RiskBudgetAllocation {
  /// Final portfolio weights on the simplex.
  pub weights: Vec<f64>,
  /// Annualized expected portfolio return at those weights.
  pub annualized_return: f64,
}
