//! # Errors
//!
//! $$
//! \text{Err} \in \{\text{input}, \text{dimension}, \text{data}, \text{divergence}\}
//! $$
//!
//! Error taxonomy shared by estimation, optimization and backtesting.

use thiserror::Error;

/// Errors surfaced by the estimation, optimization and backtesting APIs.
///
/// All variants are raised synchronously; the crate never retries and never
/// substitutes a fallback weight vector for a failed optimization.
#[derive(Debug, Error)]
pub enum PortfolioError {
  /// Empty asset universe, non-finite values or otherwise malformed input.
  #[error("invalid input: {0}")]
  InvalidInput(String),
  /// Mean vector, covariance matrix and weights disagree on dimensions.
  #[error("dimension mismatch: {0}")]
  DimensionMismatch(String),
  /// Too few observations for covariance estimation or a rolling window.
  #[error("insufficient data: {0}")]
  InsufficientData(String),
  /// Solver failed to satisfy the constraints within its iteration budget.
  #[error("optimization diverged: {0}")]
  OptimizationDiverged(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PortfolioError>;
