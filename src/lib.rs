//! # quantfolio-rs
//!
//! $$
//! \mathbf{w}^\* = \arg\min_{\mathbf{w} \in \Delta^{N-1}} \sqrt{\mathbf{w}^\top \Sigma \mathbf{w}}
//! $$
//!
//! Constrained portfolio optimization over the long-only weight simplex and
//! rolling Value-at-Risk backtesting with a binomial coverage test.
//!
//! The crate is split into two subsystems that share inputs but never call
//! each other:
//!
//! - [`portfolio`] is return/covariance estimation, the three weight
//!   optimizers (minimum volatility, maximum return under a risk budget,
//!   maximum Sharpe ratio) and risk/return metrics.
//! - [`risk`] is rolling Delta-Normal and Historical VaR, EWMA volatility
//!   diagnostics, violation counting and the Kupiec coverage test.
//!
//! All computations are pure functions over immutable inputs; callers own
//! the data and decide fallback policy on errors.

pub mod error;
pub mod portfolio;
pub mod risk;

pub use error::PortfolioError;
pub use error::Result;
