//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Return/covariance estimation, constrained weight optimization and
//! risk/return metrics for long-only portfolios.

pub mod data;
pub mod engine;
pub mod estimator;
pub mod metrics;
pub mod optimizer;
pub mod types;

pub use data::ReturnSeries;
pub use data::annualize_cov;
pub use data::annualize_mean;
pub use data::portfolio_returns;
pub use data::simple_returns_series;
pub use engine::AnalysisConfig;
pub use engine::AnalysisEngine;
pub use engine::AnalysisReport;
pub use engine::AnalysisRequest;
pub use estimator::ReturnEstimates;
pub use estimator::estimate_moments;
pub use metrics::PortfolioMetrics;
pub use metrics::portfolio_metrics;
pub use optimizer::maximize_return;
pub use optimizer::maximize_sharpe;
pub use optimizer::minimize_volatility;
pub use types::ConvergenceHistory;
pub use types::OptimizationResult;
pub use types::RiskBudgetAllocation;
pub use types::TRADING_DAYS;
