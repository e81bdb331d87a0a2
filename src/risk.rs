//! # Risk
//!
//! $$
//! \mathrm{VaR}_{1-c}(t) = F^{-1}_{t-W+1..t}(1-c)
//! $$
//!
//! Rolling Value-at-Risk estimation and statistical backtesting of VaR
//! model coverage.

pub mod backtest;
pub mod var;

pub use backtest::BacktestResult;
pub use backtest::VarBacktestConfig;
pub use backtest::VarBacktestReport;
pub use backtest::kupiec_p_value;
pub use backtest::run_var_backtest;
pub use var::DEFAULT_CONFIDENCE;
pub use var::DEFAULT_VAR_WINDOW;
pub use var::EWMA_LAMBDA;
pub use var::delta_normal_var;
pub use var::ewma_mean;
pub use var::ewma_volatility;
pub use var::historical_var;
pub use var::rolling_delta_normal_var;
pub use var::rolling_historical_var;
pub use var::rolling_mean;
pub use var::standardized_returns;
