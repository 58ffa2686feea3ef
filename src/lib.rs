pub mod backtest;
pub mod calendar;
pub mod config;
pub mod data;
pub mod metrics;
pub mod notify;
pub mod paper;
pub mod position;
pub mod pricing;
pub mod risk;
pub mod strategy;

// Re-export commonly used types
pub use backtest::{BacktestConfig, BacktestEngine, BacktestReport, CycleSimulator, EquityPoint, StrangleTrade};
pub use calendar::ExpiryCalendar;
pub use config::{AppConfig, ConfigError};
pub use data::{HistoricalFeed, HistoryLoader, MarketData, OptionType, PriceHistory, UnderlyingSpec};
pub use metrics::{MetricsCalculator, PerformanceReport, TradeSummary};
pub use notify::{Notifier, TradeEvent};
pub use paper::{PaperConfig, PaperTrader};
pub use position::{ExitReason, PositionManager, Trade, TradeLedger, TradeStatus};
pub use pricing::{BlackScholes, GreeksResult, PremiumEstimator, PricingConfig};
pub use risk::{AdmissionDecision, AdmissionGate, ExitRules, RiskConfig};
pub use strategy::{Strategy, StrategyKind};
