pub mod aggregator;
pub mod health;
pub mod tracker;

pub use aggregator::{summarize, PortfolioAggregator, DEFAULT_DUST_THRESHOLD};
pub use health::{assess, HealthReport, HealthStatus, Recommendation, RecommendationKind};
pub use tracker::PortfolioTracker;
