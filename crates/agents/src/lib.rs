//! Recommendation agents over the shared feature table: content-based,
//! persona-cohort collaborative, market-basket association rules, and
//! the location/context-aware agent, plus the aggregation layer.

pub mod aggregator;
pub mod apriori;
pub mod basket;
pub mod collaborative;
pub mod content;
pub mod context;

pub use aggregator::{Aggregator, RecommendationBundle};
pub use apriori::AssociationRule;
pub use basket::MarketBasketAgent;
pub use collaborative::CollaborativeAgent;
pub use content::ContentAgent;
pub use context::{
    ContextAgent, ContextInsights, ContextRecommendation, StaticTrendSignals, TrendSignals,
};
