//! Feature-engineering pipeline — joins the raw entity tables into the
//! denormalized, persona-tagged, sentiment-scored order-line table every
//! recommendation agent reads.

pub mod builder;
pub mod sentiment;

pub use builder::FeaturePipeline;
pub use sentiment::{LexiconScorer, NeutralScorer, SentimentScorer};
