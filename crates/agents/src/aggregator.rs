//! Merges the four agents' outputs into one bundle and, when a generator
//! is wired in, narrates them. Narration is presentation-only: its
//! failure never fails the recommendation request.

use crate::basket::MarketBasketAgent;
use crate::collaborative::CollaborativeAgent;
use crate::content::ContentAgent;
use crate::context::{ContextAgent, ContextRecommendation};
use commerce_core::types::RecommendationItem;
use commerce_llm::TextGenerator;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationBundle {
    pub context: ContextRecommendation,
    pub content: Vec<RecommendationItem>,
    pub collaborative: Vec<RecommendationItem>,
    pub market_basket: Vec<String>,
    pub narration: Option<String>,
}

pub struct Aggregator {
    content: Arc<ContentAgent>,
    collaborative: Arc<CollaborativeAgent>,
    basket: Arc<MarketBasketAgent>,
    context: Arc<ContextAgent>,
    narrator: Option<Arc<dyn TextGenerator>>,
}

impl Aggregator {
    pub fn new(
        content: Arc<ContentAgent>,
        collaborative: Arc<CollaborativeAgent>,
        basket: Arc<MarketBasketAgent>,
        context: Arc<ContextAgent>,
        narrator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        Self {
            content,
            collaborative,
            basket,
            context,
            narrator,
        }
    }

    pub async fn recommend(&self, user_id: &str, k: usize) -> RecommendationBundle {
        let context = self.context.recommend(user_id, k).await;
        let content = self.content.recommend(user_id, k);
        let collaborative = self.collaborative.recommend(user_id, k);
        let history = self.content.order_history(user_id);
        let market_basket = self.basket.recommend(&history);

        let narration = self
            .narrate(user_id, &context, &content, &collaborative, &market_basket)
            .await;

        RecommendationBundle {
            context,
            content,
            collaborative,
            market_basket,
            narration,
        }
    }

    async fn narrate(
        &self,
        user_id: &str,
        context: &ContextRecommendation,
        content: &[RecommendationItem],
        collaborative: &[RecommendationItem],
        market_basket: &[String],
    ) -> Option<String> {
        let narrator = self.narrator.as_ref()?;

        let (location, location_items) = match context {
            ContextRecommendation::Found(insights) => {
                (insights.location.as_str(), insights.items.as_slice())
            }
            ContextRecommendation::UserNotFound => ("unknown", [].as_slice()),
        };

        let prompt = format!(
            "I have run various algorithms to get recommendations for this user:\n\n\
             1. **Based off their Location {location}, the most popular items are:**\n{}\n\
             2. **Based off their order History-Based Recommendations:**\n{}\n\
             3. **Based on similar users order history : Collaborative-Based Recommendations:**\n{}\n\
             4. **Based on Market Basket-Based Recommendations:**\n{}\n\
             Please present this information in a user-friendly format in about 200 words, \
             as if talking to the user.",
            format_items(location_items),
            format_items(content),
            format_items(collaborative),
            market_basket.join(", "),
        );

        match narrator
            .generate(
                "Generate a user-friendly recommendation page based on the provided product details.",
                &prompt,
            )
            .await
        {
            Ok(text) => {
                info!(user_id, chars = text.len(), "Narration generated");
                Some(text)
            }
            Err(e) => {
                warn!(user_id, error = %e, "Narration failed, returning results without it");
                None
            }
        }
    }
}

fn format_items(items: &[RecommendationItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "- **{}**: {}\n",
                item.name.as_deref().unwrap_or(&item.product_id),
                item.description.as_deref().unwrap_or("No Description Provided"),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basket::MarketBasketAgent;
    use crate::context::StaticTrendSignals;
    use crate::test_support::{line, table};
    use commerce_core::config::{BasketConfig, ContextConfig};
    use commerce_llm::StaticGenerator;

    async fn bundle_for(narrator: Option<Arc<dyn TextGenerator>>) -> RecommendationBundle {
        let rows = vec![
            line("o1", "p1", "u1", "toys", 0.4),
            line("o2", "p2", "u2", "toys", 0.8),
        ];
        let table = table(rows);
        let aggregator = Aggregator::new(
            Arc::new(ContentAgent::new(Arc::clone(&table))),
            Arc::new(CollaborativeAgent::new(Arc::clone(&table))),
            Arc::new(MarketBasketAgent::new(&table, BasketConfig::default())),
            Arc::new(ContextAgent::new(
                Arc::clone(&table),
                ContextConfig::default(),
                Box::new(StaticTrendSignals),
                None,
            )),
            narrator,
        );
        aggregator.recommend("u1", 10).await
    }

    #[tokio::test]
    async fn test_bundle_merges_all_agents() {
        let bundle = bundle_for(None).await;
        assert!(matches!(bundle.context, ContextRecommendation::Found(_)));
        assert!(!bundle.content.is_empty());
        assert!(bundle.narration.is_none());
    }

    #[tokio::test]
    async fn test_narration_attached_when_generator_present() {
        let narrator: Arc<dyn TextGenerator> =
            Arc::new(StaticGenerator::new("Hey, we noticed you like toys!"));
        let bundle = bundle_for(Some(narrator)).await;
        assert_eq!(
            bundle.narration.as_deref(),
            Some("Hey, we noticed you like toys!")
        );
    }
}
