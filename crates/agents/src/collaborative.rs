//! Collaborative filtering agent. This is persona-cohort filtering: a
//! user is "similar" when at least one persona label overlaps. It is a
//! heuristic stand-in for rating-matrix collaborative filtering and is
//! kept that way on purpose.

use commerce_core::personas::GENERAL_CONSUMER;
use commerce_core::types::{FeatureTable, OrderLine, RecommendationItem};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_K: usize = 10;

pub struct CollaborativeAgent {
    table: Arc<FeatureTable>,
    /// First persona string per customer; personas are constant per
    /// customer so first is safe.
    persona_by_user: HashMap<String, String>,
}

impl CollaborativeAgent {
    pub fn new(table: Arc<FeatureTable>) -> Self {
        let mut persona_by_user: HashMap<String, String> = HashMap::new();
        for row in table.rows() {
            if let Some(user) = &row.customer_unique_id {
                persona_by_user
                    .entry(user.clone())
                    .or_insert_with(|| row.persona_column.clone());
            }
        }
        Self {
            table,
            persona_by_user,
        }
    }

    fn persona_labels(persona: &str) -> HashSet<&str> {
        persona.split(", ").filter(|label| !label.is_empty()).collect()
    }

    /// Top-k products bought by users sharing at least one persona label
    /// with the requester, ranked by mean product sentiment. Unknown
    /// requesters fall into the General Consumer cohort.
    pub fn recommend(&self, user_id: &str, k: usize) -> Vec<RecommendationItem> {
        metrics::counter!("agents.collaborative.requests").increment(1);

        let persona = self
            .persona_by_user
            .get(user_id)
            .map(String::as_str)
            .unwrap_or(GENERAL_CONSUMER);
        let requester_labels = Self::persona_labels(persona);

        let similar_users: HashSet<&str> = self
            .persona_by_user
            .iter()
            .filter(|(uid, other)| {
                uid.as_str() != user_id
                    && Self::persona_labels(other)
                        .intersection(&requester_labels)
                        .next()
                        .is_some()
            })
            .map(|(uid, _)| uid.as_str())
            .collect();

        struct ProductAggregate<'a> {
            sentiment_sum: f64,
            sentiment_count: usize,
            price_sum: f64,
            price_count: usize,
            first_row: &'a OrderLine,
        }

        let mut aggregates: HashMap<&str, ProductAggregate> = HashMap::new();
        for row in self.table.rows() {
            let Some(user) = row.customer_unique_id.as_deref() else {
                continue;
            };
            if !similar_users.contains(user) {
                continue;
            }
            let aggregate = aggregates
                .entry(row.product_id.as_str())
                .or_insert(ProductAggregate {
                    sentiment_sum: 0.0,
                    sentiment_count: 0,
                    price_sum: 0.0,
                    price_count: 0,
                    first_row: row,
                });
            aggregate.sentiment_sum += row.avg_sentiment_score;
            aggregate.sentiment_count += 1;
            if let Some(price) = row.target_price {
                aggregate.price_sum += price;
                aggregate.price_count += 1;
            }
        }

        let mut ranked: Vec<(RecommendationItem, f64)> = aggregates
            .into_iter()
            .map(|(_, aggregate)| {
                let mean_sentiment = aggregate.sentiment_sum / aggregate.sentiment_count as f64;
                let mean_price = (aggregate.price_count > 0)
                    .then(|| aggregate.price_sum / aggregate.price_count as f64);
                let first = aggregate.first_row;
                let item = RecommendationItem {
                    product_id: first.product_id.clone(),
                    name: first.title.clone(),
                    description: first.short_description.clone(),
                    image_url: first.image_url.clone(),
                    link: first.item_web_url.clone(),
                    category: first.product_category_name_english.clone(),
                    avg_sentiment_score: Some(mean_sentiment),
                    avg_price: mean_price,
                    summary: first.summary.clone(),
                };
                (item, mean_sentiment)
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.product_id.cmp(&b.0.product_id))
        });
        ranked.truncate(k);

        let items: Vec<RecommendationItem> = ranked.into_iter().map(|(item, _)| item).collect();
        info!(
            user_id,
            persona,
            cohort_size = similar_users.len(),
            candidates = items.len(),
            "Collaborative recommendations ready"
        );
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{line, table};

    #[test]
    fn test_shared_persona_cohort_surfaces_unbought_product() {
        let mut a = line("o1", "px", "customer-a", "consoles_games", 0.6);
        a.persona_column = "Gamer, Tech Enthusiast".to_string();
        let mut b = line("o2", "py", "customer-b", "toys", 0.1);
        b.persona_column = "Gamer".to_string();
        let agent = CollaborativeAgent::new(table(vec![a, b]));

        // B never bought px, but shares the Gamer persona with A.
        let items = agent.recommend("customer-b", DEFAULT_K);
        assert!(items.iter().any(|item| item.product_id == "px"));
        // A's own purchase list is the cohort's; B's row is excluded.
        assert!(items.iter().all(|item| item.product_id != "py"));
    }

    #[test]
    fn test_disjoint_personas_share_nothing() {
        let mut a = line("o1", "px", "customer-a", "pet_shop", 0.6);
        a.persona_column = "Pet Owner".to_string();
        let mut b = line("o2", "py", "customer-b", "auto", 0.1);
        b.persona_column = "Car Enthusiast".to_string();
        let agent = CollaborativeAgent::new(table(vec![a, b]));
        assert!(agent.recommend("customer-b", DEFAULT_K).is_empty());
    }

    #[test]
    fn test_unknown_user_falls_back_to_general_consumer() {
        let mut a = line("o1", "px", "customer-a", "bed_bath_table", 0.4);
        a.persona_column = GENERAL_CONSUMER.to_string();
        let agent = CollaborativeAgent::new(table(vec![a]));
        let items = agent.recommend("stranger", DEFAULT_K);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "px");
    }

    #[test]
    fn test_ranking_and_mean_price() {
        let mut a = line("o1", "p-low", "customer-a", "toys", 0.1);
        a.persona_column = "Parent".to_string();
        a.target_price = Some(10.0);
        let mut b = line("o2", "p-high", "customer-a", "toys", 0.9);
        b.persona_column = "Parent".to_string();
        b.target_price = Some(30.0);
        let mut c = line("o3", "p-high", "customer-a", "toys", 0.9);
        c.persona_column = "Parent".to_string();
        c.target_price = Some(50.0);
        let mut requester = line("o4", "pz", "customer-b", "toys", 0.0);
        requester.persona_column = "Parent".to_string();

        let agent = CollaborativeAgent::new(table(vec![a, b, c, requester]));
        let items = agent.recommend("customer-b", DEFAULT_K);
        assert_eq!(items[0].product_id, "p-high");
        assert_eq!(items[0].avg_price, Some(40.0));
        assert_eq!(items[1].product_id, "p-low");
    }
}
