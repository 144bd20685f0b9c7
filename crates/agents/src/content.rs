//! Content-based (order-history) agent: recommends products from the
//! categories the user has already purchased, ranked by product sentiment.

use commerce_core::types::{FeatureTable, RecommendationItem};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_K: usize = 10;

pub struct ContentAgent {
    table: Arc<FeatureTable>,
}

impl ContentAgent {
    pub fn new(table: Arc<FeatureTable>) -> Self {
        Self { table }
    }

    /// The user's purchase history as product ids, table order,
    /// duplicates preserved.
    pub fn order_history(&self, user_id: &str) -> Vec<String> {
        self.table.user_product_ids(user_id)
    }

    /// Top-k products from the user's purchased categories, by descending
    /// product sentiment. No history means no recommendations — there is
    /// deliberately no fallback here.
    pub fn recommend(&self, user_id: &str, k: usize) -> Vec<RecommendationItem> {
        metrics::counter!("agents.content.requests").increment(1);

        let history = self.order_history(user_id);
        if history.is_empty() {
            info!(user_id, "No order history, returning empty recommendations");
            return Vec::new();
        }

        let history_products: HashSet<&str> = history.iter().map(String::as_str).collect();
        let mut user_categories: HashSet<&str> = HashSet::new();
        for product_id in &history_products {
            for row in self.table.product_rows(product_id) {
                if let Some(category) = row.product_category_name_english.as_deref() {
                    user_categories.insert(category);
                }
            }
        }

        // Mean sentiment per candidate product. The score is constant per
        // product already, so this collapses rows rather than reweighting.
        let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
        for row in self.table.rows() {
            let Some(category) = row.product_category_name_english.as_deref() else {
                continue;
            };
            if !user_categories.contains(category) {
                continue;
            }
            let entry = sums.entry(row.product_id.as_str()).or_insert((0.0, 0));
            entry.0 += row.avg_sentiment_score;
            entry.1 += 1;
        }

        let mut ranked: Vec<(&str, f64)> = sums
            .into_iter()
            .map(|(product_id, (sum, count))| (product_id, sum / count as f64))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked.truncate(k);

        let items: Vec<RecommendationItem> = ranked
            .iter()
            .filter_map(|(product_id, _)| self.table.first_product_row(product_id))
            .map(RecommendationItem::from_line)
            .collect();

        info!(
            user_id,
            candidates = items.len(),
            "Content-based recommendations ready"
        );
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{line, table};

    #[test]
    fn test_no_history_returns_empty() {
        let table = table(vec![line("o1", "p1", "u1", "toys", 0.5)]);
        let agent = ContentAgent::new(table);
        assert!(agent.recommend("stranger", DEFAULT_K).is_empty());
    }

    #[test]
    fn test_results_share_a_category_with_history() {
        let table = table(vec![
            line("o1", "p1", "u1", "toys", 0.2),
            line("o2", "p2", "u2", "toys", 0.9),
            line("o3", "p3", "u3", "electronics", 0.8),
        ]);
        let agent = ContentAgent::new(table);
        let items = agent.recommend("u1", DEFAULT_K);
        // u1 only ever bought toys; the electronics product must not appear.
        assert!(items.iter().all(|item| item.category.as_deref() == Some("toys")));
        // Sorted by sentiment descending: p2 (0.9) before p1 (0.2).
        assert_eq!(items[0].product_id, "p2");
        assert_eq!(items[1].product_id, "p1");
    }

    #[test]
    fn test_k_truncation_and_tie_break() {
        let table = table(vec![
            line("o1", "p1", "u1", "toys", 0.5),
            line("o2", "p3", "u2", "toys", 0.5),
            line("o3", "p2", "u3", "toys", 0.5),
        ]);
        let agent = ContentAgent::new(table);
        let items = agent.recommend("u1", 2);
        assert_eq!(items.len(), 2);
        // Equal sentiment falls back to product id order.
        assert_eq!(items[0].product_id, "p1");
        assert_eq!(items[1].product_id, "p2");
    }

    #[test]
    fn test_includes_unbought_products_from_known_categories() {
        let table = table(vec![
            line("o1", "p1", "u1", "toys", 0.1),
            line("o2", "p9", "u2", "toys", 0.7),
        ]);
        let agent = ContentAgent::new(table);
        let items = agent.recommend("u1", DEFAULT_K);
        assert!(items.iter().any(|item| item.product_id == "p9"));
    }
}
