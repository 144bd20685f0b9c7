//! Market-basket agent: answers lookups against the mined rule set.
//! Mining is expensive and happens at construction or explicit rebuild,
//! never per request; the rule set swaps in whole so readers never see a
//! partially rebuilt set.

use crate::apriori::{mine_rules, AssociationRule};
use commerce_core::config::BasketConfig;
use commerce_core::types::FeatureTable;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

pub struct MarketBasketAgent {
    config: BasketConfig,
    rules: RwLock<Arc<Vec<AssociationRule>>>,
}

impl MarketBasketAgent {
    /// Mines the rule set from the given table and retains it for the
    /// agent's lifetime.
    pub fn new(table: &FeatureTable, config: BasketConfig) -> Self {
        let rules = Arc::new(mine_rules(table, &config));
        Self {
            config,
            rules: RwLock::new(rules),
        }
    }

    /// Re-mine against a refreshed table. Mining runs outside the lock;
    /// the finished set is swapped in atomically.
    pub fn rebuild(&self, table: &FeatureTable) {
        let fresh = Arc::new(mine_rules(table, &self.config));
        let mut guard = self.rules.write();
        *guard = fresh;
    }

    /// Snapshot of the currently retained rule set.
    pub fn rules(&self) -> Arc<Vec<AssociationRule>> {
        Arc::clone(&self.rules.read())
    }

    /// Union of consequents across every retained rule whose antecedent
    /// contains a history item, minus the history itself. Order follows
    /// rule-discovery order, so results are deterministic for a fixed
    /// rule set.
    pub fn recommend(&self, user_order_history: &[String]) -> Vec<String> {
        metrics::counter!("agents.basket.requests").increment(1);

        let rules = self.rules();
        let history: HashSet<&str> = user_order_history.iter().map(String::as_str).collect();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut recommendations: Vec<String> = Vec::new();

        for item in user_order_history {
            for rule in rules.iter() {
                if !rule.antecedent.iter().any(|a| a == item) {
                    continue;
                }
                for consequent in &rule.consequent {
                    if history.contains(consequent.as_str()) {
                        continue;
                    }
                    if seen.insert(consequent) {
                        recommendations.push(consequent.clone());
                    }
                }
            }
        }

        info!(
            history = user_order_history.len(),
            recommended = recommendations.len(),
            "Market-basket recommendations ready"
        );
        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{line, table};
    use commerce_core::types::OrderLine;

    fn basket_rows(baskets: &[(&str, &[&str])]) -> Vec<OrderLine> {
        let mut rows = Vec::new();
        for (order, products) in baskets {
            for product in *products {
                rows.push(line(order, product, "u1", "toys", 0.0));
            }
        }
        rows
    }

    fn config() -> BasketConfig {
        BasketConfig {
            sample_size: 30_000,
            min_item_freq: 2,
            min_support: 0.1,
            min_confidence: 0.01,
            high_confidence: 0.05,
        }
    }

    fn agent() -> MarketBasketAgent {
        let rows = basket_rows(&[
            ("o1", &["p1", "p2"]),
            ("o2", &["p1", "p2"]),
            ("o3", &["p1", "p2"]),
            ("o4", &["p3"]),
            ("o5", &["p3"]),
        ]);
        MarketBasketAgent::new(&table(rows), config())
    }

    #[test]
    fn test_recommend_from_matching_rule() {
        let agent = agent();
        let recs = agent.recommend(&["p1".to_string()]);
        assert_eq!(recs, vec!["p2".to_string()]);
    }

    #[test]
    fn test_history_items_are_excluded() {
        let agent = agent();
        let recs = agent.recommend(&["p1".to_string(), "p2".to_string()]);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_no_matching_rule_returns_empty() {
        let agent = agent();
        assert!(agent.recommend(&["p3".to_string()]).is_empty());
        assert!(agent.recommend(&[]).is_empty());
    }

    #[test]
    fn test_recommend_is_idempotent() {
        let agent = agent();
        let history = vec!["p1".to_string()];
        assert_eq!(agent.recommend(&history), agent.recommend(&history));
    }

    #[test]
    fn test_rebuild_swaps_rule_set() {
        let agent = agent();
        assert!(!agent.rules().is_empty());

        // A table with no co-occurrence mines an empty rule set.
        let lonely = basket_rows(&[("o1", &["p9"]), ("o2", &["p9"])]);
        agent.rebuild(&table(lonely));
        assert!(agent.rules().is_empty());
        assert!(agent.recommend(&["p1".to_string()]).is_empty());
    }

    #[test]
    fn test_every_recommendation_is_backed_by_a_rule() {
        let agent = agent();
        let history = vec!["p1".to_string()];
        let rules = agent.rules();
        for item in agent.recommend(&history) {
            let backed = rules.iter().any(|rule| {
                rule.consequent.contains(&item)
                    && rule
                        .antecedent
                        .iter()
                        .any(|a| history.contains(a))
            });
            assert!(backed, "{item} has no backing rule");
            assert!(!history.contains(&item));
        }
    }
}
