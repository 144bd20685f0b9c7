//! Apriori frequent-itemset mining and association-rule generation over
//! order/product co-occurrence. Operates on a binarized basket matrix:
//! one row per order, one column per retained product.

use commerce_core::config::BasketConfig;
use commerce_core::types::FeatureTable;
use ndarray::Array2;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// A mined implication between product sets. Product ids in antecedent
/// and consequent are sorted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationRule {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

/// A frequent itemset with its support and cardinality.
#[derive(Debug, Clone)]
pub struct FrequentItemset {
    /// Column indices into the basket matrix, sorted ascending.
    items: Vec<usize>,
    support: f64,
}

impl FrequentItemset {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Mine the retained high-confidence rule set from a capped sample of the
/// feature table. Deterministic for a fixed table and config.
pub fn mine_rules(table: &FeatureTable, config: &BasketConfig) -> Vec<AssociationRule> {
    let sample: Vec<_> = table.rows().iter().take(config.sample_size).collect();
    info!(
        sample_rows = sample.len(),
        min_support = config.min_support,
        "Mining association rules"
    );

    // Keep products purchased at least `min_item_freq` times in the sample.
    let mut item_freq: HashMap<&str, usize> = HashMap::new();
    for row in &sample {
        *item_freq.entry(row.product_id.as_str()).or_insert(0) += 1;
    }
    let mut products: Vec<&str> = item_freq
        .iter()
        .filter(|(_, &count)| count >= config.min_item_freq)
        .map(|(&product, _)| product)
        .collect();
    products.sort_unstable();
    if products.is_empty() {
        info!("No product reaches the frequency floor, rule set is empty");
        return Vec::new();
    }
    let column_of: HashMap<&str, usize> = products
        .iter()
        .enumerate()
        .map(|(idx, &product)| (product, idx))
        .collect();

    // Pivot into the binarized basket matrix. Order ids are sorted so the
    // matrix layout does not depend on map iteration order.
    let mut order_ids: Vec<&str> = sample
        .iter()
        .filter(|row| column_of.contains_key(row.product_id.as_str()))
        .map(|row| row.order_id.as_str())
        .collect();
    order_ids.sort_unstable();
    order_ids.dedup();
    let row_of: HashMap<&str, usize> = order_ids
        .iter()
        .enumerate()
        .map(|(idx, &order)| (order, idx))
        .collect();

    let mut basket = Array2::<bool>::from_elem((order_ids.len(), products.len()), false);
    for row in &sample {
        if let (Some(&basket_row), Some(&column)) = (
            row_of.get(row.order_id.as_str()),
            column_of.get(row.product_id.as_str()),
        ) {
            basket[[basket_row, column]] = true;
        }
    }

    let itemsets = frequent_itemsets(&basket, config.min_support);
    info!(itemsets = itemsets.len(), "Frequent itemsets generated");

    let rules = generate_rules(&itemsets, &products, config);
    info!(rules = rules.len(), "High-confidence rules retained");
    rules
}

/// Level-wise Apriori over the basket matrix. Returns every itemset with
/// support >= `min_support`, singletons included.
fn frequent_itemsets(basket: &Array2<bool>, min_support: f64) -> Vec<FrequentItemset> {
    let n_baskets = basket.nrows();
    let n_products = basket.ncols();
    if n_baskets == 0 {
        return Vec::new();
    }

    let support_of = |items: &[usize]| -> f64 {
        let count = (0..n_baskets)
            .filter(|&row| items.iter().all(|&column| basket[[row, column]]))
            .count();
        count as f64 / n_baskets as f64
    };

    let mut all: Vec<FrequentItemset> = Vec::new();
    let mut current: Vec<Vec<usize>> = (0..n_products)
        .map(|column| vec![column])
        .filter(|items| support_of(items) >= min_support)
        .collect();

    while !current.is_empty() {
        for items in &current {
            all.push(FrequentItemset {
                items: items.clone(),
                support: support_of(items),
            });
        }

        // Join step: merge pairs sharing all but the last item, then keep
        // candidates whose every (k-1)-subset is frequent.
        let mut next: Vec<Vec<usize>> = Vec::new();
        for i in 0..current.len() {
            for j in (i + 1)..current.len() {
                let (a, b) = (&current[i], &current[j]);
                if a[..a.len() - 1] != b[..b.len() - 1] {
                    continue;
                }
                let mut candidate = a.clone();
                candidate.push(b[b.len() - 1]);
                if !all_subsets_frequent(&candidate, &current) {
                    continue;
                }
                if support_of(&candidate) >= min_support {
                    next.push(candidate);
                }
            }
        }
        next.sort_unstable();
        current = next;
    }

    all
}

fn all_subsets_frequent(candidate: &[usize], frequent: &[Vec<usize>]) -> bool {
    (0..candidate.len()).all(|skip| {
        let subset: Vec<usize> = candidate
            .iter()
            .enumerate()
            .filter(|&(idx, _)| idx != skip)
            .map(|(_, &item)| item)
            .collect();
        frequent.binary_search(&subset).is_ok()
    })
}

/// Split every frequent itemset of size >= 2 into antecedent/consequent
/// pairs, rank by confidence, and retain only the high-confidence rules.
fn generate_rules(
    itemsets: &[FrequentItemset],
    products: &[&str],
    config: &BasketConfig,
) -> Vec<AssociationRule> {
    let support_by_items: HashMap<&[usize], f64> = itemsets
        .iter()
        .map(|itemset| (itemset.items.as_slice(), itemset.support))
        .collect();

    let mut rules = Vec::new();
    for itemset in itemsets.iter().filter(|itemset| itemset.len() >= 2) {
        let size = itemset.len();
        // Every non-empty proper subset is an antecedent candidate; the
        // bitmask walk keeps the split order deterministic.
        for mask in 1..((1usize << size) - 1) {
            let antecedent: Vec<usize> = (0..size)
                .filter(|bit| mask & (1 << bit) != 0)
                .map(|bit| itemset.items[bit])
                .collect();
            let consequent: Vec<usize> = (0..size)
                .filter(|bit| mask & (1 << bit) == 0)
                .map(|bit| itemset.items[bit])
                .collect();

            // Subsets of a frequent itemset are themselves frequent, so
            // both supports are known.
            let Some(&antecedent_support) = support_by_items.get(antecedent.as_slice()) else {
                continue;
            };
            let Some(&consequent_support) = support_by_items.get(consequent.as_slice()) else {
                continue;
            };

            let confidence = itemset.support / antecedent_support;
            if confidence < config.min_confidence {
                continue;
            }
            rules.push(AssociationRule {
                antecedent: antecedent.iter().map(|&i| products[i].to_string()).collect(),
                consequent: consequent.iter().map(|&i| products[i].to_string()).collect(),
                support: itemset.support,
                confidence,
                lift: confidence / consequent_support,
            });
        }
    }

    rules.retain(|rule| rule.confidence >= config.high_confidence);
    rules
}
