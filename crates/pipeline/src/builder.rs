//! Feature pipeline: joins the raw entity tables into the denormalized
//! order-line table, derives time features, scores sentiment, broadcasts
//! per-product sentiment means and per-customer personas, and restricts
//! the result to the curated product set.

use chrono::{Datelike, NaiveDateTime, Timelike};
use commerce_core::error::{CommerceError, CommerceResult};
use commerce_core::personas::{PersonaRules, GENERAL_CONSUMER};
use commerce_core::types::{
    CustomerRecord, FeatureTable, OrderLine, OrderRecord, PaymentRecord, ProductDetailsRecord,
    ProductRecord, RawTables, ReviewRecord,
};
use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::sentiment::SentimentScorer;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Builds the feature table from the raw tables. Constructed once at
/// service start; rebuilding means running `build` again on fresh input.
pub struct FeaturePipeline {
    persona_rules: PersonaRules,
    scorer: Box<dyn SentimentScorer>,
}

impl FeaturePipeline {
    pub fn new(persona_rules: PersonaRules, scorer: Box<dyn SentimentScorer>) -> Self {
        Self {
            persona_rules,
            scorer,
        }
    }

    /// Run the full pipeline. Deterministic: the same raw input always
    /// produces the same table.
    pub fn build(&self, raw: &RawTables) -> CommerceResult<FeatureTable> {
        self.check_required_tables(raw)?;

        let curated: HashSet<&str> = raw
            .product_details
            .iter()
            .map(|d| d.product_id.as_str())
            .collect();

        // Dimension indexes keyed by natural foreign key. Reviews and
        // payments can match an order more than once and fan out.
        let orders_by_id: HashMap<&str, &OrderRecord> = raw
            .orders
            .iter()
            .map(|o| (o.order_id.as_str(), o))
            .collect();
        let customers_by_id: HashMap<&str, &CustomerRecord> = raw
            .customers
            .iter()
            .map(|c| (c.customer_id.as_str(), c))
            .collect();
        let products_by_id: HashMap<&str, &ProductRecord> = raw
            .products
            .iter()
            .map(|p| (p.product_id.as_str(), p))
            .collect();
        let translation: HashMap<&str, &str> = raw
            .category_translations
            .iter()
            .map(|t| {
                (
                    t.product_category_name.as_str(),
                    t.product_category_name_english.as_str(),
                )
            })
            .collect();
        let details_by_product: HashMap<&str, &ProductDetailsRecord> = raw
            .product_details
            .iter()
            .map(|d| (d.product_id.as_str(), d))
            .collect();
        let summaries_by_product: HashMap<&str, &str> = raw
            .review_summaries
            .iter()
            .filter_map(|s| s.summary.as_deref().map(|text| (s.product_id.as_str(), text)))
            .collect();
        let mut reviews_by_order: HashMap<&str, Vec<&ReviewRecord>> = HashMap::new();
        for review in &raw.reviews {
            reviews_by_order
                .entry(review.order_id.as_str())
                .or_default()
                .push(review);
        }
        let mut payments_by_order: HashMap<&str, Vec<&PaymentRecord>> = HashMap::new();
        for payment in &raw.payments {
            payments_by_order
                .entry(payment.order_id.as_str())
                .or_default()
                .push(payment);
        }

        info!("Merging datasets into the order-line table");
        let mut rows = Vec::new();
        for item in raw
            .order_items
            .iter()
            .filter(|item| curated.contains(item.product_id.as_str()))
        {
            let order = orders_by_id.get(item.order_id.as_str()).copied();
            let customer = order
                .and_then(|o| customers_by_id.get(o.customer_id.as_str()))
                .copied();
            let product = products_by_id.get(item.product_id.as_str()).copied();
            let details = details_by_product.get(item.product_id.as_str()).copied();
            let summary = summaries_by_product
                .get(item.product_id.as_str())
                .map(|s| s.to_string());

            let purchase_timestamp = order.and_then(|o| {
                NaiveDateTime::parse_from_str(&o.order_purchase_timestamp, TIMESTAMP_FORMAT).ok()
            });
            let purchase_day_of_week = purchase_timestamp
                .map(|ts| ts.date().weekday().num_days_from_monday() as u8);
            let purchase_hour = purchase_timestamp.map(|ts| ts.time().hour() as u8);

            let category_english = product
                .and_then(|p| p.product_category_name.as_deref())
                .and_then(|name| translation.get(name))
                .map(|en| en.to_string());

            // Left-join fan-out: one output row per matching review and
            // payment; a missing match contributes a single null.
            let review_matches: Vec<Option<&ReviewRecord>> = match reviews_by_order
                .get(item.order_id.as_str())
            {
                Some(matches) => matches.iter().map(|r| Some(*r)).collect(),
                None => vec![None],
            };
            let payment_matches: Vec<Option<&PaymentRecord>> = match payments_by_order
                .get(item.order_id.as_str())
            {
                Some(matches) => matches.iter().map(|p| Some(*p)).collect(),
                None => vec![None],
            };

            for review in &review_matches {
                let sentiment_text = summary
                    .clone()
                    .or_else(|| review.and_then(|r| r.review_comment_message.clone()))
                    .unwrap_or_default();
                let review_sentiment = self.scorer.score(&sentiment_text);

                for payment in &payment_matches {
                    rows.push(OrderLine {
                        order_id: item.order_id.clone(),
                        product_id: item.product_id.clone(),
                        seller_id: item.seller_id.clone(),
                        customer_unique_id: customer.map(|c| c.customer_unique_id.clone()),
                        customer_city: customer.map(|c| c.customer_city.clone()),
                        customer_state: customer.map(|c| c.customer_state.clone()),
                        customer_zip_prefix: customer
                            .map(|c| c.customer_zip_code_prefix.clone()),
                        product_category_name_english: category_english.clone(),
                        price: item.price,
                        freight_value: item.freight_value,
                        payment_value: payment.map(|p| p.payment_value),
                        purchase_timestamp,
                        purchase_day_of_week,
                        purchase_hour,
                        review_sentiment,
                        avg_sentiment_score: 0.0,
                        persona_column: String::new(),
                        title: details.and_then(|d| d.title.clone()),
                        short_description: details.and_then(|d| d.short_description.clone()),
                        image_url: details.and_then(|d| d.image_url.clone()),
                        item_web_url: details.and_then(|d| d.item_web_url.clone()),
                        target_price: details.and_then(|d| d.target_price),
                        summary: summary.clone(),
                        quantity: 1,
                    });
                }
            }
        }

        info!(rows = rows.len(), "Calculating average sentiment scores per product");
        self.broadcast_avg_sentiment(&mut rows);

        info!("Assigning customer personas");
        self.broadcast_personas(&mut rows);

        let before = rows.len();
        rows = dedup_rows(rows);
        info!(
            rows = rows.len(),
            dropped = before - rows.len(),
            "Feature table complete"
        );

        Ok(FeatureTable::new(rows))
    }

    fn check_required_tables(&self, raw: &RawTables) -> CommerceResult<()> {
        let required: [(&str, bool); 5] = [
            ("orders", raw.orders.is_empty()),
            ("customers", raw.customers.is_empty()),
            ("order_items", raw.order_items.is_empty()),
            ("products", raw.products.is_empty()),
            ("product_details", raw.product_details.is_empty()),
        ];
        for (name, empty) in required {
            if empty {
                return Err(CommerceError::Pipeline(format!(
                    "required raw table `{name}` is empty"
                )));
            }
        }
        Ok(())
    }

    /// Mean review sentiment per product, broadcast onto every row of
    /// that product.
    fn broadcast_avg_sentiment(&self, rows: &mut [OrderLine]) {
        let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
        for row in rows.iter() {
            let entry = sums.entry(row.product_id.clone()).or_insert((0.0, 0));
            entry.0 += row.review_sentiment;
            entry.1 += 1;
        }
        for row in rows.iter_mut() {
            let (sum, count) = sums[&row.product_id];
            row.avg_sentiment_score = sum / count as f64;
        }
    }

    /// Persona labels from each customer's top-5 purchased categories,
    /// broadcast onto every row of that customer. Rows without a resolved
    /// customer get the fallback label.
    fn broadcast_personas(&self, rows: &mut [OrderLine]) {
        let mut category_counts: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for row in rows.iter() {
            if let (Some(user), Some(category)) = (
                &row.customer_unique_id,
                &row.product_category_name_english,
            ) {
                *category_counts
                    .entry(user.clone())
                    .or_default()
                    .entry(category.clone())
                    .or_insert(0) += 1;
            }
        }

        let mut persona_by_user: HashMap<String, String> = HashMap::new();
        for (user, counts) in &category_counts {
            let mut ranked: Vec<(&String, &usize)> = counts.iter().collect();
            // Count descending, category ascending so the top-5 cut is stable.
            ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            let top_categories: Vec<String> = ranked
                .into_iter()
                .take(5)
                .map(|(category, _)| category.clone())
                .collect();
            let personas = self.persona_rules.assign(&top_categories);
            persona_by_user.insert(user.clone(), personas.join(", "));
        }

        for row in rows.iter_mut() {
            row.persona_column = row
                .customer_unique_id
                .as_ref()
                .and_then(|user| persona_by_user.get(user).cloned())
                .unwrap_or_else(|| GENERAL_CONSUMER.to_string());
        }
    }
}

/// Drop exact-duplicate rows, keeping first occurrence. Float fields
/// compare bitwise.
fn dedup_rows(rows: Vec<OrderLine>) -> Vec<OrderLine> {
    let mut seen: HashSet<String> = HashSet::with_capacity(rows.len());
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        if seen.insert(dedup_key(&row)) {
            kept.push(row);
        }
    }
    kept
}

fn dedup_key(row: &OrderLine) -> String {
    format!(
        "{}\u{1f}{}\u{1f}{}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{:x}\u{1f}{:x}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{:x}\u{1f}{:x}\u{1f}{}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{}",
        row.order_id,
        row.product_id,
        row.seller_id,
        row.customer_unique_id,
        row.customer_city,
        row.customer_state,
        row.customer_zip_prefix,
        row.product_category_name_english,
        row.price.to_bits(),
        row.freight_value.to_bits(),
        row.payment_value.map(f64::to_bits),
        row.purchase_timestamp,
        row.purchase_day_of_week,
        row.purchase_hour,
        row.review_sentiment.to_bits(),
        row.avg_sentiment_score.to_bits(),
        row.persona_column,
        row.title,
        row.short_description,
        row.image_url,
        row.item_web_url,
        row.target_price.map(f64::to_bits),
        row.summary,
        row.quantity,
    )
}
