use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Raw entity records (one struct per warehouse CSV) ──────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub customer_unique_id: String,
    pub customer_zip_code_prefix: String,
    pub customer_city: String,
    pub customer_state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_id: String,
    pub order_status: String,
    /// Raw timestamp as stored in the warehouse, `%Y-%m-%d %H:%M:%S`.
    pub order_purchase_timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub order_id: String,
    pub order_item_id: u32,
    pub product_id: String,
    pub seller_id: String,
    pub price: f64,
    pub freight_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    pub product_category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerRecord {
    pub seller_id: String,
    pub seller_zip_code_prefix: String,
    pub seller_city: String,
    pub seller_state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub review_id: String,
    pub order_id: String,
    pub review_score: Option<i32>,
    pub review_comment_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub order_id: String,
    pub payment_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTranslationRecord {
    pub product_category_name: String,
    pub product_category_name_english: String,
}

/// Per-product enrichment for the curated product set. The `product_id`
/// column of this table defines the curated set itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetailsRecord {
    pub product_id: String,
    pub title: Option<String>,
    #[serde(rename = "shortDescription")]
    pub short_description: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(rename = "itemWebUrl")]
    pub item_web_url: Option<String>,
    pub target_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSummaryRecord {
    pub product_id: String,
    pub summary: Option<String>,
}

/// The full set of raw tables the feature pipeline joins. Any missing
/// table is fatal at pipeline-build time.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub customers: Vec<CustomerRecord>,
    pub orders: Vec<OrderRecord>,
    pub order_items: Vec<OrderItemRecord>,
    pub products: Vec<ProductRecord>,
    pub sellers: Vec<SellerRecord>,
    pub reviews: Vec<ReviewRecord>,
    pub payments: Vec<PaymentRecord>,
    pub category_translations: Vec<CategoryTranslationRecord>,
    pub product_details: Vec<ProductDetailsRecord>,
    pub review_summaries: Vec<ReviewSummaryRecord>,
}

// ─── Denormalized feature table ─────────────────────────────────────────────

/// One row per (order, order-item, product) after the multi-way join.
/// Left-join semantics: dimension fields are None when the dimension row
/// was missing, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: String,
    pub product_id: String,
    pub seller_id: String,
    pub customer_unique_id: Option<String>,
    pub customer_city: Option<String>,
    pub customer_state: Option<String>,
    pub customer_zip_prefix: Option<String>,
    pub product_category_name_english: Option<String>,
    pub price: f64,
    pub freight_value: f64,
    pub payment_value: Option<f64>,
    pub purchase_timestamp: Option<NaiveDateTime>,
    /// Monday = 0, Sunday = 6.
    pub purchase_day_of_week: Option<u8>,
    pub purchase_hour: Option<u8>,
    /// Per-row review polarity in [-1, 1]; empty review text scores 0.
    pub review_sentiment: f64,
    /// Product-level mean of `review_sentiment`, identical on every row
    /// of the same product.
    pub avg_sentiment_score: f64,
    /// Comma-joined persona labels, identical on every row of the same
    /// customer. Falls back to "General Consumer".
    pub persona_column: String,
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub image_url: Option<String>,
    pub item_web_url: Option<String>,
    pub target_price: Option<f64>,
    pub summary: Option<String>,
    pub quantity: u32,
}

/// The read-only feature table shared by every agent, with hash indexes
/// over the two keys agents actually query.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    rows: Vec<OrderLine>,
    by_user: HashMap<String, Vec<usize>>,
    by_product: HashMap<String, Vec<usize>>,
}

impl FeatureTable {
    pub fn new(rows: Vec<OrderLine>) -> Self {
        let mut by_user: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_product: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, row) in rows.iter().enumerate() {
            if let Some(user) = &row.customer_unique_id {
                by_user.entry(user.clone()).or_default().push(idx);
            }
            by_product.entry(row.product_id.clone()).or_default().push(idx);
        }
        Self {
            rows,
            by_user,
            by_product,
        }
    }

    pub fn rows(&self) -> &[OrderLine] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows for a customer, in table order.
    pub fn user_rows(&self, customer_unique_id: &str) -> Vec<&OrderLine> {
        self.by_user
            .get(customer_unique_id)
            .map(|indices| indices.iter().map(|&i| &self.rows[i]).collect())
            .unwrap_or_default()
    }

    /// All rows for a product, in table order.
    pub fn product_rows(&self, product_id: &str) -> Vec<&OrderLine> {
        self.by_product
            .get(product_id)
            .map(|indices| indices.iter().map(|&i| &self.rows[i]).collect())
            .unwrap_or_default()
    }

    pub fn first_product_row(&self, product_id: &str) -> Option<&OrderLine> {
        self.by_product
            .get(product_id)
            .and_then(|indices| indices.first())
            .map(|&i| &self.rows[i])
    }

    /// The user's purchase history as product ids, in table order,
    /// duplicates preserved.
    pub fn user_product_ids(&self, customer_unique_id: &str) -> Vec<String> {
        self.user_rows(customer_unique_id)
            .iter()
            .map(|row| row.product_id.clone())
            .collect()
    }

    /// Sorted distinct category names present in the table.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .rows
            .iter()
            .filter_map(|row| row.product_category_name_english.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }
}

// ─── Agent output ───────────────────────────────────────────────────────────

/// The uniform recommendation unit every agent produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub product_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub category: Option<String>,
    pub avg_sentiment_score: Option<f64>,
    pub avg_price: Option<f64>,
    pub summary: Option<String>,
}

impl RecommendationItem {
    /// Hydrate display fields from a feature-table row.
    pub fn from_line(line: &OrderLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            name: line.title.clone(),
            description: line.short_description.clone(),
            image_url: line.image_url.clone(),
            link: line.item_web_url.clone(),
            category: line.product_category_name_english.clone(),
            avg_sentiment_score: Some(line.avg_sentiment_score),
            avg_price: line.target_price,
            summary: line.summary.clone(),
        }
    }
}
