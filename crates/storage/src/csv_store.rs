use commerce_core::error::{CommerceError, CommerceResult};
use commerce_core::types::{
    CategoryTranslationRecord, CustomerRecord, FeatureTable, OrderItemRecord, OrderLine,
    OrderRecord, PaymentRecord, ProductDetailsRecord, ProductRecord, RawTables, ReviewRecord,
    ReviewSummaryRecord,
};
use csv::{ReaderBuilder, WriterBuilder};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

const CUSTOMERS_FILE: &str = "olist_customers_dataset.csv";
const ORDERS_FILE: &str = "olist_orders_dataset.csv";
const ORDER_ITEMS_FILE: &str = "olist_order_items_dataset.csv";
const PRODUCTS_FILE: &str = "olist_products_dataset.csv";
const SELLERS_FILE: &str = "olist_sellers_dataset.csv";
const REVIEWS_FILE: &str = "olist_order_reviews_dataset.csv";
const PAYMENTS_FILE: &str = "olist_order_payments_dataset.csv";
const CATEGORY_TRANSLATION_FILE: &str = "product_category_name_translation.csv";
const PRODUCT_DETAILS_FILE: &str = "product_details.csv";
const REVIEW_SUMMARIES_FILE: &str = "top_1000_product_review_summaries.csv";
const FEATURE_TABLE_FILE: &str = "orders_full.csv";

/// File-backed warehouse for the raw entity tables and the processed
/// feature table.
pub struct CsvWarehouse {
    raw_dir: PathBuf,
    processed_dir: PathBuf,
}

impl CsvWarehouse {
    pub fn new(raw_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            processed_dir: processed_dir.into(),
        }
    }

    /// Load every raw table. A missing or unreadable file is fatal — the
    /// pipeline cannot run on a partial warehouse.
    pub fn load_raw_tables(&self) -> CommerceResult<RawTables> {
        info!(raw_dir = %self.raw_dir.display(), "Loading raw entity tables");
        let tables = RawTables {
            customers: self.load_table(&self.raw_dir.join(CUSTOMERS_FILE))?,
            orders: self.load_table(&self.raw_dir.join(ORDERS_FILE))?,
            order_items: self.load_table(&self.raw_dir.join(ORDER_ITEMS_FILE))?,
            products: self.load_table(&self.raw_dir.join(PRODUCTS_FILE))?,
            sellers: self.load_table(&self.raw_dir.join(SELLERS_FILE))?,
            reviews: self.load_table(&self.raw_dir.join(REVIEWS_FILE))?,
            payments: self.load_table(&self.raw_dir.join(PAYMENTS_FILE))?,
            category_translations: self
                .load_table(&self.raw_dir.join(CATEGORY_TRANSLATION_FILE))?,
            product_details: self.load_table(&self.processed_dir.join(PRODUCT_DETAILS_FILE))?,
            review_summaries: self.load_table(&self.processed_dir.join(REVIEW_SUMMARIES_FILE))?,
        };
        info!(
            order_items = tables.order_items.len(),
            customers = tables.customers.len(),
            curated_products = tables.product_details.len(),
            "Raw tables loaded"
        );
        Ok(tables)
    }

    /// Persist the feature table as `orders_full.csv`, the wire contract
    /// between the pipeline and the agents.
    pub fn write_feature_table(&self, table: &FeatureTable) -> CommerceResult<PathBuf> {
        let path = self.processed_dir.join(FEATURE_TABLE_FILE);
        let file = File::create(&path).map_err(|e| {
            CommerceError::Storage(format!("cannot create {}: {e}", path.display()))
        })?;
        let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
        for row in table.rows() {
            writer.serialize(row)?;
        }
        writer
            .flush()
            .map_err(|e| CommerceError::Storage(format!("flush {}: {e}", path.display())))?;
        info!(rows = table.len(), path = %path.display(), "Feature table written");
        Ok(path)
    }

    pub fn load_feature_table(&self) -> CommerceResult<FeatureTable> {
        let path = self.processed_dir.join(FEATURE_TABLE_FILE);
        let rows: Vec<OrderLine> = self.load_table(&path)?;
        info!(rows = rows.len(), path = %path.display(), "Feature table loaded");
        Ok(FeatureTable::new(rows))
    }

    fn load_table<T: DeserializeOwned>(&self, path: &Path) -> CommerceResult<Vec<T>> {
        let file = File::open(path)
            .map_err(|e| CommerceError::Storage(format!("cannot open {}: {e}", path.display())))?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut records = Vec::new();
        for record in reader.deserialize::<T>() {
            records.push(record?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "commerce-storage-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let dir = scratch_dir("missing");
        let warehouse = CsvWarehouse::new(&dir, &dir);
        let err = warehouse.load_raw_tables().unwrap_err();
        assert!(matches!(err, CommerceError::Storage(_)));
    }

    #[test]
    fn test_feature_table_round_trip() {
        let dir = scratch_dir("roundtrip");
        let warehouse = CsvWarehouse::new(&dir, &dir);

        let row = OrderLine {
            order_id: "o1".to_string(),
            product_id: "p1".to_string(),
            seller_id: "s1".to_string(),
            customer_unique_id: Some("u1".to_string()),
            customer_city: Some("campinas".to_string()),
            customer_state: Some("SP".to_string()),
            customer_zip_prefix: Some("13000".to_string()),
            product_category_name_english: Some("toys".to_string()),
            price: 35.5,
            freight_value: 8.2,
            payment_value: None,
            purchase_timestamp: None,
            purchase_day_of_week: Some(2),
            purchase_hour: Some(14),
            review_sentiment: 0.35,
            avg_sentiment_score: 0.35,
            persona_column: "Child-oriented, Parent".to_string(),
            title: Some("Blocks".to_string()),
            short_description: None,
            image_url: None,
            item_web_url: None,
            target_price: Some(40.0),
            summary: None,
            quantity: 1,
        };
        let written = FeatureTable::new(vec![row.clone()]);
        warehouse.write_feature_table(&written).unwrap();

        let reloaded = warehouse.load_feature_table().unwrap();
        assert_eq!(reloaded.rows(), written.rows());
    }

    #[test]
    fn test_load_raw_tables_reads_all_files() {
        let dir = scratch_dir("full");
        fs::write(
            dir.join(CUSTOMERS_FILE),
            "customer_id,customer_unique_id,customer_zip_code_prefix,customer_city,customer_state\n\
             c1,u1,01000,sao paulo,SP\n",
        )
        .unwrap();
        fs::write(
            dir.join(ORDERS_FILE),
            "order_id,customer_id,order_status,order_purchase_timestamp\n\
             o1,c1,delivered,2017-10-02 10:56:33\n",
        )
        .unwrap();
        fs::write(
            dir.join(ORDER_ITEMS_FILE),
            "order_id,order_item_id,product_id,seller_id,price,freight_value\n\
             o1,1,p1,s1,58.9,13.29\n",
        )
        .unwrap();
        fs::write(
            dir.join(PRODUCTS_FILE),
            "product_id,product_category_name\np1,brinquedos\n",
        )
        .unwrap();
        fs::write(
            dir.join(SELLERS_FILE),
            "seller_id,seller_zip_code_prefix,seller_city,seller_state\ns1,04000,sao paulo,SP\n",
        )
        .unwrap();
        fs::write(
            dir.join(REVIEWS_FILE),
            "review_id,order_id,review_score,review_comment_message\nr1,o1,5,\n",
        )
        .unwrap();
        fs::write(
            dir.join(PAYMENTS_FILE),
            "order_id,payment_value\no1,72.19\n",
        )
        .unwrap();
        fs::write(
            dir.join(CATEGORY_TRANSLATION_FILE),
            "product_category_name,product_category_name_english\nbrinquedos,toys\n",
        )
        .unwrap();
        fs::write(
            dir.join(PRODUCT_DETAILS_FILE),
            "product_id,title,shortDescription,imageUrl,itemWebUrl,target_price\n\
             p1,Blocks,Wooden blocks,http://img,http://link,40.0\n",
        )
        .unwrap();
        fs::write(
            dir.join(REVIEW_SUMMARIES_FILE),
            "product_id,summary\np1,Great blocks for kids\n",
        )
        .unwrap();

        let warehouse = CsvWarehouse::new(&dir, &dir);
        let tables = warehouse.load_raw_tables().unwrap();
        assert_eq!(tables.customers.len(), 1);
        assert_eq!(tables.order_items.len(), 1);
        assert_eq!(tables.reviews[0].review_comment_message, None);
        assert_eq!(
            tables.product_details[0].short_description.as_deref(),
            Some("Wooden blocks")
        );
        assert_eq!(
            tables.review_summaries[0].summary.as_deref(),
            Some("Great blocks for kids")
        );
    }
}
