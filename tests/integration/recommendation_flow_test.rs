//! End-to-end scenarios over the full pipeline-to-agents flow, built on
//! a small hand-crafted warehouse.

#[cfg(test)]
mod tests {
    use commerce_agents::{
        CollaborativeAgent, ContentAgent, ContextAgent, ContextRecommendation, MarketBasketAgent,
        StaticTrendSignals,
    };
    use commerce_core::config::{BasketConfig, ContextConfig};
    use commerce_core::personas::PersonaRules;
    use commerce_core::types::{
        CategoryTranslationRecord, CustomerRecord, FeatureTable, OrderItemRecord, OrderRecord,
        ProductDetailsRecord, ProductRecord, RawTables, ReviewRecord,
    };
    use commerce_pipeline::{FeaturePipeline, LexiconScorer};
    use std::sync::Arc;

    fn customer(id: &str, unique: &str, city: &str) -> CustomerRecord {
        CustomerRecord {
            customer_id: id.to_string(),
            customer_unique_id: unique.to_string(),
            customer_zip_code_prefix: "01000".to_string(),
            customer_city: city.to_string(),
            customer_state: "SP".to_string(),
        }
    }

    fn order(id: &str, customer_id: &str) -> OrderRecord {
        OrderRecord {
            order_id: id.to_string(),
            customer_id: customer_id.to_string(),
            order_status: "delivered".to_string(),
            order_purchase_timestamp: "2018-03-05 16:20:00".to_string(),
        }
    }

    fn item(order_id: &str, product_id: &str) -> OrderItemRecord {
        OrderItemRecord {
            order_id: order_id.to_string(),
            order_item_id: 1,
            product_id: product_id.to_string(),
            seller_id: "s1".to_string(),
            price: 120.0,
            freight_value: 15.0,
        }
    }

    fn product(id: &str, category: &str) -> ProductRecord {
        ProductRecord {
            product_id: id.to_string(),
            product_category_name: Some(category.to_string()),
        }
    }

    fn details(id: &str, title: &str) -> ProductDetailsRecord {
        ProductDetailsRecord {
            product_id: id.to_string(),
            title: Some(title.to_string()),
            short_description: Some("No Description Provided".to_string()),
            image_url: None,
            item_web_url: None,
            target_price: Some(150.0),
        }
    }

    fn translation(from: &str, to: &str) -> CategoryTranslationRecord {
        CategoryTranslationRecord {
            product_category_name: from.to_string(),
            product_category_name_english: to.to_string(),
        }
    }

    /// Two gamers in sao paulo, one General Consumer, one ghost user, and
    /// twelve market-basket orders where p-kit and p-addon always co-occur.
    fn sample_warehouse() -> RawTables {
        let mut raw = RawTables {
            customers: vec![
                customer("c-a", "u-a", "sao paulo"),
                customer("c-b", "u-b", "sao paulo"),
                customer("c-d", "u-d", "campinas"),
            ],
            orders: vec![order("o-a", "c-a"), order("o-b", "c-b"), order("o-d", "c-d")],
            order_items: vec![
                item("o-a", "p-console"),
                item("o-b", "p-handheld"),
                item("o-d", "p-sheets"),
            ],
            products: vec![
                product("p-console", "consoles_games"),
                product("p-handheld", "consoles_games"),
                product("p-sheets", "cama_mesa_banho"),
                product("p-kit", "brinquedos"),
                product("p-addon", "brinquedos"),
            ],
            sellers: vec![commerce_core::types::SellerRecord {
                seller_id: "s1".to_string(),
                seller_zip_code_prefix: "04000".to_string(),
                seller_city: "sao paulo".to_string(),
                seller_state: "SP".to_string(),
            }],
            reviews: vec![ReviewRecord {
                review_id: "r1".to_string(),
                order_id: "o-a".to_string(),
                review_score: Some(5),
                review_comment_message: Some("excellent console, love it".to_string()),
            }],
            payments: Vec::new(),
            category_translations: vec![
                translation("consoles_games", "consoles_games"),
                translation("cama_mesa_banho", "bed_bath_table"),
                translation("brinquedos", "toys"),
            ],
            product_details: vec![
                details("p-console", "Game Console"),
                details("p-handheld", "Handheld Console"),
                details("p-sheets", "Bed Sheets"),
                details("p-kit", "Building Kit"),
                details("p-addon", "Kit Expansion"),
            ],
            review_summaries: Vec::new(),
        };

        // Twelve baskets where the kit and its expansion are bought together,
        // enough to clear the 10-purchase frequency floor.
        for i in 0..12 {
            let customer_id = format!("c-m{i}");
            let unique_id = format!("u-m{i}");
            let order_id = format!("o-m{i}");
            raw.customers.push(customer(&customer_id, &unique_id, "rio"));
            raw.orders.push(order(&order_id, &customer_id));
            raw.order_items.push(item(&order_id, "p-kit"));
            raw.order_items.push(item(&order_id, "p-addon"));
        }
        raw
    }

    fn build_table() -> Arc<FeatureTable> {
        let pipeline =
            FeaturePipeline::new(PersonaRules::default(), Box::new(LexiconScorer::new()));
        Arc::new(pipeline.build(&sample_warehouse()).unwrap())
    }

    #[test]
    fn test_shared_persona_cohort_surfaces_product() {
        let table = build_table();

        // Both console buyers carry the Gamer persona.
        let a_row = &table.user_rows("u-a")[0];
        assert!(a_row.persona_column.contains("Gamer"));
        let b_row = &table.user_rows("u-b")[0];
        assert!(b_row.persona_column.contains("Gamer"));

        // B never bought the console, but cohort-mate A did.
        let agent = CollaborativeAgent::new(Arc::clone(&table));
        let items = agent.recommend("u-b", 10);
        assert!(items.iter().any(|item| item.product_id == "p-console"));
        assert!(items.iter().all(|item| item.product_id != "p-handheld"));
    }

    #[test]
    fn test_cooccurrence_rule_retained_and_applied() {
        let table = build_table();
        let agent = MarketBasketAgent::new(&table, BasketConfig::default());

        let rules = agent.rules();
        assert!(rules.iter().any(|rule| {
            rule.antecedent == vec!["p-kit".to_string()]
                && rule.consequent == vec!["p-addon".to_string()]
        }));

        let recs = agent.recommend(&["p-kit".to_string()]);
        assert!(recs.contains(&"p-addon".to_string()));
        // Nothing already in the history comes back.
        assert!(!recs.contains(&"p-kit".to_string()));
    }

    #[tokio::test]
    async fn test_zero_history_user_across_agents() {
        let table = build_table();

        let content = ContentAgent::new(Arc::clone(&table));
        assert!(content.recommend("u-ghost", 10).is_empty());

        // The ghost falls into the General Consumer cohort, which contains
        // the bed-sheets buyer (unmapped category).
        let sheets_row = &table.user_rows("u-d")[0];
        assert_eq!(sheets_row.persona_column, "General Consumer");
        let collaborative = CollaborativeAgent::new(Arc::clone(&table));
        let items = collaborative.recommend("u-ghost", 10);
        assert!(items.iter().any(|item| item.product_id == "p-sheets"));

        let context = ContextAgent::new(
            Arc::clone(&table),
            ContextConfig::default(),
            Box::new(StaticTrendSignals),
            None,
        );
        let result = context.recommend("u-ghost", 6).await;
        assert!(matches!(result, ContextRecommendation::UserNotFound));
    }

    #[tokio::test]
    async fn test_context_items_come_from_resolved_city() {
        let table = build_table();
        let context = ContextAgent::new(
            Arc::clone(&table),
            ContextConfig::default(),
            Box::new(StaticTrendSignals),
            None,
        );
        let ContextRecommendation::Found(insights) = context.recommend("u-a", 6).await else {
            panic!("expected found");
        };
        assert_eq!(insights.location, "sao paulo");
        assert!(!insights.items.is_empty());
        for item in &insights.items {
            let in_city = table
                .product_rows(&item.product_id)
                .iter()
                .any(|row| row.customer_city.as_deref() == Some("sao paulo"));
            assert!(in_city, "{} has no sao paulo purchase", item.product_id);
        }
    }

    #[test]
    fn test_pipeline_is_deterministic_end_to_end() {
        let raw = sample_warehouse();
        let pipeline =
            FeaturePipeline::new(PersonaRules::default(), Box::new(LexiconScorer::new()));
        let first = pipeline.build(&raw).unwrap();
        let second = pipeline.build(&raw).unwrap();
        assert_eq!(first.rows(), second.rows());
    }

    #[test]
    fn test_sentiment_and_persona_invariants_hold() {
        let table = build_table();
        let mut sentiment_by_product: std::collections::HashMap<&str, u64> =
            std::collections::HashMap::new();
        let mut persona_by_user: std::collections::HashMap<&str, &str> =
            std::collections::HashMap::new();

        for row in table.rows() {
            assert!((-1.0..=1.0).contains(&row.avg_sentiment_score));
            assert!(!row.persona_column.is_empty());

            let bits = row.avg_sentiment_score.to_bits();
            let previous = sentiment_by_product.insert(row.product_id.as_str(), bits);
            if let Some(previous) = previous {
                assert_eq!(previous, bits, "{} has mixed sentiment", row.product_id);
            }

            if let Some(user) = row.customer_unique_id.as_deref() {
                let previous = persona_by_user.insert(user, row.persona_column.as_str());
                if let Some(previous) = previous {
                    assert_eq!(previous, row.persona_column, "{user} has mixed personas");
                }
            }
        }
    }
}
