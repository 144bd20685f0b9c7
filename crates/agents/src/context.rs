//! Context-aware (location) agent: ranks products by popularity in the
//! user's city, optionally narrowed to LLM-selected categories informed
//! by seasonal/event/social trend signals.

use commerce_core::config::ContextConfig;
use commerce_core::types::{FeatureTable, RecommendationItem};
use commerce_llm::TextGenerator;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_K: usize = 6;

const MAX_SELECTED_CATEGORIES: usize = 5;

/// External trend signal sources for a city. Responses are opaque
/// strings; implementations may call out to anything or nothing.
pub trait TrendSignals: Send + Sync {
    fn seasonal_trends(&self, city: &str, date: &str) -> String;
    fn local_events(&self, city: &str) -> String;
    fn social_media_trends(&self, city: &str) -> String;
}

/// Canned signal strings, standing in for the real trend APIs.
pub struct StaticTrendSignals;

impl TrendSignals for StaticTrendSignals {
    fn seasonal_trends(&self, _city: &str, _date: &str) -> String {
        "Seasonal trends are :".to_string()
    }

    fn local_events(&self, _city: &str) -> String {
        "Event based recs are :".to_string()
    }

    fn social_media_trends(&self, _city: &str) -> String {
        "Social media trends are :".to_string()
    }
}

/// Tagged result of a context lookup: an unknown user is data, not an
/// error, and distinct from "found but nothing to recommend".
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContextRecommendation {
    Found(ContextInsights),
    UserNotFound,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextInsights {
    pub location: String,
    pub seasonal_trends: Option<String>,
    pub local_events: Option<String>,
    pub social_media_trends: Option<String>,
    /// Coarse category suggestion derived from the seasonal signal.
    pub seasonal_category: Option<String>,
    pub items: Vec<RecommendationItem>,
}

#[derive(Debug, Deserialize)]
struct CategorySelection {
    categories: Vec<String>,
}

pub struct ContextAgent {
    table: Arc<FeatureTable>,
    config: ContextConfig,
    signals: Box<dyn TrendSignals>,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl ContextAgent {
    pub fn new(
        table: Arc<FeatureTable>,
        config: ContextConfig,
        signals: Box<dyn TrendSignals>,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        Self {
            table,
            config,
            signals,
            generator,
        }
    }

    /// City-popular products for the user, top-k by order count within
    /// the resolved city and chosen categories.
    pub async fn recommend(&self, user_id: &str, k: usize) -> ContextRecommendation {
        metrics::counter!("agents.context.requests").increment(1);

        let Some(location) = self.user_location(user_id) else {
            warn!(user_id, "User location not found");
            return ContextRecommendation::UserNotFound;
        };
        info!(user_id, location = %location, "Resolved user location");

        let today = chrono::Utc::now().date_naive().to_string();
        let (seasonal, events, social) = if self.config.signals_enabled {
            (
                Some(self.signals.seasonal_trends(&location, &today)),
                Some(self.signals.local_events(&location)),
                Some(self.signals.social_media_trends(&location)),
            )
        } else {
            (None, None, None)
        };
        let seasonal_category = seasonal.as_deref().map(seasonal_category_for);

        let all_categories = self.table.categories();
        let chosen = self
            .choose_categories(
                &all_categories,
                seasonal.as_deref(),
                events.as_deref(),
                social.as_deref(),
                self.user_persona(user_id),
            )
            .await;
        let chosen_set: HashSet<&str> = chosen.iter().map(String::as_str).collect();

        // Rank by order count within the city/category filter; ties keep
        // first-occurrence order.
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut first_seen: Vec<&str> = Vec::new();
        for row in self.table.rows() {
            if row.customer_city.as_deref() != Some(location.as_str()) {
                continue;
            }
            let Some(category) = row.product_category_name_english.as_deref() else {
                continue;
            };
            if !chosen_set.contains(category) {
                continue;
            }
            let count = counts.entry(row.product_id.as_str()).or_insert(0);
            if *count == 0 {
                first_seen.push(row.product_id.as_str());
            }
            *count += 1;
        }

        let mut ranked: Vec<(usize, &str)> = first_seen
            .iter()
            .enumerate()
            .map(|(first_idx, &product)| (first_idx, product))
            .collect();
        ranked.sort_by(|a, b| counts[b.1].cmp(&counts[a.1]).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(k);

        let items: Vec<RecommendationItem> = ranked
            .iter()
            .filter_map(|(_, product)| self.table.first_product_row(product))
            .map(RecommendationItem::from_line)
            .collect();

        info!(
            user_id,
            location = %location,
            items = items.len(),
            "Context-aware recommendations ready"
        );
        ContextRecommendation::Found(ContextInsights {
            location,
            seasonal_trends: seasonal,
            local_events: events,
            social_media_trends: social,
            seasonal_category,
            items,
        })
    }

    fn user_location(&self, user_id: &str) -> Option<String> {
        self.table
            .user_rows(user_id)
            .first()
            .and_then(|row| row.customer_city.clone())
    }

    fn user_persona(&self, user_id: &str) -> Option<String> {
        self.table
            .user_rows(user_id)
            .first()
            .map(|row| row.persona_column.clone())
    }

    /// Ask the LLM for the most relevant categories; any failure falls
    /// back to the non-LLM path and never fails the request.
    async fn choose_categories(
        &self,
        all_categories: &[String],
        seasonal: Option<&str>,
        events: Option<&str>,
        social: Option<&str>,
        persona: Option<String>,
    ) -> Vec<String> {
        let generator = match (&self.generator, self.config.llm_category_selection) {
            (Some(generator), true) => generator,
            _ => return all_categories.to_vec(),
        };

        let system_prompt = "You are a retail merchandising assistant. Given local \
             trend signals and a list of product categories, pick the most relevant \
             categories. Respond with JSON of the form {\"categories\": [...]} and \
             nothing else.";
        let mut user_prompt = format!(
            "Seasonal signal: {}\nLocal events: {}\nSocial media: {}\n",
            seasonal.unwrap_or("unavailable"),
            events.unwrap_or("unavailable"),
            social.unwrap_or("unavailable"),
        );
        if let Some(persona) = persona {
            user_prompt.push_str(&format!("Customer persona: {persona}\n"));
        }
        user_prompt.push_str(&format!(
            "Known categories: {}\nSelect up to {MAX_SELECTED_CATEGORIES} categories.",
            all_categories.join(", ")
        ));

        match generator.generate(system_prompt, &user_prompt).await {
            Ok(text) => match serde_json::from_str::<CategorySelection>(&text) {
                Ok(selection) => {
                    let known: Vec<String> = selection
                        .categories
                        .into_iter()
                        .filter(|category| all_categories.contains(category))
                        .take(MAX_SELECTED_CATEGORIES)
                        .collect();
                    if known.is_empty() {
                        warn!("LLM selected no known categories, falling back");
                        self.fallback_categories(all_categories)
                    } else {
                        info!(selected = known.len(), "LLM category selection applied");
                        known
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Malformed LLM category response, falling back");
                    self.fallback_categories(all_categories)
                }
            },
            Err(e) => {
                warn!(error = %e, "LLM category selection failed, falling back");
                self.fallback_categories(all_categories)
            }
        }
    }

    /// Degraded mode: all categories, or a seeded sample of up to five
    /// when a sample seed is configured.
    fn fallback_categories(&self, all_categories: &[String]) -> Vec<String> {
        match self.config.category_sample_seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                let sample: Vec<String> = all_categories
                    .choose_multiple(&mut rng, MAX_SELECTED_CATEGORIES)
                    .cloned()
                    .collect();
                warn!(
                    sample = sample.len(),
                    seed, "Using seeded category sample fallback"
                );
                sample
            }
            None => {
                warn!("Treating all categories as eligible");
                all_categories.to_vec()
            }
        }
    }
}

/// Map the opaque seasonal signal to a coarse category suggestion.
fn seasonal_category_for(seasonal_trends: &str) -> String {
    let lowered = seasonal_trends.to_lowercase();
    if lowered.contains("summer") {
        "Cooling Appliances".to_string()
    } else if lowered.contains("winter") {
        "Warm Clothing".to_string()
    } else {
        "General Essentials".to_string()
    }
}
