//! Category-to-persona mapping. The table is injectable configuration;
//! the default reproduces the curated mapping shipped with the source
//! dataset.

use std::collections::HashMap;

pub const GENERAL_CONSUMER: &str = "General Consumer";

/// Static many-to-many mapping from product category to persona labels.
#[derive(Debug, Clone)]
pub struct PersonaRules {
    rules: HashMap<String, Vec<String>>,
}

impl PersonaRules {
    pub fn new(rules: HashMap<String, Vec<String>>) -> Self {
        Self { rules }
    }

    pub fn labels_for(&self, category: &str) -> Option<&[String]> {
        self.rules.get(category).map(|labels| labels.as_slice())
    }

    /// Union of persona labels over the given categories, sorted for
    /// deterministic output. Falls back to "General Consumer" when no
    /// category matches the table.
    pub fn assign(&self, categories: &[String]) -> Vec<String> {
        let mut personas: Vec<String> = Vec::new();
        for category in categories {
            if let Some(labels) = self.rules.get(category) {
                for label in labels {
                    if !personas.contains(label) {
                        personas.push(label.clone());
                    }
                }
            }
        }
        if personas.is_empty() {
            return vec![GENERAL_CONSUMER.to_string()];
        }
        personas.sort();
        personas
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for PersonaRules {
    fn default() -> Self {
        let entries: [(&str, &[&str]); 23] = [
            ("sports_leisure", &["Athlete", "Fitness Enthusiast"]),
            ("baby", &["Parent", "Caregiver"]),
            ("toys", &["Parent", "Child-oriented"]),
            ("books_general_interest", &["Bookworm", "Intellectual"]),
            ("electronics", &["Tech Enthusiast", "Gadget Lover"]),
            ("computers_accessories", &["Tech Professional", "Gadget Lover"]),
            ("health_beauty", &["Beauty Enthusiast", "Health-conscious"]),
            ("furniture_decor", &["Home Decorator", "Interior Design Enthusiast"]),
            ("garden_tools", &["Gardener", "Outdoor Enthusiast"]),
            ("pet_shop", &["Pet Owner", "Animal Lover"]),
            ("fashion_bags_accessories", &["Fashion Enthusiast", "Trendsetter"]),
            ("musical_instruments", &["Musician", "Music Lover"]),
            ("food_drink", &["Foodie", "Culinary Enthusiast"]),
            ("art", &["Artist", "Art Collector"]),
            ("cine_photo", &["Photographer", "Film Buff"]),
            ("watches_gifts", &["Gift Giver", "Luxury Enthusiast"]),
            ("home_appliances", &["Home Chef", "Domestic Enthusiast"]),
            ("auto", &["Car Enthusiast", "DIY Mechanic"]),
            ("books_technical", &["Professional", "Lifelong Learner"]),
            (
                "construction_tools_construction",
                &["DIY Enthusiast", "Home Improver"],
            ),
            ("stationery", &["Office Professional", "Stationery Lover"]),
            ("cool_stuff", &["Trendsetter", "Early Adopter"]),
            ("consoles_games", &["Gamer", "Tech Enthusiast"]),
        ];
        let rules = entries
            .iter()
            .map(|(category, labels)| {
                (
                    category.to_string(),
                    labels.iter().map(|label| label.to_string()).collect(),
                )
            })
            .collect();
        Self { rules }
    }
}
