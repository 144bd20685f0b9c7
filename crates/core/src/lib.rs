pub mod config;
pub mod error;
pub mod personas;
pub mod types;

pub use config::AppConfig;
pub use error::{CommerceError, CommerceResult};
pub use personas::{PersonaRules, GENERAL_CONSUMER};
pub use types::{FeatureTable, OrderLine, RecommendationItem};
