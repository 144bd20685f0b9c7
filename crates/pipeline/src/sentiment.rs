//! Review sentiment scoring seam. The pipeline treats the scorer as an
//! opaque pure function from text to polarity in [-1, 1].

use std::collections::HashMap;

/// Scores review text. Implementations must be pure: the same text always
/// yields the same polarity, and empty text scores neutral.
pub trait SentimentScorer: Send + Sync {
    /// Polarity in [-1, 1]; 0.0 is neutral.
    fn score(&self, text: &str) -> f64;
}

/// Always-neutral scorer, the degraded-mode fallback and test stub.
pub struct NeutralScorer;

impl SentimentScorer for NeutralScorer {
    fn score(&self, _text: &str) -> f64 {
        0.0
    }
}

/// Word-polarity lexicon scorer: mean polarity of matched words,
/// clamped to [-1, 1]. Unmatched or empty text scores 0.0.
pub struct LexiconScorer {
    lexicon: HashMap<&'static str, f64>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        let entries: [(&str, f64); 40] = [
            ("excellent", 1.0),
            ("perfect", 0.9),
            ("amazing", 0.9),
            ("wonderful", 0.9),
            ("love", 0.8),
            ("loved", 0.8),
            ("great", 0.8),
            ("best", 0.8),
            ("beautiful", 0.7),
            ("good", 0.7),
            ("happy", 0.7),
            ("recommend", 0.6),
            ("recommended", 0.6),
            ("satisfied", 0.6),
            ("nice", 0.6),
            ("sturdy", 0.4),
            ("fast", 0.4),
            ("works", 0.3),
            ("quality", 0.3),
            ("ok", 0.2),
            ("okay", 0.2),
            ("slow", -0.3),
            ("cheap", -0.3),
            ("late", -0.4),
            ("refund", -0.4),
            ("wrong", -0.5),
            ("missing", -0.5),
            ("poor", -0.6),
            ("disappointed", -0.6),
            ("disappointing", -0.6),
            ("bad", -0.7),
            ("damaged", -0.7),
            ("useless", -0.7),
            ("broken", -0.8),
            ("defective", -0.8),
            ("waste", -0.8),
            ("terrible", -0.9),
            ("awful", -0.9),
            ("worst", -1.0),
            ("horrible", -1.0),
        ];
        Self {
            lexicon: entries.into_iter().collect(),
        }
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> f64 {
        let mut sum = 0.0;
        let mut matched = 0usize;
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            if let Some(polarity) = self.lexicon.get(word.to_lowercase().as_str()) {
                sum += polarity;
                matched += 1;
            }
        }
        if matched == 0 {
            return 0.0;
        }
        (sum / matched as f64).clamp(-1.0, 1.0)
    }
}
