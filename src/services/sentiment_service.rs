use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

use crate::models::Sentiment;

/// Scores above this are positive, below its negation negative.
pub const POLARITY_THRESHOLD: f64 = 0.1;

/// Factor applied to a word's polarity when a negator precedes it
const NEGATION_FACTOR: f64 = -0.5;

/// How many tokens back a negator still applies
const NEGATION_WINDOW: usize = 3;

static DEFAULT_LEXICON: Lazy<Option<Arc<HashMap<String, f64>>>> = Lazy::new(|| {
    let raw = include_str!("../../sentiment_lexicon.json");
    match serde_json::from_str::<HashMap<String, f64>>(raw) {
        Ok(map) => Some(Arc::new(map)),
        Err(e) => {
            error!("Failed to load sentiment lexicon: {}", e);
            None
        }
    }
});

/// Lexical polarity scorer mapping free text to a 3-way sentiment label
#[derive(Debug, Clone)]
pub struct SentimentClassifier {
    lexicon: Option<Arc<HashMap<String, f64>>>,
}

impl Default for SentimentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentClassifier {
    pub fn new() -> Self {
        Self {
            lexicon: DEFAULT_LEXICON.clone(),
        }
    }

    pub fn from_lexicon(lexicon: HashMap<String, f64>) -> Self {
        Self {
            lexicon: Some(Arc::new(lexicon)),
        }
    }

    /// Polarity in [-1.0, 1.0]: the mean polarity of every lexicon word in the text,
    /// after intensifier and negation adjustments. Text with no known words scores 0.0.
    pub fn polarity(&self, text: &str) -> Result<f64, String> {
        let lexicon = self
            .lexicon
            .as_ref()
            .ok_or_else(|| "sentiment lexicon unavailable".to_string())?;

        let tokens: Vec<String> = tokenize(text).collect();
        let mut sum = 0.0;
        let mut matched = 0usize;

        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = lexicon.get(token.as_str()) else {
                continue;
            };

            let mut value = base;
            if i > 0 {
                if let Some(mult) = intensifier(&tokens[i - 1]) {
                    value *= mult;
                }
            }

            let negated = (1..=NEGATION_WINDOW).any(|k| i >= k && is_negator(&tokens[i - k]));
            if negated {
                value *= NEGATION_FACTOR;
            }

            sum += value.clamp(-1.0, 1.0);
            matched += 1;
        }

        if matched == 0 {
            return Ok(0.0);
        }

        let score = sum / matched as f64;
        if !score.is_finite() {
            return Err(format!("non-finite polarity score: {}", score));
        }
        Ok(score.clamp(-1.0, 1.0))
    }

    /// Classify text; any scoring failure yields `Neutral`.
    pub fn classify(&self, text: &str) -> Sentiment {
        match self.polarity(text) {
            Ok(score) => classify_polarity(score),
            Err(e) => {
                error!("Error in sentiment analysis: {}", e);
                Sentiment::Neutral
            }
        }
    }
}

/// Threshold a polarity score. Both thresholds are exclusive.
pub fn classify_polarity(score: f64) -> Sentiment {
    if score > POLARITY_THRESHOLD {
        Sentiment::Positive
    } else if score < -POLARITY_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Lower-cased word tokens; apostrophes stay inside words ("isn't").
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_negator(token: &str) -> bool {
    matches!(
        token,
        "not"
            | "no"
            | "never"
            | "without"
            | "cannot"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "weren't"
            | "don't"
            | "doesn't"
            | "didn't"
            | "won't"
            | "can't"
    )
}

fn intensifier(token: &str) -> Option<f64> {
    match token {
        "very" | "highly" => Some(1.3),
        "extremely" | "exceptionally" => Some(1.5),
        "really" | "particularly" => Some(1.2),
        "slightly" | "somewhat" => Some(0.6),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_threshold_boundaries_are_exclusive() {
        assert_eq!(classify_polarity(0.1), Sentiment::Neutral);
        assert_eq!(classify_polarity(-0.1), Sentiment::Neutral);
        assert_eq!(classify_polarity(0.1000001), Sentiment::Positive);
        assert_eq!(classify_polarity(-0.1000001), Sentiment::Negative);
        assert_eq!(classify_polarity(0.0), Sentiment::Neutral);
        assert_eq!(classify_polarity(1.0), Sentiment::Positive);
        assert_eq!(classify_polarity(-1.0), Sentiment::Negative);
    }

    #[test]
    fn test_polarity_is_mean_of_matched_words() {
        let classifier = SentimentClassifier::new();
        let score = classifier.polarity("Shares surged after profits").unwrap();
        assert!(approx(score, 0.5), "got {}", score);

        let score = classifier.polarity("Company faces lawsuit and losses").unwrap();
        assert!(approx(score, -0.55), "got {}", score);
    }

    #[test]
    fn test_text_without_known_words_is_neutral() {
        let classifier = SentimentClassifier::new();
        assert_eq!(classifier.polarity("The board met on Tuesday.").unwrap(), 0.0);
        assert_eq!(classifier.classify(""), Sentiment::Neutral);
    }

    #[test]
    fn test_negation_flips_and_dampens() {
        let classifier = SentimentClassifier::new();
        assert!(approx(classifier.polarity("not profitable").unwrap(), -0.25));
        assert!(approx(classifier.polarity("The unit isn't profitable").unwrap(), -0.25));
        assert_eq!(classifier.classify("We did not really see growth"), Sentiment::Negative);
        // Negator outside the three-token window has no effect
        assert_eq!(classifier.classify("not that we really see growth"), Sentiment::Positive);
    }

    #[test]
    fn test_intensifiers_scale_and_clamp() {
        let classifier = SentimentClassifier::new();
        assert!(approx(classifier.polarity("very good").unwrap(), 0.91));
        assert!(approx(classifier.polarity("extremely excellent").unwrap(), 1.0));
        assert!(approx(classifier.polarity("slightly weak").unwrap(), -0.24));
    }

    #[test]
    fn test_classify_business_summaries() {
        let classifier = SentimentClassifier::new();
        assert_eq!(
            classifier.classify("Acme posted strong growth and beat estimates."),
            Sentiment::Positive
        );
        assert_eq!(
            classifier.classify("Acme shares plunged amid a fraud investigation."),
            Sentiment::Negative
        );
    }

    #[test]
    fn test_missing_lexicon_defaults_to_neutral() {
        let classifier = SentimentClassifier { lexicon: None };
        assert!(classifier.polarity("great").is_err());
        assert_eq!(classifier.classify("great excellent best"), Sentiment::Neutral);
    }

    #[test]
    fn test_non_finite_score_defaults_to_neutral() {
        let mut lexicon = HashMap::new();
        lexicon.insert("odd".to_string(), f64::NAN);
        let classifier = SentimentClassifier::from_lexicon(lexicon);
        assert!(classifier.polarity("odd").is_err());
        assert_eq!(classifier.classify("odd"), Sentiment::Neutral);
    }
}
