use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Score stored for a comment whose sentiment is not one of the known labels.
pub const DEFAULT_SCORE: f64 = 0.5;

/// Sentiment label attached to a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }

    /// Exact match against the canonical lowercase label.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    #[must_use]
    pub const fn score(&self) -> f64 {
        match self {
            Self::Positive => 0.8,
            Self::Negative => 0.2,
            Self::Neutral => 0.5,
        }
    }

    /// Score for a free-form label; unknown labels get [`DEFAULT_SCORE`].
    #[must_use]
    pub fn score_for(label: &str) -> f64 {
        Self::parse(label).map_or(DEFAULT_SCORE, |s| s.score())
    }

    /// Maps an annotation cell to a label using the import vocabulary
    /// (Chinese and English words, abbreviations and numeric codes).
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        let token = raw.trim().to_lowercase();
        match token.as_str() {
            "正向" | "正面" | "positive" | "pos" | "p" | "1" => Some(Self::Positive),
            "负向" | "负面" | "negative" | "neg" | "n" | "-1" => Some(Self::Negative),
            "中立" | "中性" | "neutral" | "neu" | "0" => Some(Self::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Majority vote over annotation labels.
///
/// The label with strictly the most votes wins. No votes, or a tie for the
/// top count, resolves to neutral.
#[must_use]
pub fn majority_vote(votes: &[Sentiment]) -> Sentiment {
    let mut counts: HashMap<Sentiment, usize> = HashMap::new();
    for vote in votes {
        *counts.entry(*vote).or_insert(0) += 1;
    }

    let Some(top) = counts.values().copied().max() else {
        return Sentiment::Neutral;
    };

    let mut leaders = counts.iter().filter(|(_, count)| **count == top);
    match (leaders.next(), leaders.next()) {
        (Some((&winner, _)), None) => winner,
        _ => Sentiment::Neutral,
    }
}
