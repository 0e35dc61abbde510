//! Static recommendation catalog shown on a fresh conversation.

#[cfg(test)]
#[path = "catalog_test.rs"]
mod catalog_test;

/// One pressable suggestion: a glyph and the literal prompt it sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationItem {
    pub icon: &'static str,
    pub text: &'static str,
}

/// The catalog, in display order.
pub const RECOMMENDATIONS: &[RecommendationItem] = &[
    RecommendationItem {
        icon: "📊",
        text: "Analyze the Indian stock market with today's key signals",
    },
    RecommendationItem {
        icon: "🧭",
        text: "Analyse Conditions of Large, Mid and Small Cap in Indian Market",
    },
    RecommendationItem {
        icon: "📰",
        text: "Track major stock market events shaping investor sentiment",
    },
    RecommendationItem {
        icon: "🌍",
        text: "How global news connects with Indian market movements",
    },
];

/// Look up the prompt text for a box index.
#[must_use]
pub fn text_at(catalog: &[RecommendationItem], index: usize) -> Option<&'static str> {
    catalog.get(index).map(|item| item.text)
}
