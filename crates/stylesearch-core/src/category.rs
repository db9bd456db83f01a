//! Canonical category set and catalog-vs-detection reconciliation.

use serde::{Deserialize, Serialize};

/// The closed set every stored product is normalized into.
///
/// `Unknown` is an in-flight sentinel only: it gives detection-based
/// correction a chance to supply a real category, and a product that is
/// still `Unknown` at the end of ingestion is rejected, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Clothing,
    Shoes,
    Bags,
    Accessories,
    Unknown,
}

/// Alias table mapping common catalog spellings to canonical categories.
const ALIASES: &[(&str, Category)] = &[
    ("clothing", Category::Clothing),
    ("apparel", Category::Clothing),
    ("tops", Category::Clothing),
    ("bottoms", Category::Clothing),
    ("outerwear", Category::Clothing),
    ("shoes", Category::Shoes),
    ("footwear", Category::Shoes),
    ("sneakers", Category::Shoes),
    ("sandals", Category::Shoes),
    ("boots", Category::Shoes),
    ("bags", Category::Bags),
    ("handbags", Category::Bags),
    ("luggage", Category::Bags),
    ("accessories", Category::Accessories),
    ("accessory", Category::Accessories),
    ("watches", Category::Accessories),
    ("watch", Category::Accessories),
];

impl Category {
    pub const CANONICAL: [Category; 4] = [
        Category::Clothing,
        Category::Shoes,
        Category::Bags,
        Category::Accessories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Clothing => "clothing",
            Category::Shoes => "shoes",
            Category::Bags => "bags",
            Category::Accessories => "accessories",
            Category::Unknown => "unknown",
        }
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, Category::Unknown)
    }

    /// Map an arbitrary catalog or detector label to the canonical set.
    ///
    /// Folds case and whitespace, then tries the alias table exactly, then
    /// by substring in either direction, then a handful of keyword
    /// fallbacks ("footwear", "watch", "bag"). Unmappable input yields
    /// `Unknown` rather than an error so correction can still run.
    pub fn normalize(raw: &str) -> Category {
        let folded = raw.trim().to_lowercase();
        if folded.is_empty() {
            return Category::Unknown;
        }
        for (alias, category) in ALIASES {
            if folded == *alias {
                return *category;
            }
        }
        // The reverse-substring pass needs a minimum length, otherwise
        // one- and two-letter fragments match inside almost any alias.
        for (alias, category) in ALIASES {
            if folded.contains(alias) || (folded.len() >= 3 && alias.contains(folded.as_str())) {
                return *category;
            }
        }
        if folded.contains("footwear") || folded.contains("shoe") || folded.contains("sneaker") {
            return Category::Shoes;
        }
        if folded.contains("watch") {
            return Category::Accessories;
        }
        if folded.contains("bag") || folded.contains("luggage") {
            return Category::Bags;
        }
        if folded.contains("shirt") || folded.contains("dress") || folded.contains("pant") {
            return Category::Clothing;
        }
        Category::Unknown
    }

    /// Reconcile the catalog-declared category against the visually
    /// detected one.
    ///
    /// The catalog value wins unless it is missing or contradicted by a
    /// detection whose confidence strictly exceeds `threshold`; exactly at
    /// the threshold the catalog value is kept. Returns the final category
    /// and whether a correction was applied.
    pub fn reconcile(
        source: Category,
        detected: Category,
        detected_confidence: f32,
        threshold: f32,
    ) -> (Category, bool) {
        let disagrees = source == Category::Unknown || source != detected;
        if disagrees && detected.is_canonical() && detected_confidence > threshold {
            let corrected = source != detected;
            return (detected, corrected);
        }
        (source, false)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
