//! Domain types shared by the ingestion, text-search and visual-search
//! engines.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::category::Category;

pub type ProductId = String;

/// Open metadata bag preserved verbatim from the catalog source.
/// Unknown keys are opaque pass-through for downstream consumers.
pub type Metadata = Map<String, Value>;

/// Canonical catalog entry.
///
/// The embedding vector is deliberately absent: the vector store owns it
/// exclusively once written, and every other field is owned by the
/// catalog source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub category: Category,
    #[serde(default = "default_subcategory")]
    pub subcategory: String,
    pub price: f64,
    pub currency: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub style_tags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    /// Raw category string as declared by the source, kept for review.
    #[serde(default)]
    pub source_category: Option<String>,
    #[serde(default)]
    pub category_corrected: bool,
    #[serde(default)]
    pub metadata: Metadata,
}

fn default_subcategory() -> String {
    "unknown".to_string()
}

fn default_in_stock() -> bool {
    true
}

/// Bounding box in source-image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0.0, y: 0.0, w: width as f32, h: height as f32 }
    }
}

/// One detected fashion item within an image. Transient: produced per
/// detection call and discarded once the caller has consumed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedRegion {
    /// Raw detector label; mapped to the canonical set by the caller.
    pub label: String,
    /// Detector confidence in [0, 1].
    pub confidence: f32,
    pub bbox: BoundingBox,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub style_tags: Vec<String>,
}

/// A product returned from a nearest-neighbor query, with its cosine
/// similarity against the query vector.
#[derive(Debug, Clone)]
pub struct ScoredProduct {
    pub product: Product,
    pub score: f32,
}

/// One ranked match, produced fresh per query and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub product_id: ProductId,
    pub similarity_score: f32,
    pub product: Product,
    pub match_reasoning: String,
    pub key_similarities: Vec<String>,
}

/// Emitted when ingestion overrides a catalog-declared category with the
/// visually detected one. Appended to the run report, not a long-lived
/// entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCorrectionEvent {
    pub product_ref: String,
    pub source_category: String,
    pub detected_category: Category,
    pub confidence: f32,
}

/// Aggregate outcome of one ingestion run. Counters are monotonically
/// accumulated by row workers while the run executes and the struct is
/// immutable once returned; it serializes to a flat record for operator
/// review.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestionStats {
    pub total: u64,
    pub processed: u64,
    pub successful: u64,
    pub failed: u64,
    pub category_corrected: u64,
    pub skipped: u64,
    #[serde(default)]
    pub corrections: Vec<CategoryCorrectionEvent>,
    #[serde(default)]
    pub errors: Vec<String>,
}
