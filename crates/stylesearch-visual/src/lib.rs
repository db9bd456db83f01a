#![deny(warnings)]
#![deny(unused_imports)]

//! Visual similarity search: decode → detect → per-region crop, embed
//! and query → one ranked, explained match list per detected item.
//!
//! Only a corrupt upload fails the whole request. Detection is advisory
//! (no regions means the whole image becomes one implicit region) and a
//! failing region degrades to an empty match list, never an error.

use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, warn};

use stylesearch_core::traits::{Detector, ImageEmbedder, VectorStore};
use stylesearch_core::types::{BoundingBox, DetectedRegion, ScoredProduct, SearchResult};
use stylesearch_core::{Category, Error, Result};

#[derive(Debug)]
pub struct RegionMatches {
    pub region: DetectedRegion,
    pub category: Category,
    pub matches: Vec<SearchResult>,
}

#[derive(Debug)]
pub struct VisualSearchResponse {
    pub detected_items: usize,
    pub regions: Vec<RegionMatches>,
}

pub struct VisualSearchEngine {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn ImageEmbedder>,
    detector: Arc<dyn Detector>,
    /// Region confidence a detected category must strictly exceed before
    /// it restricts that region's query.
    filter_threshold: f32,
}

impl VisualSearchEngine {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn ImageEmbedder>,
        detector: Arc<dyn Detector>,
        filter_threshold: f32,
    ) -> Self {
        Self { store, embedder, detector, filter_threshold }
    }

    pub async fn search_by_image(
        &self,
        image_bytes: &[u8],
        limit: usize,
        category_filter: Option<Category>,
    ) -> Result<VisualSearchResponse> {
        let image = image::load_from_memory(image_bytes)
            .map_err(|e| Error::InvalidInput(format!("Could not decode image: {e}")))?;

        let regions = match self.detector.detect(&image) {
            Ok(regions) => regions,
            Err(e) => {
                warn!(error = %e, "detection failed, treating image as a single region");
                Vec::new()
            }
        };
        let regions = if regions.is_empty() {
            vec![implicit_whole_image_region(&image)]
        } else {
            regions
        };
        let detected_items = regions.len();
        debug!(detected_items, "visual search regions");

        // Regions are independent; run them jointly and keep their order
        let lookups = regions
            .into_iter()
            .map(|region| self.search_region(&image, region, limit, category_filter));
        let regions = futures::future::join_all(lookups).await;

        Ok(VisualSearchResponse { detected_items, regions })
    }

    async fn search_region(
        &self,
        image: &DynamicImage,
        region: DetectedRegion,
        limit: usize,
        category_filter: Option<Category>,
    ) -> RegionMatches {
        let region_category = Category::normalize(&region.label);
        let filter = category_filter.or_else(|| {
            (region_category.is_canonical() && region.confidence > self.filter_threshold)
                .then_some(region_category)
        });

        let crop = crop_region(image, &region.bbox);
        let matches = match self.query_crop(&crop, limit, filter).await {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| explain_hit(hit, &region))
                .collect(),
            Err(e) => {
                warn!(label = %region.label, error = %e, "region lookup failed");
                Vec::new()
            }
        };
        RegionMatches { region, category: region_category, matches }
    }

    async fn query_crop(
        &self,
        crop: &DynamicImage,
        limit: usize,
        filter: Option<Category>,
    ) -> anyhow::Result<Vec<ScoredProduct>> {
        let vector = self.embedder.embed_image(crop)?;
        self.store.query(&vector, limit, filter).await
    }
}

fn implicit_whole_image_region(image: &DynamicImage) -> DetectedRegion {
    DetectedRegion {
        label: Category::Unknown.as_str().to_string(),
        confidence: 0.0,
        bbox: BoundingBox::full(image.width(), image.height()),
        colors: Vec::new(),
        style_tags: Vec::new(),
    }
}

fn crop_region(image: &DynamicImage, bbox: &BoundingBox) -> DynamicImage {
    let x = bbox.x.max(0.0) as u32;
    let y = bbox.y.max(0.0) as u32;
    let w = (bbox.w.max(1.0) as u32).min(image.width().saturating_sub(x).max(1));
    let h = (bbox.h.max(1.0) as u32).min(image.height().saturating_sub(y).max(1));
    image.crop_imm(x, y, w, h)
}

/// Reasoning assembled from the stored payload: shared colors with the
/// detected region and the product's subcategory.
fn explain_hit(hit: ScoredProduct, region: &DetectedRegion) -> SearchResult {
    let product = hit.product;
    let shared_colors: Vec<&str> = product
        .colors
        .iter()
        .filter(|c| region.colors.iter().any(|rc| rc.eq_ignore_ascii_case(c)))
        .map(String::as_str)
        .collect();

    let mut reasoning = format!("High visual similarity ({:.2}%)", hit.score * 100.0);
    let mut similarities = vec!["Visual match".to_string()];
    if !shared_colors.is_empty() {
        reasoning.push_str(&format!(" with matching colors: {}", shared_colors.join(", ")));
        for color in &shared_colors {
            similarities.push(format!("Color: {color}"));
        }
    }
    reasoning.push('.');
    if product.subcategory != "unknown" {
        reasoning.push_str(&format!(" Same {} type.", product.subcategory));
        similarities.push(format!("Type: {}", product.subcategory));
    }
    similarities.push(format!("Category: {}", product.category));

    SearchResult {
        product_id: product.product_id.clone(),
        similarity_score: hit.score,
        product,
        match_reasoning: reasoning,
        key_similarities: similarities,
    }
}
