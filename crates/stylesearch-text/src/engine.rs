//! Hybrid keyword + semantic search over an atomically swapped snapshot.
//!
//! Queries read an immutable `Arc<Snapshot>`; `refresh_indices` builds a
//! replacement from the vector store's payloads and swaps the reference,
//! so readers never observe a half-built index. Products added after the
//! last refresh stay invisible until the next one; that staleness window
//! is the documented contract, rebuilds are full recomputes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use tracing::{debug, info};

use stylesearch_core::traits::{TextEmbedder, VectorStore};
use stylesearch_core::types::{Product, SearchResult};
use stylesearch_core::Category;
use stylesearch_vector::cosine_similarity;

use crate::bm25::{tokenize, Bm25Index};

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    pub category: Option<Category>,
    pub bm25_weight: f32,
    pub semantic_weight: f32,
    pub min_score: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            category: None,
            bm25_weight: 0.4,
            semantic_weight: 0.6,
            min_score: 0.3,
        }
    }
}

struct Snapshot {
    products: Vec<Product>,
    bm25: Bm25Index,
    doc_vectors: Vec<Vec<f32>>,
}

impl Snapshot {
    fn empty() -> Self {
        Self { products: Vec::new(), bm25: Bm25Index::build(&[]), doc_vectors: Vec::new() }
    }
}

pub struct HybridTextEngine {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn TextEmbedder>,
    snapshot: RwLock<Arc<Snapshot>>,
    rebuilding: AtomicBool,
}

impl HybridTextEngine {
    /// Starts with an empty snapshot; call `refresh_indices` to load the
    /// current catalog.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn TextEmbedder>) -> Self {
        Self {
            store,
            embedder,
            snapshot: RwLock::new(Arc::new(Snapshot::empty())),
            rebuilding: AtomicBool::new(false),
        }
    }

    /// Full rebuild from the vector store's payloads. Single-writer:
    /// a rebuild already in progress makes this call fail fast while
    /// queries keep serving the previous snapshot.
    pub async fn refresh_indices(&self) -> Result<usize> {
        if self
            .rebuilding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            anyhow::bail!("index rebuild already in progress");
        }
        let result = self.rebuild().await;
        self.rebuilding.store(false, Ordering::Release);
        result
    }

    async fn rebuild(&self) -> Result<usize> {
        let products = self.store.scan_payloads().await?;
        let documents: Vec<String> = products.iter().map(document_text).collect();
        let mut doc_vectors = Vec::with_capacity(documents.len());
        for doc in &documents {
            doc_vectors.push(self.embedder.embed_text(doc)?);
        }
        let bm25 = Bm25Index::build(&documents);
        let count = products.len();
        let next = Arc::new(Snapshot { products, bm25, doc_vectors });
        let mut guard = self.snapshot.write().map_err(|_| anyhow!("snapshot lock poisoned"))?;
        *guard = next;
        info!(products = count, "text indices rebuilt");
        Ok(count)
    }

    fn current(&self) -> Result<Arc<Snapshot>> {
        Ok(self
            .snapshot
            .read()
            .map_err(|_| anyhow!("snapshot lock poisoned"))?
            .clone())
    }

    pub fn indexed_count(&self) -> Result<usize> {
        Ok(self.current()?.products.len())
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let snapshot = self.current()?;
        if snapshot.products.is_empty() {
            return Ok(Vec::new());
        }
        let query_tokens = tokenize(query);

        let bm25_norm = min_max_normalize(&snapshot.bm25.scores(&query_tokens));

        let query_vec = self.embedder.embed_text(query)?;
        let semantic_raw: Vec<f32> = snapshot
            .doc_vectors
            .iter()
            .map(|dv| cosine_similarity(&query_vec, dv))
            .collect();
        let semantic_norm = min_max_normalize(&semantic_raw);

        let mut results = Vec::new();
        for (i, product) in snapshot.products.iter().enumerate() {
            let score =
                options.bm25_weight * bm25_norm[i] + options.semantic_weight * semantic_norm[i];
            if score < options.min_score {
                continue;
            }
            if let Some(filter) = options.category {
                if product.category != filter {
                    continue;
                }
            }
            let (reasoning, similarities) =
                explain_match(product, &query_tokens, score, bm25_norm[i], semantic_norm[i]);
            results.push(SearchResult {
                product_id: product.product_id.clone(),
                similarity_score: score,
                product: product.clone(),
                match_reasoning: reasoning,
                key_similarities: similarities,
            });
        }
        // Stable sort keeps snapshot order for ties
        results.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        results.truncate(options.limit);
        debug!(query, results = results.len(), "text search");
        Ok(results)
    }
}

/// One searchable string per product: the fixed field set plus a few
/// well-known metadata keys when present.
fn document_text(product: &Product) -> String {
    let mut parts: Vec<String> = vec![product.name.clone()];
    if let Some(brand) = &product.brand {
        parts.push(brand.clone());
    }
    parts.push(product.category.as_str().to_string());
    parts.push(product.subcategory.clone());
    parts.extend(product.colors.iter().cloned());
    parts.extend(product.style_tags.iter().cloned());
    if let Some(description) = &product.description {
        parts.push(description.clone());
    }
    for key in ["model", "product_type", "gender"] {
        if let Some(value) = product.metadata.get(key).and_then(|v| v.as_str()) {
            parts.push(value.to_string());
        }
    }
    parts.join(" ").to_lowercase()
}

/// Min-max scale to [0,1]. A flat corpus of non-zero scores maps to all
/// 1.0 (a single candidate scales to 1.0); an all-zero corpus stays 0.
fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    let Some(max) = scores.iter().copied().reduce(f32::max) else {
        return Vec::new();
    };
    let min = scores.iter().copied().fold(max, f32::min);
    if (max - min).abs() < f32::EPSILON {
        let fill = if max > 0.0 { 1.0 } else { 0.0 };
        return vec![fill; scores.len()];
    }
    scores.iter().map(|s| (s - min) / (max - min)).collect()
}

fn explain_match(
    product: &Product,
    query_tokens: &[String],
    score: f32,
    bm25_norm: f32,
    semantic_norm: f32,
) -> (String, Vec<String>) {
    let mut matched_fields = Vec::new();
    let mut similarities = Vec::new();

    let name = product.name.to_lowercase();
    if query_tokens.iter().any(|t| name.contains(t)) {
        matched_fields.push("name");
        similarities.push(format!("Name: {}", product.name));
    }
    if let Some(brand) = &product.brand {
        let brand_lower = brand.to_lowercase();
        if query_tokens.iter().any(|t| brand_lower.contains(t)) {
            matched_fields.push("brand");
            similarities.push(format!("Brand: {brand}"));
        }
    }
    if query_tokens.iter().any(|t| product.category.as_str().contains(t.as_str())) {
        matched_fields.push("category");
        similarities.push(format!("Category: {}", product.category));
    }
    if semantic_norm > bm25_norm + 0.2 {
        matched_fields.push("semantic");
        similarities.push("Semantic similarity".to_string());
    }

    let reasoning = if matched_fields.is_empty() {
        format!("Matched by: relevance (score: {:.2}%)", score * 100.0)
    } else {
        format!("Matched by: {} (score: {:.2}%)", matched_fields.join(", "), score * 100.0)
    };
    (reasoning, similarities)
}
