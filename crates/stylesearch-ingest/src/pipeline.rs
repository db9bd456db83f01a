//! Catalog ingestion: rows flow through parse → duplicate check → image
//! fetch → category reconcile → embed → upsert, with bounded concurrency
//! and per-row failure isolation. One bad row never aborts the run.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use uuid::Uuid;

use stylesearch_core::traits::{Detector, ImageEmbedder, VectorStore};
use stylesearch_core::types::{CategoryCorrectionEvent, IngestionStats, Product};
use stylesearch_core::{AppConfig, Category};

use crate::fetch::ImageFetcher;
use crate::metadata::collect_metadata;
use crate::price::resolve_price;
use crate::source::{read_csv, RawRecord};

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub image_column: String,
    pub name_column: String,
    pub category_column: String,
    pub batch_size: usize,
    pub validate_categories: bool,
    pub skip_existing: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            image_column: "image_url".to_string(),
            name_column: "product_name".to_string(),
            category_column: "category".to_string(),
            batch_size: 10,
            validate_categories: true,
            skip_existing: true,
        }
    }
}

enum RowOutcome {
    Successful { correction: Option<CategoryCorrectionEvent> },
    Skipped,
    Failed(String),
}

pub struct IngestionPipeline {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn ImageEmbedder>,
    detector: Arc<dyn Detector>,
    fetcher: ImageFetcher,
    correction_threshold: f32,
    default_currency: String,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn ImageEmbedder>,
        detector: Arc<dyn Detector>,
        config: &AppConfig,
    ) -> Result<Self> {
        if embedder.dim() != store.dim() {
            anyhow::bail!(
                "embedder width {} does not match vector store width {}",
                embedder.dim(),
                store.dim()
            );
        }
        Ok(Self {
            store,
            embedder,
            detector,
            fetcher: ImageFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?,
            correction_threshold: config.correction_threshold,
            default_currency: config.default_currency.clone(),
        })
    }

    pub async fn ingest_csv(&self, path: &Path, options: &IngestOptions) -> Result<IngestionStats> {
        let records = read_csv(path)?;
        info!(rows = records.len(), file = %path.display(), "starting CSV ingestion");
        self.ingest(records, options).await
    }

    /// Rows within a batch run concurrently; statistics are folded in on
    /// the single consumer side so batch size never changes the totals.
    pub async fn ingest(
        &self,
        records: Vec<RawRecord>,
        options: &IngestOptions,
    ) -> Result<IngestionStats> {
        let mut stats = IngestionStats { total: records.len() as u64, ..Default::default() };
        let bar = ProgressBar::new(records.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} rows {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let concurrency = options.batch_size.max(1);
        let mut outcomes = futures::stream::iter(
            records.into_iter().map(|record| self.process_row(record, options)),
        )
        .buffer_unordered(concurrency);

        while let Some(outcome) = outcomes.next().await {
            stats.processed += 1;
            bar.inc(1);
            match outcome {
                RowOutcome::Successful { correction } => {
                    stats.successful += 1;
                    if let Some(event) = correction {
                        stats.category_corrected += 1;
                        stats.corrections.push(event);
                    }
                }
                RowOutcome::Skipped => stats.skipped += 1,
                RowOutcome::Failed(error) => {
                    stats.failed += 1;
                    stats.errors.push(error);
                }
            }
        }
        bar.finish_and_clear();
        info!(
            successful = stats.successful,
            failed = stats.failed,
            skipped = stats.skipped,
            corrected = stats.category_corrected,
            "ingestion run complete"
        );
        Ok(stats)
    }

    async fn process_row(&self, record: RawRecord, options: &IngestOptions) -> RowOutcome {
        let Some(name) = record.get(&options.name_column) else {
            return RowOutcome::Failed(format!("Missing column '{}'", options.name_column));
        };
        let Some(image_ref) = record.get(&options.image_column) else {
            return RowOutcome::Failed(format!("Missing image reference for: {name}"));
        };
        let product_id = derive_product_id(name, image_ref);

        if options.skip_existing {
            match self.store.exists(&product_id).await {
                Ok(true) => return RowOutcome::Skipped,
                Ok(false) => {}
                Err(e) => return RowOutcome::Failed(format!("Lookup failed for {name}: {e}")),
            }
        }

        let image = match self.fetcher.fetch(image_ref).await {
            Ok(image) => image,
            Err(e) => return RowOutcome::Failed(format!("Failed to fetch image {image_ref}: {e}")),
        };

        let raw_category = record.get(&options.category_column).unwrap_or("unknown");
        let source_category = Category::normalize(raw_category);

        let mut category = source_category;
        let mut corrected = false;
        let mut detected_confidence = 0.0f32;
        let mut colors = Vec::new();
        let mut style_tags = Vec::new();
        if options.validate_categories {
            let regions = match self.detector.detect(&image) {
                Ok(regions) => regions,
                Err(e) => {
                    warn!(product = name, error = %e, "detection failed, keeping source category");
                    Vec::new()
                }
            };
            if let Some(best) = regions
                .iter()
                .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            {
                let detected = Category::normalize(&best.label);
                (category, corrected) = Category::reconcile(
                    source_category,
                    detected,
                    best.confidence,
                    self.correction_threshold,
                );
                detected_confidence = best.confidence;
                colors = best.colors.clone();
                style_tags = best.style_tags.clone();
            }
        }
        if category == Category::Unknown {
            return RowOutcome::Failed(format!("Could not determine category for: {name}"));
        }
        let correction = corrected.then(|| {
            info!(
                product = name,
                from = raw_category,
                to = category.as_str(),
                "category corrected"
            );
            CategoryCorrectionEvent {
                product_ref: name.to_string(),
                source_category: raw_category.to_string(),
                detected_category: category,
                confidence: detected_confidence,
            }
        });

        let vector = match self.embedder.embed_image(&image) {
            Ok(vector) => vector,
            Err(e) => return RowOutcome::Failed(format!("Embedding failed for {name}: {e}")),
        };

        let product = self.assemble_product(
            &record,
            options,
            product_id.clone(),
            name,
            image_ref,
            raw_category,
            category,
            corrected,
            colors,
            style_tags,
        );
        match self.store.upsert(&product_id, &vector, &product).await {
            Ok(()) => RowOutcome::Successful { correction },
            Err(e) => RowOutcome::Failed(format!("Failed to index {name}: {e}")),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble_product(
        &self,
        record: &RawRecord,
        options: &IngestOptions,
        product_id: String,
        name: &str,
        image_ref: &str,
        raw_category: &str,
        category: Category,
        corrected: bool,
        colors: Vec<String>,
        style_tags: Vec<String>,
    ) -> Product {
        let brand = record
            .first_of(&["brand", "brand_name", "manufacturer"])
            .map(str::to_string);
        let subcategory = record
            .first_of(&["sub_category", "subcategory", "model", "product_type"])
            .unwrap_or("unknown")
            .to_string();
        let description = assemble_description(record, name, brand.as_deref());
        let price = resolve_price(record, Some(&description), brand.as_deref(), raw_category);
        let currency = record
            .get("currency")
            .unwrap_or(self.default_currency.as_str())
            .to_string();
        let mapped = [
            options.image_column.as_str(),
            options.name_column.as_str(),
            options.category_column.as_str(),
        ];
        Product {
            product_id,
            name: name.to_string(),
            brand,
            description: Some(description),
            category,
            subcategory,
            price,
            currency,
            colors,
            style_tags,
            image_url: Some(image_ref.to_string()),
            in_stock: true,
            source_category: Some(raw_category.to_string()),
            category_corrected: corrected,
            metadata: collect_metadata(record, &mapped),
        }
    }
}

/// Deterministic id: the same name + image reference always maps to the
/// same product, which is what makes re-ingestion idempotent.
pub fn derive_product_id(name: &str, image_ref: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{name}_{image_ref}").as_bytes()).to_string()
}

/// Searchable description assembled from whatever the row offers:
/// source description, name, brand, model, colorways.
fn assemble_description(record: &RawRecord, name: &str, brand: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(description) = record.get("description") {
        parts.push(description.to_string());
    }
    parts.push(name.to_string());
    if let Some(brand) = brand {
        parts.push(format!("by {brand}"));
    }
    if let Some(model) = record.first_of(&["sub_category", "model", "product_type"]) {
        parts.push(model.to_string());
    }
    if let Some(colorways) = record.get("colorways") {
        parts.push(format!("in {colorways}"));
    }
    parts.join(". ")
}

/// Persist a run report for operator review.
pub fn write_report(stats: &IngestionStats, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(stats)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
